use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by a single connection attempt
pub type ConnectFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

type ConnectFn = dyn Fn() -> ConnectFuture + Send + Sync;

/// A named external dependency that must be reachable before the service runs.
///
/// The operation is invoked once per attempt until it succeeds; it is never inspected,
/// only retried. Clones share the same operation.
#[derive(Clone)]
pub struct Connection {
    name: Arc<str>,
    operation: Arc<ConnectFn>,
}

impl Connection {
    pub fn new<F, Fut>(name: impl Into<String>, operation: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name: String = name.into();
        Self {
            name: name.into(),
            operation: Arc::new(move || Box::pin(operation()) as ConnectFuture),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run one connection attempt
    pub fn attempt(&self) -> ConnectFuture {
        (self.operation)()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
