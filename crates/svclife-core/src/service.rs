use crate::connection::Connection;
use crate::scope::Scope;
use async_trait::async_trait;

/// The long-lived body driven by a [`Lifecycle`](crate::Lifecycle).
///
/// # Implementation Notes
///
/// - `start` must watch its scope and return promptly once it is cancelled.
/// - `shutdown` runs against a fresh scope carrying the shutdown deadline and should
///   finish its cleanup before that deadline.
/// - `start` and `shutdown` run as separate tasks and may overlap, so shared state
///   needs its own synchronization.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Run the service until it completes on its own or `scope` is cancelled
    async fn start(&self, scope: Scope) -> anyhow::Result<()>;

    /// Release resources after cancellation
    async fn shutdown(&self, scope: Scope) -> anyhow::Result<()>;

    /// External dependencies to establish before `start`
    fn connections(&self) -> Vec<Connection> {
        Vec::new()
    }
}
