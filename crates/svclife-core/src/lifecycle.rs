use crate::config::LifecycleConfig;
use crate::connection::Connection;
use crate::error::LifecycleError;
use crate::runner::{BootstrapReport, ServiceRunner, connect_all};
use crate::scope::Scope;
use crate::service::Service;
use crate::signal::{SignalListener, SignalSource};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Owns the cancellable scope of one process run.
///
/// Creating a `Lifecycle` arms a signal listener on its scope; the first shutdown
/// signal cancels the scope, which bootstrap and the running service observe.
pub struct Lifecycle {
    scope: Scope,
    config: LifecycleConfig,
    listener: JoinHandle<()>,
}

impl Lifecycle {
    /// Derive a cancellable scope from `parent` and arm `signals` on it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<S: SignalSource>(parent: &Scope, config: LifecycleConfig, signals: S) -> Self {
        let scope = parent.child();
        let listener = SignalListener::new(signals).arm(scope.clone());
        Self {
            scope,
            config,
            listener,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Cancel the run as if a shutdown signal had been received
    pub fn cancel(&self) {
        self.scope.cancel();
    }

    /// Establish all `connections` concurrently before the service runs.
    ///
    /// An empty list succeeds without doing anything.
    pub async fn bootstrap(
        &self,
        connections: Vec<Connection>,
    ) -> Result<BootstrapReport, LifecycleError> {
        if connections.is_empty() {
            return Ok(BootstrapReport {
                connected: 0,
                requested: 0,
            });
        }
        connect_all(connections, &self.scope, &self.config).await
    }

    /// Bootstrap the connections declared by `service`
    pub async fn bootstrap_service<S: Service>(
        &self,
        service: &S,
    ) -> Result<BootstrapReport, LifecycleError> {
        self.bootstrap(service.connections()).await
    }

    /// Run `service` until it completes or the lifecycle is cancelled
    pub async fn run<S: Service>(&self, service: Arc<S>) -> Result<(), LifecycleError> {
        let runner = ServiceRunner::new(self.config.shutdown_timeout())
            .with_strict_shutdown(self.config.strict_shutdown);
        let result = runner.run(service, &self.scope).await;
        info!(ok = result.is_ok(), "Service run finished");
        result
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ShutdownSignal;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct BookingService {
        connect_calls: Arc<AtomicUsize>,
        shut_down: AtomicBool,
    }

    #[async_trait]
    impl Service for BookingService {
        async fn start(&self, scope: Scope) -> anyhow::Result<()> {
            scope.cancelled().await;
            Ok(())
        }

        async fn shutdown(&self, _scope: Scope) -> anyhow::Result<()> {
            self.shut_down.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn connections(&self) -> Vec<Connection> {
            let calls = self.connect_calls.clone();
            vec![Connection::new("messagebus", move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })]
        }
    }

    fn booking() -> Arc<BookingService> {
        Arc::new(BookingService {
            connect_calls: Arc::new(AtomicUsize::new(0)),
            shut_down: AtomicBool::new(false),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_drives_shutdown() {
        let (tx, rx) = mpsc::channel(1);
        let lifecycle = Lifecycle::new(&Scope::new(), LifecycleConfig::default(), rx);
        let service = booking();

        let report = lifecycle.bootstrap_service(service.as_ref()).await.unwrap();
        assert_eq!(report.connected, 1);
        assert_eq!(service.connect_calls.load(Ordering::SeqCst), 1);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = tx.send(ShutdownSignal::Interrupt).await;
        });

        lifecycle.run(service.clone()).await.unwrap();
        assert!(service.shut_down.load(Ordering::SeqCst));
        assert!(lifecycle.scope().is_cancelled());
    }

    #[tokio::test]
    async fn test_empty_bootstrap_is_noop() {
        let (_tx, rx) = mpsc::channel::<ShutdownSignal>(1);
        let lifecycle = Lifecycle::new(&Scope::new(), LifecycleConfig::default(), rx);
        lifecycle.cancel();

        let report = lifecycle.bootstrap(Vec::new()).await.unwrap();
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_cancelled_lifecycle_fails_bootstrap() {
        let (_tx, rx) = mpsc::channel::<ShutdownSignal>(1);
        let lifecycle = Lifecycle::new(&Scope::new(), LifecycleConfig::default(), rx);
        let service = booking();
        lifecycle.cancel();

        let err = lifecycle
            .bootstrap_service(service.as_ref())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::BootstrapIncomplete {
                connected: 0,
                requested: 1,
                ..
            }
        ));
        assert_eq!(service.connect_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_parent_cancellation_reaches_lifecycle() {
        let (_tx, rx) = mpsc::channel::<ShutdownSignal>(1);
        let parent = Scope::new();
        let lifecycle = Lifecycle::new(&parent, LifecycleConfig::default(), rx);

        parent.cancel();
        assert!(lifecycle.scope().is_cancelled());
    }
}
