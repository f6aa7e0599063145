use crate::error::LifecycleError;
use crate::scope::Scope;
use crate::service::Service;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Phases a service passes through while it is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Starting,
    Running,
    ShuttingDown,
    Completed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Starting => "starting",
            RunPhase::Running => "running",
            RunPhase::ShuttingDown => "shutting_down",
            RunPhase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Drives one service from start to completion or to a bounded shutdown
pub struct ServiceRunner {
    shutdown_timeout: Duration,
    strict_shutdown: bool,
}

impl ServiceRunner {
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            shutdown_timeout,
            strict_shutdown: false,
        }
    }

    /// Return shutdown errors instead of only logging them
    pub fn with_strict_shutdown(mut self, strict: bool) -> Self {
        self.strict_shutdown = strict;
        self
    }

    /// Start `service` under a child of `scope` and wait for it.
    ///
    /// If `start` returns before `scope` is cancelled its result is returned as is and
    /// `shutdown` is never called. Otherwise `shutdown` runs once against a fresh scope
    /// bounded by the shutdown timeout, including when `start` has already returned
    /// in response to the cancellation.
    pub async fn run<S: Service>(
        &self,
        service: Arc<S>,
        scope: &Scope,
    ) -> Result<(), LifecycleError> {
        let start_scope = scope.child();
        debug!(phase = %RunPhase::Starting, "Launching service");
        let mut start = spawn_start(service.clone(), start_scope.clone());
        debug!(phase = %RunPhase::Running, "Service running");

        tokio::select! {
            biased;
            joined = &mut start => {
                if !start_scope.is_cancelled() {
                    debug!(phase = %RunPhase::Completed, "Service returned before cancellation");
                    return joined?.map_err(LifecycleError::Service);
                }
                match joined {
                    Ok(Ok(())) => debug!("Service start returned after cancellation"),
                    Ok(Err(e)) => debug!(error = %e, "Service start failed after cancellation"),
                    Err(e) => warn!(error = %e, "Service start task failed after cancellation"),
                }
            }
            _ = start_scope.cancelled() => {}
        }

        info!(phase = %RunPhase::ShuttingDown, "Cancellation received, shutting down...");
        self.shutdown(service).await
    }

    async fn shutdown<S: Service>(&self, service: Arc<S>) -> Result<(), LifecycleError> {
        let scope = Scope::with_timeout(self.shutdown_timeout);
        let mut task = spawn_shutdown(service, scope.clone());

        tokio::select! {
            biased;
            joined = &mut task => {
                scope.cancel();
                debug!(phase = %RunPhase::Completed, "Shutdown finished");
                match joined {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => {
                        warn!(error = %e, "Service shutdown returned an error");
                        if self.strict_shutdown {
                            Err(LifecycleError::ShutdownFailed(e))
                        } else {
                            Ok(())
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Service shutdown task failed");
                        if self.strict_shutdown {
                            Err(LifecycleError::TaskFailed(e))
                        } else {
                            Ok(())
                        }
                    }
                }
            }
            _ = scope.cancelled() => {
                error!(
                    timeout = ?self.shutdown_timeout,
                    "shutdown took too long, halting"
                );
                // Detached: the task keeps its cancelled scope and is reclaimed at process exit
                drop(task);
                Err(LifecycleError::ShutdownTimeout {
                    timeout: self.shutdown_timeout,
                })
            }
        }
    }
}

fn spawn_start<S: Service>(service: Arc<S>, scope: Scope) -> JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move { service.start(scope).await })
}

fn spawn_shutdown<S: Service>(service: Arc<S>, scope: Scope) -> JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move { service.shutdown(scope).await })
}
