use crate::scope::Scope;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A process-level request to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT on Unix, Ctrl-C on Windows
    Interrupt,
    /// SIGTERM on Unix
    Terminate,
    /// Ctrl-Break on Windows
    Break,
    /// Console window closed on Windows
    Close,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownSignal::Interrupt => "interrupt",
            ShutdownSignal::Terminate => "terminate",
            ShutdownSignal::Break => "break",
            ShutdownSignal::Close => "close",
        };
        f.write_str(name)
    }
}

/// Source of shutdown signals
///
/// Handlers are installed when the source is constructed, so creating a source is the
/// fallible step and `recv` only waits. `None` means the source can no longer deliver
/// signals.
#[async_trait]
pub trait SignalSource: Send + 'static {
    async fn recv(&mut self) -> Option<ShutdownSignal>;
}

/// Programmatic source, mostly for tests and embedders with their own signal plumbing
#[async_trait]
impl SignalSource for mpsc::Receiver<ShutdownSignal> {
    async fn recv(&mut self) -> Option<ShutdownSignal> {
        mpsc::Receiver::recv(self).await
    }
}

/// Factory trait for creating platform-specific signal sources
pub trait SignalSourceFactory {
    /// The type of source this factory creates
    type Source: SignalSource;

    /// Install the platform's signal handlers
    fn create_signal_source() -> anyhow::Result<Self::Source>;

    /// Get the platform name for logging and debugging
    fn platform_name() -> &'static str;
}

/// Turns the first signal from a [`SignalSource`] into cancellation of a scope.
///
/// `arm` consumes the listener, so each listener is bound to exactly one scope.
pub struct SignalListener<S> {
    source: S,
}

impl<S: SignalSource> SignalListener<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Spawn the listener task.
    ///
    /// The task cancels `scope` on the first signal and exits. It also exits, without
    /// doing anything, once `scope` is cancelled by someone else.
    pub fn arm(self, scope: Scope) -> JoinHandle<()> {
        let mut source = self.source;
        tokio::spawn(async move {
            tokio::select! {
                signal = source.recv() => match signal {
                    Some(signal) => {
                        info!(%signal, "Interrupt signal received");
                        scope.cancel();
                    }
                    None => debug!("Signal source closed, listener disarmed"),
                },
                _ = scope.cancelled() => debug!("Scope cancelled, signal listener exiting"),
            }
        })
    }
}
