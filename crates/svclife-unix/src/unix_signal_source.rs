use anyhow::Result;
use async_trait::async_trait;
use svclife_core::{ShutdownSignal, SignalSource};

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use anyhow::Context;
    use nix::sys::signal::Signal;
    use tokio::signal::unix::{SignalKind, signal};
    use tracing::{debug, info};

    /// Listens for SIGINT and SIGTERM
    pub struct UnixSignalSource {
        interrupt: tokio::signal::unix::Signal,
        terminate: tokio::signal::unix::Signal,
    }

    impl UnixSignalSource {
        /// Install handlers for SIGINT and SIGTERM.
        ///
        /// Must be called from within a Tokio runtime. Once installed, the handlers
        /// replace the default terminate action for the rest of the process.
        pub fn new() -> Result<Self> {
            let interrupt = signal(SignalKind::interrupt())
                .with_context(|| format!("Failed to install {} handler", Signal::SIGINT.as_str()))?;
            let terminate = signal(SignalKind::terminate())
                .with_context(|| format!("Failed to install {} handler", Signal::SIGTERM.as_str()))?;
            debug!("Installed SIGINT and SIGTERM handlers");

            Ok(Self {
                interrupt,
                terminate,
            })
        }
    }

    #[async_trait]
    impl SignalSource for UnixSignalSource {
        async fn recv(&mut self) -> Option<ShutdownSignal> {
            let (raw, signal) = tokio::select! {
                received = self.interrupt.recv() => (Signal::SIGINT, received.map(|_| ShutdownSignal::Interrupt)),
                received = self.terminate.recv() => (Signal::SIGTERM, received.map(|_| ShutdownSignal::Terminate)),
            };
            if signal.is_some() {
                info!(signal = raw.as_str(), "Received Unix signal");
            }
            signal
        }
    }
}

#[cfg(unix)]
pub use unix_impl::UnixSignalSource;

#[cfg(not(unix))]
pub struct UnixSignalSource;

#[cfg(not(unix))]
impl UnixSignalSource {
    pub fn new() -> Result<Self> {
        Err(anyhow::anyhow!("Unix signals are not available on this platform"))
    }
}

#[cfg(not(unix))]
#[async_trait]
impl SignalSource for UnixSignalSource {
    async fn recv(&mut self) -> Option<ShutdownSignal> {
        None
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use nix::sys::signal::{Signal, raise};
    use std::time::Duration;

    #[tokio::test]
    async fn test_sigterm_is_reported_as_terminate() {
        let mut source = UnixSignalSource::new().unwrap();

        raise(Signal::SIGTERM).unwrap();

        let received = tokio::time::timeout(Duration::from_secs(5), source.recv())
            .await
            .unwrap();
        assert_eq!(received, Some(ShutdownSignal::Terminate));
    }
}
