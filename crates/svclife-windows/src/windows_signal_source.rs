use anyhow::Result;
use async_trait::async_trait;
use svclife_core::{ShutdownSignal, SignalSource};

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use anyhow::Context;
    use tokio::signal::windows::{CtrlBreak, CtrlC, CtrlClose, ctrl_break, ctrl_c, ctrl_close};
    use tracing::{debug, info};

    /// Listens for Ctrl-C, Ctrl-Break and console close events
    pub struct WindowsSignalSource {
        ctrl_c: CtrlC,
        ctrl_break: CtrlBreak,
        ctrl_close: CtrlClose,
    }

    impl WindowsSignalSource {
        /// Register console control handlers. Must be called from within a Tokio runtime.
        pub fn new() -> Result<Self> {
            let ctrl_c = ctrl_c().context("Failed to install Ctrl-C handler")?;
            let ctrl_break = ctrl_break().context("Failed to install Ctrl-Break handler")?;
            let ctrl_close = ctrl_close().context("Failed to install console close handler")?;
            debug!("Installed console control handlers");

            Ok(Self {
                ctrl_c,
                ctrl_break,
                ctrl_close,
            })
        }
    }

    #[async_trait]
    impl SignalSource for WindowsSignalSource {
        async fn recv(&mut self) -> Option<ShutdownSignal> {
            let signal = tokio::select! {
                received = self.ctrl_c.recv() => received.map(|_| ShutdownSignal::Interrupt),
                received = self.ctrl_break.recv() => received.map(|_| ShutdownSignal::Break),
                received = self.ctrl_close.recv() => received.map(|_| ShutdownSignal::Close),
            };
            if let Some(signal) = signal {
                info!(%signal, "Received console control event");
            }
            signal
        }
    }
}

#[cfg(windows)]
pub use windows_impl::WindowsSignalSource;

#[cfg(not(windows))]
pub struct WindowsSignalSource;

#[cfg(not(windows))]
impl WindowsSignalSource {
    pub fn new() -> Result<Self> {
        Err(anyhow::anyhow!(
            "Windows console control events are not available on this platform"
        ))
    }
}

#[cfg(not(windows))]
#[async_trait]
impl SignalSource for WindowsSignalSource {
    async fn recv(&mut self) -> Option<ShutdownSignal> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn test_unavailable_off_windows() {
        assert!(WindowsSignalSource::new().is_err());
    }

    #[cfg(windows)]
    #[tokio::test]
    async fn test_handlers_install() {
        assert!(WindowsSignalSource::new().is_ok());
    }
}
