//! Windows-specific signal handling

mod windows_signal_source;

pub use windows_signal_source::WindowsSignalSource;

/// Windows-specific signal source factory
pub struct WindowsSignalSourceFactory;

impl svclife_core::SignalSourceFactory for WindowsSignalSourceFactory {
    type Source = WindowsSignalSource;

    fn create_signal_source() -> anyhow::Result<Self::Source> {
        WindowsSignalSource::new()
    }

    fn platform_name() -> &'static str {
        "Windows"
    }
}
