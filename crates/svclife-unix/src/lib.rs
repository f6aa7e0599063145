mod unix_signal_source;

pub use unix_signal_source::UnixSignalSource;

/// Factory for creating Unix signal sources
pub struct UnixSignalSourceFactory;

impl svclife_core::SignalSourceFactory for UnixSignalSourceFactory {
    type Source = UnixSignalSource;

    fn create_signal_source() -> anyhow::Result<Self::Source> {
        UnixSignalSource::new()
    }

    fn platform_name() -> &'static str {
        "Unix"
    }
}
