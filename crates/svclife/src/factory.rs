use svclife_core::SignalSourceFactory;

/// Platform-independent factory that selects the appropriate implementation at compile time
pub struct PlatformSignalSourceFactory;

impl SignalSourceFactory for PlatformSignalSourceFactory {
    #[cfg(unix)]
    type Source = svclife_unix::UnixSignalSource;

    #[cfg(windows)]
    type Source = svclife_windows::WindowsSignalSource;

    fn create_signal_source() -> anyhow::Result<Self::Source> {
        #[cfg(unix)]
        return svclife_unix::UnixSignalSourceFactory::create_signal_source();

        #[cfg(windows)]
        return svclife_windows::WindowsSignalSourceFactory::create_signal_source();
    }

    fn platform_name() -> &'static str {
        #[cfg(unix)]
        return svclife_unix::UnixSignalSourceFactory::platform_name();

        #[cfg(windows)]
        return svclife_windows::WindowsSignalSourceFactory::platform_name();
    }
}
