//! Microservice lifecycle orchestration.
//!
//! [`Microservice`] ties the core [`Lifecycle`] to the operating system's shutdown
//! signals: connections are bootstrapped with retry, the service runs until it
//! finishes or a signal arrives, and shutdown is bounded by a deadline.
//!
//! ```rust,no_run
//! use std::process::ExitCode;
//! use std::sync::Arc;
//! use svclife::{Microservice, Scope, Service};
//!
//! # struct Booking;
//! # #[async_trait::async_trait]
//! # impl Service for Booking {
//! #     async fn start(&self, scope: Scope) -> anyhow::Result<()> { scope.cancelled().await; Ok(()) }
//! #     async fn shutdown(&self, _scope: Scope) -> anyhow::Result<()> { Ok(()) }
//! # }
//! #[tokio::main]
//! async fn main() -> anyhow::Result<ExitCode> {
//!     let ms = Microservice::new(&Scope::new())?;
//!     let result = ms.run(Arc::new(Booking)).await;
//!     Ok(svclife::exit_code(&result))
//! }
//! ```

mod factory;

pub use factory::PlatformSignalSourceFactory;
pub use svclife_core::*;

use std::sync::Arc;
use tracing::info;

/// High-level lifecycle handle armed on the platform's shutdown signals
pub struct Microservice {
    inner: Lifecycle,
}

impl Microservice {
    /// Create a handle with the default configuration.
    ///
    /// Installs the platform's signal handlers; must be called from within a Tokio runtime.
    pub fn new(parent: &Scope) -> anyhow::Result<Self> {
        Self::with_config(parent, LifecycleConfig::default())
    }

    pub fn with_config(parent: &Scope, config: LifecycleConfig) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(|e| LifecycleError::Config(e.to_string()))?;
        let signals = PlatformSignalSourceFactory::create_signal_source()?;
        info!(
            platform = PlatformSignalSourceFactory::platform_name(),
            "Shutdown signal handlers armed"
        );
        Ok(Self {
            inner: Lifecycle::new(parent, config, signals),
        })
    }

    /// Establish all connections concurrently, returning once all succeeded or timed out
    pub async fn setup_connections(
        &self,
        connections: Vec<Connection>,
    ) -> Result<BootstrapReport, LifecycleError> {
        self.inner.bootstrap(connections).await
    }

    /// Establish the connections declared by `service`
    pub async fn bootstrap_service<S: Service>(
        &self,
        service: &S,
    ) -> Result<BootstrapReport, LifecycleError> {
        self.inner.bootstrap_service(service).await
    }

    /// Bootstrap the connections declared by `service`, then run it.
    ///
    /// The service is never started if bootstrap fails.
    pub async fn run<S: Service>(&self, service: Arc<S>) -> Result<(), LifecycleError> {
        self.bootstrap_service(service.as_ref()).await?;
        self.start(service).await
    }

    /// Run `service`, shutting it down when a signal arrives or the handle is cancelled
    pub async fn start<S: Service>(&self, service: Arc<S>) -> Result<(), LifecycleError> {
        self.inner.run(service).await
    }

    /// Request shutdown without an OS signal
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    pub fn scope(&self) -> &Scope {
        self.inner.scope()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.inner
    }
}
