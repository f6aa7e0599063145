mod backoff;
mod bootstrap;
mod service_runner;

pub use backoff::retry_notify;
pub use bootstrap::{BootstrapReport, connect_all};
pub use service_runner::{RunPhase, ServiceRunner};
