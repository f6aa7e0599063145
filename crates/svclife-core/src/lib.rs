//! svclife core - platform-independent lifecycle orchestration
//!
//! This crate provides the scope, service and connection abstractions, the retrying
//! connection bootstrap and the start/cancel/shutdown runner. Platform crates supply
//! [`SignalSource`] implementations.

mod config;
mod connection;
mod error;
mod lifecycle;
mod scope;
mod service;
mod signal;

pub mod runner;

pub use config::*;
pub use connection::*;
pub use error::*;
pub use lifecycle::Lifecycle;
pub use runner::{BootstrapReport, RunPhase, ServiceRunner};
pub use scope::{Scope, ScopeExit};
pub use service::Service;
pub use signal::*;
