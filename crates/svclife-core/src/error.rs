use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinError;

/// Core error types for lifecycle operations
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("not all services connected ({connected}/{requested}), missing: {}", .missing.join(", "))]
    BootstrapIncomplete {
        connected: usize,
        requested: usize,
        missing: Vec<String>,
    },

    #[error(transparent)]
    Service(anyhow::Error),

    #[error("Shutdown failed: {0}")]
    ShutdownFailed(anyhow::Error),

    #[error("shutdown took too long, halting (limit {timeout:?})")]
    ShutdownTimeout { timeout: Duration },

    #[error("Task failed: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LifecycleError {
    /// Check if this error only reports that a scope ended
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            LifecycleError::Cancelled | LifecycleError::DeadlineExceeded
        )
    }

    /// Check if this error should terminate the process with a failure status
    pub fn is_fatal(&self) -> bool {
        !self.is_cancellation()
    }

    /// Process exit status for this error
    pub fn exit_status(&self) -> u8 {
        if self.is_fatal() { 1 } else { 0 }
    }
}

/// Maps the outcome of a lifecycle phase to the status the process should exit with.
///
/// A clean completion or a cleanly cancelled shutdown exits with zero; incomplete
/// bootstrap, a service error or a shutdown timeout exit non-zero.
pub fn exit_code<T>(result: &Result<T, LifecycleError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(e.exit_status()),
    }
}
