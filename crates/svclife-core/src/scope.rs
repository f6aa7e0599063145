//! Cancellable, hierarchical execution scopes.
//!
//! A [`Scope`] wraps a [`CancellationToken`] and an optional deadline. Child scopes
//! are cancelled together with their parent, and a child's deadline never extends
//! past the parent's.

use crate::error::LifecycleError;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Why a scope stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeExit {
    /// Cancelled explicitly, by a signal, or through a parent
    Cancelled,
    /// The scope's deadline elapsed
    DeadlineExceeded,
}

impl From<ScopeExit> for LifecycleError {
    fn from(exit: ScopeExit) -> Self {
        match exit {
            ScopeExit::Cancelled => LifecycleError::Cancelled,
            ScopeExit::DeadlineExceeded => LifecycleError::DeadlineExceeded,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    token: CancellationToken,
    deadline: Option<Instant>,
    /// Set by whichever of `cancel` or the deadline timer ends this scope first
    cause: Arc<OnceLock<ScopeExit>>,
    parent: Option<Arc<Scope>>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Create a root scope with no deadline
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            cause: Arc::new(OnceLock::new()),
            parent: None,
        }
    }

    /// Create a root scope that is cancelled once `timeout` elapses.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().child_with_timeout(timeout)
    }

    /// Derive a child that inherits cancellation and deadline
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            cause: Arc::new(OnceLock::new()),
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// Derive a child bounded by `timeout` from now, clamped to this scope's deadline.
    ///
    /// Must be called from within a Tokio runtime: the deadline is enforced by a timer
    /// task that exits early if the child is cancelled first.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < own => parent,
            _ => own,
        };

        let token = self.token.child_token();
        let cause = Arc::new(OnceLock::new());
        let timer = token.clone();
        let expired = cause.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    if !timer.is_cancelled() {
                        let _ = expired.set(ScopeExit::DeadlineExceeded);
                        timer.cancel();
                    }
                }
                _ = timer.cancelled() => {}
            }
        });

        Self {
            token,
            deadline: Some(deadline),
            cause,
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// Cancel this scope and all of its children. Cancelling twice is a no-op.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            let _ = self.cause.set(ScopeExit::Cancelled);
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once this scope is cancelled or its deadline passes
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when the scope has no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Reports why the scope stopped, or `None` while it is still live.
    ///
    /// A scope ended through an ancestor reports the ancestor's cause.
    pub fn exit(&self) -> Option<ScopeExit> {
        if !self.token.is_cancelled() {
            return None;
        }
        if let Some(cause) = self.cause.get() {
            return Some(*cause);
        }
        let inherited = self.parent.as_ref().and_then(|parent| parent.exit());
        Some(inherited.unwrap_or(ScopeExit::Cancelled))
    }

    /// The error describing how this scope ended; `Cancelled` if it has not ended yet
    pub fn exit_error(&self) -> LifecycleError {
        self.exit().unwrap_or(ScopeExit::Cancelled).into()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parent_cancels_children() {
        let root = Scope::new();
        let child = root.child();
        let grandchild = child.child();

        root.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
        assert_eq!(grandchild.exit(), Some(ScopeExit::Cancelled));
    }

    #[tokio::test]
    async fn test_child_cancel_does_not_reach_parent() {
        let root = Scope::new();
        let child = root.child();

        child.cancel();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!root.is_cancelled());
        assert_eq!(root.exit(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_expires() {
        let scope = Scope::with_timeout(Duration::from_secs(5));
        let start = Instant::now();

        scope.cancelled().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_millis(5_010));
        assert_eq!(scope.exit(), Some(ScopeExit::DeadlineExceeded));
        assert!(matches!(scope.exit_error(), LifecycleError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_deadline_clamped_to_parent() {
        let parent = Scope::with_timeout(Duration::from_secs(1));
        let child = parent.child_with_timeout(Duration::from_secs(60));

        assert_eq!(child.deadline(), parent.deadline());

        child.cancelled().await;
        assert_eq!(child.exit(), Some(ScopeExit::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_cause_survives_deadline() {
        let scope = Scope::with_timeout(Duration::from_secs(5));
        let child = scope.child();

        tokio::time::sleep(Duration::from_secs(4)).await;
        scope.cancel();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(scope.exit(), Some(ScopeExit::Cancelled));
        assert_eq!(child.exit(), Some(ScopeExit::Cancelled));
        assert!(matches!(scope.exit_error(), LifecycleError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_expiry_keeps_deadline_cause() {
        let parent = Scope::with_timeout(Duration::from_secs(1));
        let child = parent.child();

        child.cancelled().await;
        child.cancel();
        parent.cancel();

        assert_eq!(parent.exit(), Some(ScopeExit::DeadlineExceeded));
        assert_eq!(child.exit(), Some(ScopeExit::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_deadline_reports_cancelled() {
        let scope = Scope::with_timeout(Duration::from_secs(5));
        scope.cancel();

        assert_eq!(scope.exit(), Some(ScopeExit::Cancelled));
        assert_eq!(scope.remaining(), Some(Duration::from_secs(5)));
    }
}
