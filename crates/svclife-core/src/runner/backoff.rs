use crate::config::BackoffConfig;
use crate::error::LifecycleError;
use crate::scope::Scope;
use backon::Retryable;
use std::future::Future;
use std::time::Duration;

/// Outcome of a single attempt as seen by the retry loop
#[derive(Debug)]
enum Attempt {
    /// The operation failed and should be retried after the next delay
    Retrying(anyhow::Error),
    /// The scope ended before the attempt could start
    Cancelled,
}

/// Invoke `operation` until it succeeds or `scope` ends.
///
/// Delays grow exponentially as configured by `backoff`, with no attempt limit. Every
/// failed attempt is reported to `notify` together with the delay before the next one.
/// The scope is checked before each attempt and wakes the sleep between attempts; an
/// attempt that is already running is allowed to finish.
pub async fn retry_notify<F, Fut, N>(
    operation: F,
    backoff: &BackoffConfig,
    scope: &Scope,
    mut notify: N,
) -> Result<(), LifecycleError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
    N: FnMut(&anyhow::Error, Duration),
{
    let mut operation = operation;
    let attempt = || {
        let fut = if scope.is_cancelled() {
            None
        } else {
            Some(operation())
        };
        async move {
            match fut {
                Some(fut) => fut.await.map_err(Attempt::Retrying),
                None => Err(Attempt::Cancelled),
            }
        }
    };

    let sleeper_scope = scope.clone();
    let outcome = attempt
        .retry(backoff.strategy())
        .sleep(move |delay| cancellable_sleep(sleeper_scope.clone(), delay))
        .when(|e| matches!(e, Attempt::Retrying(_)))
        .notify(|e, delay| {
            if let Attempt::Retrying(err) = e {
                notify(err, delay);
            }
        })
        .await;

    match outcome {
        Ok(()) => Ok(()),
        Err(Attempt::Cancelled) => Err(scope.exit_error()),
        // Unreachable while the strategy has no attempt limit
        Err(Attempt::Retrying(_)) => Err(scope.exit_error()),
    }
}

async fn cancellable_sleep(scope: Scope, delay: Duration) {
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = scope.cancelled() => {}
    }
}
