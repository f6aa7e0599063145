use crate::config::{BackoffConfig, LifecycleConfig};
use crate::connection::Connection;
use crate::error::LifecycleError;
use crate::runner::backoff::retry_notify;
use crate::scope::Scope;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Summary of a successful bootstrap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapReport {
    pub connected: usize,
    pub requested: usize,
}

impl BootstrapReport {
    pub fn is_complete(&self) -> bool {
        self.connected == self.requested
    }
}

/// Establish every connection concurrently, retrying each until it succeeds or its
/// connection-phase deadline expires.
///
/// Returns only after every connection task has finished. Succeeds iff all connections
/// succeeded; otherwise reports the ones that did not, in declaration order.
pub async fn connect_all(
    connections: Vec<Connection>,
    parent: &Scope,
    config: &LifecycleConfig,
) -> Result<BootstrapReport, LifecycleError> {
    let requested = connections.len();
    if requested == 0 {
        return Ok(BootstrapReport {
            connected: 0,
            requested: 0,
        });
    }

    info!(requested, "Establishing connections");

    let mut names = Vec::with_capacity(requested);
    let mut task_index = HashMap::with_capacity(requested);
    let mut tasks = JoinSet::new();

    for (index, connection) in connections.into_iter().enumerate() {
        let scope = parent.child_with_timeout(config.connection_timeout());
        let backoff = config.backoff.clone();
        names.push(connection.name().to_string());

        let handle = tasks.spawn(async move {
            // Cancels the scope and its timer however the task ends, abort included
            let _guard = scope.token().clone().drop_guard();
            connect_one(&connection, &scope, &backoff).await
        });
        task_index.insert(handle.id(), index);
    }

    let mut succeeded = vec![false; requested];
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, connected)) => {
                if let Some(&index) = task_index.get(&id) {
                    succeeded[index] = connected;
                }
            }
            Err(e) => {
                let name = task_index
                    .get(&e.id())
                    .map(|&index| names[index].as_str())
                    .unwrap_or("<unknown>");
                error!(connection = %name, error = %e, "Connection task failed");
            }
        }
    }

    let connected = succeeded.iter().filter(|ok| **ok).count();
    if connected == requested {
        info!(connected, requested, "All connections established");
        return Ok(BootstrapReport {
            connected,
            requested,
        });
    }

    let missing: Vec<String> = names
        .into_iter()
        .zip(succeeded)
        .filter_map(|(name, ok)| (!ok).then_some(name))
        .collect();
    error!(connected, requested, ?missing, "Unable to connect to all services");
    Err(LifecycleError::BootstrapIncomplete {
        connected,
        requested,
        missing,
    })
}

async fn connect_one(
    connection: &Connection,
    scope: &Scope,
    backoff: &BackoffConfig,
) -> bool {
    let name = connection.name();
    if scope.is_cancelled() {
        debug!(connection = %name, "Scope already cancelled, skipping connection");
        return false;
    }

    let result = retry_notify(|| connection.attempt(), backoff, scope, |err, delay| {
        warn!(
            connection = %name,
            error = %err,
            "failed to connect to {} - retrying in {:?}",
            name,
            round_to_tenths(delay)
        );
    })
    .await;

    match result {
        Ok(()) => {
            info!(connection = %name, "Connected");
            true
        }
        Err(e) => {
            warn!(connection = %name, reason = %e, "Gave up connecting");
            false
        }
    }
}

fn round_to_tenths(delay: Duration) -> Duration {
    Duration::from_millis((delay.as_millis() as u64 + 50) / 100 * 100)
}
