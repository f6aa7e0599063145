//! Raises a real SIGTERM; kept in its own test binary so no other test shares the process.
#![cfg(unix)]

use async_trait::async_trait;
use nix::sys::signal::{Signal, raise};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use svclife::{Microservice, Scope, Service};

struct IdleService {
    shut_down: AtomicBool,
}

#[async_trait]
impl Service for IdleService {
    async fn start(&self, scope: Scope) -> anyhow::Result<()> {
        scope.cancelled().await;
        Ok(())
    }

    async fn shutdown(&self, _scope: Scope) -> anyhow::Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_sigterm_triggers_graceful_shutdown() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let ms = Microservice::new(&Scope::new()).unwrap();
    let service = Arc::new(IdleService {
        shut_down: AtomicBool::new(false),
    });

    tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        raise(Signal::SIGTERM).unwrap();
    });

    let result = tokio::time::timeout(Duration::from_secs(10), ms.start(service.clone()))
        .await
        .unwrap();

    assert!(result.is_ok());
    assert!(service.shut_down.load(Ordering::SeqCst));
    assert!(ms.scope().is_cancelled());
}
