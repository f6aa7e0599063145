//! A booking service that needs a message bus before it can take requests.
//!
//! Run with `RUST_LOG=debug cargo run --example booking` and press Ctrl-C to stop.

use async_trait::async_trait;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use svclife::{Connection, Microservice, Scope, Service};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct BookingService {
    bus_attempts: Arc<AtomicU32>,
    running: watch::Sender<bool>,
}

impl BookingService {
    fn new() -> Self {
        let (running, _) = watch::channel(false);
        Self {
            bus_attempts: Arc::new(AtomicU32::new(0)),
            running,
        }
    }
}

#[async_trait]
impl Service for BookingService {
    async fn start(&self, scope: Scope) -> anyhow::Result<()> {
        self.running.send_replace(true);
        info!("Booking service accepting requests");

        let mut ticker = tokio::time::interval(Duration::from_secs(2));
        loop {
            tokio::select! {
                _ = scope.cancelled() => break,
                _ = ticker.tick() => info!("Processing bookings"),
            }
        }

        self.running.send_replace(false);
        Ok(())
    }

    async fn shutdown(&self, scope: Scope) -> anyhow::Result<()> {
        let mut running = self.running.subscribe();
        tokio::select! {
            stopped = async { running.wait_for(|running| !*running).await.map(|_| ()) } => {
                stopped?;
                info!("Booking service stopped");
                Ok(())
            }
            _ = scope.cancelled() => anyhow::bail!("booking service did not stop in time"),
        }
    }

    fn connections(&self) -> Vec<Connection> {
        let attempts = self.bus_attempts.clone();
        vec![Connection::new("messagebus", move || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    anyhow::bail!("connection refused");
                }
                Ok(())
            }
        })]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let service = Arc::new(BookingService::new());
    let ms = Microservice::new(&Scope::new())?;

    let result = ms.run(service).await;
    if let Err(e) = &result {
        warn!(error = %e, "Booking service exited with an error");
    }
    Ok(svclife::exit_code(&result))
}
