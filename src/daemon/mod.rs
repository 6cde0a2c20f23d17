//! Daemon mode: serve filter requests over a Unix socket
//!
//! All requests funnel through one worker task that owns the
//! [`FilterService`], so ratings, retraining and predictions are applied
//! one at a time in arrival order. With `training.retrain_on_rating` off,
//! the same worker retrains on a debounce tick once ratings have piled up. Connection tasks only parse, forward and
//! write back.
//!
//! # Usage
//! ```no_run
//! use feedsift_core::{daemon::FilterDaemon, FeedsiftConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FeedsiftConfig::load(None)?;
//!     FilterDaemon::open(config).await?.run_until(tokio::signal::ctrl_c()).await?;
//!     Ok(())
//! }
//! ```

pub mod ipc;

pub use ipc::{send_request, start_ipc_server};

use crate::config::FeedsiftConfig;
use crate::engine::DecisionEngine;
use crate::error::Result;
use crate::protocol::{RequestEnvelope, ResponseEnvelope};
use crate::service::FilterService;
use crate::storage::SqliteStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Message from a connection task to the worker
#[derive(Debug)]
pub enum DaemonMessage {
    /// A request and where to send its response
    Request(RequestEnvelope, oneshot::Sender<ResponseEnvelope>),
}

/// Spawn the worker that owns the service. Stops when every sender is dropped.
///
/// Between requests the worker checks every `debounce` whether ratings were
/// saved without retraining, and if so rebuilds the model once for all of them.
pub fn spawn_worker(
    service: FilterService,
    capacity: usize,
    debounce: Duration,
) -> (mpsc::Sender<DaemonMessage>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(capacity);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(debounce);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(DaemonMessage::Request(envelope, reply)) => {
                        let response = service.handle(envelope.request).await;
                        let envelope = ResponseEnvelope {
                            id: envelope.id,
                            response,
                        };
                        if reply.send(envelope).is_err() {
                            debug!("Requester went away before the response was ready");
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if service.engine().corpus_changed() {
                        match service.retrain().await {
                            Ok(outcome) => debug!(
                                "Deferred retrain over {} rated items (trained: {})",
                                outcome.rated_count, outcome.trained
                            ),
                            Err(e) => warn!("Deferred retrain failed, will retry: {}", e),
                        }
                    }
                }
            }
        }
        debug!("Filter worker stopped");
    });

    (tx, handle)
}

/// Long-running filter daemon
pub struct FilterDaemon {
    config: FeedsiftConfig,
    service: FilterService,
}

impl FilterDaemon {
    pub fn new(config: FeedsiftConfig, service: FilterService) -> Self {
        Self { config, service }
    }

    /// Build the daemon on the configured SQLite store
    pub async fn open(config: FeedsiftConfig) -> Result<Self> {
        let store = SqliteStore::open(config.storage.db_path()).await?;
        let engine = Arc::new(DecisionEngine::from_config(&config.model));
        let service = FilterService::new(engine, Arc::new(store), &config.training);
        Ok(Self::new(config, service))
    }

    /// Train from persisted ratings, then serve until `shutdown` resolves
    pub async fn run_until<F, T>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = T>,
    {
        let outcome = self.service.retrain().await?;
        info!(
            "Loaded {} rated items, model {}",
            outcome.rated_count,
            if outcome.trained { "ready" } else { "untrained" }
        );

        let socket_path = self.config.daemon.socket_path();
        let (tx, worker) = spawn_worker(
            self.service,
            self.config.daemon.queue_capacity,
            Duration::from_millis(self.config.daemon.retrain_debounce_ms),
        );
        let server = start_ipc_server(socket_path.clone(), tx).await?;

        shutdown.await;
        info!("Shutting down filter daemon");

        // Dropping the listener drops its sender; the worker drains what is queued
        server.abort();
        let _ = server.await;
        let grace = Duration::from_millis(self.config.daemon.request_timeout_ms);
        match tokio::time::timeout(grace, worker).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Filter worker ended abnormally: {}", e),
            Err(_) => warn!("Filter worker still busy after {:?}, leaving it", grace),
        }
        if socket_path.exists() {
            if let Err(e) = tokio::fs::remove_file(&socket_path).await {
                warn!("Failed to remove socket {}: {}", socket_path.display(), e);
            }
        }
        Ok(())
    }
}
