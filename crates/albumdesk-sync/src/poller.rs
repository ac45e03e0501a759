//! Polling synchronizer
//!
//! The backend has no push channel, so each active view owns exactly one
//! polling task: started with [`Poller::start`], stopped with
//! [`Poller::shutdown`] or by dropping the handle. Every tick fetches the
//! full order and worker lists and publishes a fresh [`Snapshot`] through a
//! watch channel; consumers reapply their own filter/sort state to each
//! snapshot, so user-entered filter text survives a refresh.
//!
//! A failed fetch keeps the last-known-good lists, flags the snapshot as
//! stale, and retries on the next tick. Polling never surfaces a blocking
//! error; the worst case is stale data.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use albumdesk_api_client::ApiClient;
use albumdesk_core::{Order, Worker};

/// Capability to fetch the dashboard's lists. Implemented by [`ApiClient`];
/// tests substitute scripted sources.
#[async_trait]
pub trait OrderSource: Send + Sync + 'static {
    async fn fetch_orders(&self) -> Result<Vec<Order>>;
    async fn fetch_workers(&self) -> Result<Vec<Worker>>;
}

#[async_trait]
impl OrderSource for ApiClient {
    async fn fetch_orders(&self) -> Result<Vec<Order>> {
        ApiClient::fetch_orders(self).await
    }

    async fn fetch_workers(&self) -> Result<Vec<Worker>> {
        ApiClient::fetch_workers(self).await
    }
}

/// One published state of the world. Lists are replaced wholesale, never
/// patched in place.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub orders: Vec<Order>,
    pub workers: Vec<Worker>,
    /// When the order list was last fetched successfully.
    pub fetched_at: Option<DateTime<Utc>>,
    /// True when the most recent tick failed and the lists are carried over.
    pub stale: bool,
}

/// Handle to one polling task. Dropping the handle stops the task on its
/// next wakeup; [`Poller::shutdown`] stops it immediately.
pub struct Poller {
    shutdown_tx: mpsc::Sender<()>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl Poller {
    /// Spawn the polling task. The first fetch happens immediately, then
    /// every `poll_interval`.
    pub fn start(source: Arc<dyn OrderSource>, poll_interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());

        tokio::spawn(run(source, poll_interval, snapshot_tx, shutdown_rx));

        Self {
            shutdown_tx,
            snapshot_rx,
        }
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Latest published snapshot.
    pub fn latest(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Signal the polling task to stop. Returns immediately; an in-flight
    /// fetch completes and is discarded.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn run(
    source: Arc<dyn OrderSource>,
    poll_interval: Duration,
    snapshot_tx: watch::Sender<Snapshot>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    tracing::debug!(interval_ms = poll_interval.as_millis() as u64, "Poller started");

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last = Snapshot::default();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                tracing::debug!("Poller shutting down");
                break;
            }
            _ = ticker.tick() => {
                let (orders, workers) =
                    tokio::join!(source.fetch_orders(), source.fetch_workers());

                let mut stale = false;
                match orders {
                    Ok(orders) => {
                        last.orders = orders;
                        last.fetched_at = Some(Utc::now());
                    }
                    Err(e) => {
                        stale = true;
                        tracing::warn!(error = %e, "Order fetch failed, keeping last known list");
                    }
                }
                match workers {
                    Ok(workers) => last.workers = workers,
                    Err(e) => {
                        stale = true;
                        tracing::warn!(error = %e, "Worker fetch failed, keeping last known list");
                    }
                }
                last.stale = stale;

                if snapshot_tx.send(last.clone()).is_err() {
                    break;
                }
            }
        }
    }
}
