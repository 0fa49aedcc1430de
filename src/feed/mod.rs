//! Event sources feeding the store
//!
//! ```text
//! LiveSource (WebSocket) ┐
//!                        ├→ mpsc<FeedUpdate> → run_ingest → SharedStore → observers
//! MockSource (synthetic) ┘
//! ```
//!
//! Sources run on their own task and never touch the store directly; a
//! single ingest task applies updates in arrival order.

pub mod live;
pub mod mock;
pub mod replay;

pub use live::{LiveSource, LiveSourceConfig};
pub use mock::{MockGenerator, MockSource, MockSourceConfig};
pub use replay::{replay, ReplayStats};

use crate::error::Result;
use crate::store::{IngestOutcome, SharedStore};
use crate::types::Event;
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// One message from a source to the store
#[derive(Debug, Clone, PartialEq)]
pub enum FeedUpdate {
    Connected(bool),
    Latency(i64),
    Event(Event),
}

/// A producer of feed updates
#[async_trait]
pub trait EventSource: Send {
    fn name(&self) -> &str;

    /// Produce updates until `shutdown` turns true or `tx` is closed.
    async fn run(
        self: Box<Self>,
        tx: mpsc::Sender<FeedUpdate>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()>;
}

/// Counters kept by the ingest loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub appended: u64,
    pub duplicates: u64,
}

/// Apply one update to the store
pub fn apply(store: &SharedStore, update: FeedUpdate) -> Option<IngestOutcome> {
    match update {
        FeedUpdate::Connected(status) => {
            store.set_connected(status);
            None
        }
        FeedUpdate::Latency(ms) => {
            store.update_latency(ms);
            None
        }
        FeedUpdate::Event(event) => Some(store.ingest(event)),
    }
}

/// Drain the channel into the store until every sender is gone
pub async fn run_ingest(store: SharedStore, mut rx: mpsc::Receiver<FeedUpdate>) -> IngestStats {
    let mut stats = IngestStats::default();

    while let Some(update) = rx.recv().await {
        match apply(&store, update) {
            Some(IngestOutcome::Appended) => stats.appended += 1,
            Some(IngestOutcome::Duplicate) => stats.duplicates += 1,
            None => {}
        }
    }

    info!(
        "Ingest stopped: {} appended, {} duplicates",
        stats.appended, stats.duplicates
    );
    stats
}

/// Send an update, returning false when the receiver is gone
pub(crate) async fn forward(tx: &mpsc::Sender<FeedUpdate>, update: FeedUpdate) -> bool {
    if tx.send(update).await.is_err() {
        debug!("Feed channel closed");
        return false;
    }
    true
}

/// Ask a running source to stop and wait for it. A source that already
/// returned on its own is not an error.
pub async fn stop_source(
    shutdown: &watch::Sender<bool>,
    handle: JoinHandle<Result<()>>,
) -> Result<()> {
    let _ = shutdown.send(true);
    handle.await?
}

/// Resolves once shutdown is requested or the controller is gone
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, TradeData};
    use chrono::Utc;

    fn opportunity(block: u64) -> Event {
        Event::opportunity(
            block,
            Utc::now(),
            TradeData {
                cex_price: 3000.0,
                dex_price: 3010.0,
                spread_pct: 0.5,
                estimated_profit: 10.0,
                gas_cost: 5.0,
                symbol: "ETH-USDC".to_string(),
                direction: Direction::CexToDex,
            },
        )
    }

    #[tokio::test]
    async fn test_run_ingest_applies_in_order() {
        let store = SharedStore::default();
        let (tx, rx) = mpsc::channel(16);

        tx.send(FeedUpdate::Connected(true)).await.unwrap();
        tx.send(FeedUpdate::Latency(25)).await.unwrap();
        tx.send(FeedUpdate::Event(Event::heartbeat(10, Utc::now()))).await.unwrap();
        tx.send(FeedUpdate::Event(opportunity(11))).await.unwrap();
        tx.send(FeedUpdate::Event(opportunity(12))).await.unwrap();
        tx.send(FeedUpdate::Connected(false)).await.unwrap();
        drop(tx);

        let stats = run_ingest(store.clone(), rx).await;

        assert_eq!(stats, IngestStats { appended: 2, duplicates: 1 });
        let state = store.snapshot();
        assert!(!state.connected);
        assert_eq!(state.latency_ms, 25);
        assert_eq!(state.events.len(), 2);
        assert_eq!(state.chart_data.len(), 1);
        assert_eq!(state.last_block, 12);
    }

    #[tokio::test]
    async fn test_stop_source_after_source_returned() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            drop(shutdown_rx);
            Ok(())
        });
        // Let the source finish and release its receiver first
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }
        assert!(shutdown_tx.send(true).is_err());

        tokio_test::assert_ok!(stop_source(&shutdown_tx, handle).await);
    }

    #[tokio::test]
    async fn test_stop_source_signals_running_source() {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            shutdown_requested(&mut shutdown_rx).await;
            Ok(())
        });

        tokio_test::assert_ok!(stop_source(&shutdown_tx, handle).await);
    }

    #[test]
    fn test_apply_reports_outcome() {
        let store = SharedStore::default();
        assert_eq!(apply(&store, FeedUpdate::Latency(3)), None);
        assert_eq!(
            apply(&store, FeedUpdate::Event(opportunity(1))),
            Some(IngestOutcome::Appended)
        );
        assert_eq!(
            apply(&store, FeedUpdate::Event(opportunity(2))),
            Some(IngestOutcome::Duplicate)
        );
    }
}
