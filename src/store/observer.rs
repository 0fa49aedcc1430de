//! Change notifications

use super::{DashboardState, IngestOutcome};
use serde::Serialize;

/// Which part of the state a mutation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateChange {
    Connected { connected: bool },
    Latency { latency_ms: i64 },
    Block { last_block: u64 },
    EventIngested { outcome: IngestOutcome, block_number: u64 },
}

/// Receives every change right after it is applied.
///
/// Called with the store locked: implementations should hand the change off
/// (a channel send, a flag) rather than do work inline.
#[cfg_attr(test, mockall::automock)]
pub trait StateObserver: Send + Sync {
    fn on_change(&self, change: &StateChange, state: &DashboardState);
}

/// Logs every change at trace level
pub struct LogObserver;

impl StateObserver for LogObserver {
    fn on_change(&self, change: &StateChange, state: &DashboardState) {
        tracing::trace!(
            ?change,
            last_block = state.last_block,
            events = state.events.len(),
            chart_points = state.chart_data.len(),
            "State changed"
        );
    }
}
