//! Dashboard state store
//!
//! Single owner of the dashboard state. Every mutation goes through one of
//! the operations below and registered observers are notified synchronously
//! once the mutation has been fully applied.

mod observer;
mod shared;

pub use observer::{LogObserver, StateChange, StateObserver};
pub use shared::SharedStore;

#[cfg(test)]
pub use observer::MockStateObserver;


use crate::types::{ChartPoint, Event, TradeData};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of events kept in the feed
pub const MAX_EVENTS: usize = 100;
/// Maximum number of points kept for the spread chart
pub const MAX_CHART_POINTS: usize = 50;

/// Two consecutive opportunities closer than these are the same opportunity
/// reported twice. Values match the upstream generator's jitter.
pub const SPREAD_TOLERANCE: f64 = 0.0001;
pub const CEX_PRICE_TOLERANCE: f64 = 0.01;
pub const DEX_PRICE_TOLERANCE: f64 = 0.01;

/// Everything the views read
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub connected: bool,
    /// Highest block seen by `ingest`, or the last value given to `update_block`
    pub last_block: u64,
    /// Last latency sample, not averaged
    pub latency_ms: i64,
    /// Newest first
    pub events: VecDeque<Event>,
    /// Oldest first
    pub chart_data: VecDeque<ChartPoint>,
}

/// What `ingest` did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    Appended,
    Duplicate,
}

#[derive(Default)]
pub struct DashboardStore {
    state: DashboardState,
    observers: Vec<Arc<dyn StateObserver>>,
}

impl DashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.clone()
    }

    /// Register an observer. Observers must not call back into the store.
    pub fn subscribe(&mut self, observer: Arc<dyn StateObserver>) {
        self.observers.push(observer);
    }

    pub fn set_connected(&mut self, status: bool) {
        self.state.connected = status;
        self.notify(StateChange::Connected { connected: status });
    }

    pub fn update_latency(&mut self, ms: i64) {
        self.state.latency_ms = ms;
        self.notify(StateChange::Latency { latency_ms: ms });
    }

    /// Direct setter; unlike `ingest` this may move the block backwards.
    pub fn update_block(&mut self, block: u64) {
        self.state.last_block = block;
        self.notify(StateChange::Block { last_block: block });
    }

    /// Fold one event into the state
    pub fn ingest(&mut self, event: Event) -> IngestOutcome {
        let block = event.block_number;

        let duplicate = self
            .state
            .events
            .front()
            .is_some_and(|head| is_duplicate(head, &event));

        let outcome = if duplicate {
            debug!("Duplicate opportunity at block {}", block);
            IngestOutcome::Duplicate
        } else {
            if event.is_opportunity() {
                if let Some(data) = &event.payload {
                    self.state.chart_data.push_back(ChartPoint {
                        block,
                        spread: data.spread_pct,
                    });
                    while self.state.chart_data.len() > MAX_CHART_POINTS {
                        self.state.chart_data.pop_front();
                    }
                }
            }

            self.state.events.push_front(event);
            self.state.events.truncate(MAX_EVENTS);
            IngestOutcome::Appended
        };

        self.state.last_block = self.state.last_block.max(block);

        self.notify(StateChange::EventIngested {
            outcome,
            block_number: block,
        });
        outcome
    }

    fn notify(&self, change: StateChange) {
        for observer in &self.observers {
            observer.on_change(&change, &self.state);
        }
    }
}

/// True when `next` repeats the opportunity already at the head of the feed.
///
/// A missing payload compares as zeroed prices and an absent symbol and
/// direction, so two payload-less opportunities are duplicates of each other.
pub fn is_duplicate(head: &Event, next: &Event) -> bool {
    if !head.is_opportunity() || !next.is_opportunity() {
        return false;
    }

    let a = head.payload.as_ref();
    let b = next.payload.as_ref();

    let close = |field: fn(&TradeData) -> f64, tolerance: f64| {
        let x = a.map(field).unwrap_or(0.0);
        let y = b.map(field).unwrap_or(0.0);
        (x - y).abs() < tolerance
    };

    a.map(|d| d.symbol.as_str()) == b.map(|d| d.symbol.as_str())
        && a.map(|d| d.direction) == b.map(|d| d.direction)
        && close(|d| d.spread_pct, SPREAD_TOLERANCE)
        && close(|d| d.cex_price, CEX_PRICE_TOLERANCE)
        && close(|d| d.dex_price, DEX_PRICE_TOLERANCE)
}
