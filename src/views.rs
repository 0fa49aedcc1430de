//! Display-side aggregates
//!
//! Recomputed from a state snapshot on demand. Nothing here is stored.

use crate::store::DashboardState;
use crate::types::{Event, EventKind};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of most recent events the header stats look at, counted from the
/// newest end of the feed
pub const HEADER_WINDOW: usize = 20;
/// Estimated profit above which a feed row is flagged
pub const HIGH_VALUE_PROFIT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderStats {
    pub connected: bool,
    pub last_block: u64,
    pub latency_ms: i64,
    /// Opportunities with positive estimated profit in the window
    pub profitable_ops: usize,
    /// Mean spread over the window; events without data count as zero
    pub avg_spread_pct: f64,
}

impl HeaderStats {
    pub fn from_state(state: &DashboardState) -> Self {
        let window: Vec<&Event> = state.events.iter().take(HEADER_WINDOW).collect();

        let profitable_ops = window
            .iter()
            .filter(|e| e.payload.as_ref().is_some_and(|d| d.estimated_profit > 0.0))
            .count();

        let avg_spread_pct = if window.is_empty() {
            0.0
        } else {
            let total: f64 = window
                .iter()
                .map(|e| e.payload.as_ref().map_or(0.0, |d| d.spread_pct))
                .sum();
            total / window.len() as f64
        };

        Self {
            connected: state.connected,
            last_block: state.last_block,
            latency_ms: state.latency_ms,
            profitable_ops,
            avg_spread_pct,
        }
    }
}

/// One row of the live feed, with missing data zeroed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedRow {
    pub kind: EventKind,
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub direction: String,
    pub cex_price: f64,
    pub dex_price: f64,
    pub spread_pct: f64,
    pub estimated_profit: f64,
    pub gas_cost: f64,
    /// Profit before gas
    pub gross_profit: f64,
    pub profitable: bool,
    pub high_value: bool,
}

impl From<&Event> for FeedRow {
    fn from(event: &Event) -> Self {
        let data = event.payload.as_ref();
        let estimated_profit = data.map_or(0.0, |d| d.estimated_profit);
        let gas_cost = data.map_or(0.0, |d| d.gas_cost);

        Self {
            kind: event.kind,
            block_number: event.block_number,
            timestamp: event.timestamp,
            symbol: data.map(|d| d.symbol.clone()).unwrap_or_default(),
            direction: data.map(|d| d.direction.to_string()).unwrap_or_default(),
            cex_price: data.map_or(0.0, |d| d.cex_price),
            dex_price: data.map_or(0.0, |d| d.dex_price),
            spread_pct: data.map_or(0.0, |d| d.spread_pct),
            estimated_profit,
            gas_cost,
            gross_profit: estimated_profit + gas_cost,
            profitable: estimated_profit > 0.0,
            high_value: estimated_profit > HIGH_VALUE_PROFIT,
        }
    }
}

/// Newest-first feed rows, at most `limit`
pub fn feed_rows(state: &DashboardState, limit: usize) -> Vec<FeedRow> {
    state.events.iter().take(limit).map(FeedRow::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DashboardStore;
    use crate::types::{Direction, TradeData};

    fn opportunity(block: u64, spread: f64, profit: f64) -> Event {
        Event::opportunity(
            block,
            Utc::now(),
            TradeData {
                cex_price: 3000.0 + block as f64,
                dex_price: 3010.0,
                spread_pct: spread,
                estimated_profit: profit,
                gas_cost: 5.0,
                symbol: "ETH-USDC".to_string(),
                direction: Direction::DexToCex,
            },
        )
    }

    #[test]
    fn test_header_stats_empty() {
        let stats = HeaderStats::from_state(&DashboardState::default());
        assert_eq!(stats.profitable_ops, 0);
        assert_eq!(stats.avg_spread_pct, 0.0);
        assert!(!stats.connected);
    }

    #[test]
    fn test_header_stats_counts_heartbeats_as_zero_spread() {
        let mut store = DashboardStore::new();
        store.ingest(opportunity(1, 0.6, 10.0));
        store.ingest(Event::heartbeat(2, Utc::now()));
        store.ingest(opportunity(3, -0.3, -5.0));
        store.set_connected(true);
        store.update_latency(18);

        let stats = HeaderStats::from_state(store.state());
        assert_eq!(stats.profitable_ops, 1);
        assert!((stats.avg_spread_pct - 0.1).abs() < 1e-9);
        assert!(stats.connected);
        assert_eq!(stats.last_block, 3);
        assert_eq!(stats.latency_ms, 18);
    }

    #[test]
    fn test_header_stats_window_is_most_recent() {
        let mut store = DashboardStore::new();
        for block in 1..=10 {
            store.ingest(opportunity(block, 5.0, 1.0));
        }
        for block in 11..=30 {
            store.ingest(opportunity(block, 1.0, -1.0));
        }

        let stats = HeaderStats::from_state(store.state());
        assert_eq!(stats.profitable_ops, 0);
        assert!((stats.avg_spread_pct - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_feed_row_zero_defaults() {
        let row = FeedRow::from(&Event::heartbeat(4, Utc::now()));
        assert_eq!(row.kind, EventKind::Heartbeat);
        assert_eq!(row.symbol, "");
        assert_eq!(row.cex_price, 0.0);
        assert_eq!(row.estimated_profit, 0.0);
        assert_eq!(row.gross_profit, 0.0);
        assert!(!row.profitable);
        assert!(!row.high_value);
    }

    #[test]
    fn test_feed_row_gross_and_high_value() {
        let row = FeedRow::from(&opportunity(1, 0.4, 62.5));
        assert_eq!(row.gross_profit, 67.5);
        assert!(row.high_value);

        let row = FeedRow::from(&opportunity(2, 0.4, 50.0));
        assert_eq!(row.gross_profit, 55.0);
        assert!(row.profitable);
        assert!(!row.high_value);
    }

    #[test]
    fn test_feed_rows_newest_first() {
        let mut store = DashboardStore::new();
        for block in 1..=5 {
            store.ingest(opportunity(block, 0.1 * block as f64, 3.0));
        }

        let rows = feed_rows(store.state(), 3);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].block_number, 5);
        assert_eq!(rows[0].direction, "DEX -> CEX");
        assert!(rows[0].profitable);
        assert_eq!(rows[2].block_number, 3);
    }
}
