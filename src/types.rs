//! Wire types for the arbitrage event stream

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event kind as sent by the upstream producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Heartbeat,
    Opportunity,
}

/// Which venue is bought on and which is sold on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "CEX -> DEX")]
    CexToDex,
    #[serde(rename = "DEX -> CEX")]
    DexToCex,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::CexToDex => write!(f, "CEX -> DEX"),
            Direction::DexToCex => write!(f, "DEX -> CEX"),
        }
    }
}

/// Opportunity payload, passed through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeData {
    pub cex_price: f64,
    pub dex_price: f64,
    /// Spread in percent (0.5 = 0.5%)
    pub spread_pct: f64,
    pub estimated_profit: f64,
    pub gas_cost: f64,
    /// e.g. "ETH-USDC"
    pub symbol: String,
    pub direction: Direction,
}

/// A single event from the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    /// Only meaningful for opportunities; may be missing even then
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<TradeData>,
}

impl Event {
    pub fn heartbeat(block_number: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: EventKind::Heartbeat,
            block_number,
            timestamp,
            payload: None,
        }
    }

    pub fn opportunity(block_number: u64, timestamp: DateTime<Utc>, data: TradeData) -> Self {
        Self {
            kind: EventKind::Opportunity,
            block_number,
            timestamp,
            payload: Some(data),
        }
    }

    /// Parse one JSON message from the feed
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn is_opportunity(&self) -> bool {
        self.kind == EventKind::Opportunity
    }

    /// Milliseconds between the event timestamp and `now`.
    /// Negative when the producer clock runs ahead.
    pub fn latency_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_milliseconds()
    }
}

/// One point of the spread chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub block: u64,
    pub spread: f64,
}
