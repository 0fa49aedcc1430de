//! CEX-DEX Arbitrage Dashboard
//!
//! Ingests a stream of heartbeat and opportunity events, keeps a bounded
//! recent history and serves it to live dashboard views.
//!
//! ## Architecture
//!
//! ```text
//! EventSource (live WS / mock) → run_ingest → SharedStore → observers → Dashboard API (HTTP/WS)
//!                                                  ↑
//!                                     views (header stats, feed rows)
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod monitor;
pub mod store;
pub mod types;
pub mod views;
