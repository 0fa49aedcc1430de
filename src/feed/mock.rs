//! Synthetic feed for running the dashboard without an engine

use super::{forward, shutdown_requested, EventSource, FeedUpdate};
use crate::error::Result;
use crate::types::{Direction, Event, TradeData};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant};
use tracing::info;

/// Share of generated events that are opportunities
const OPPORTUNITY_PROBABILITY: f64 = 0.7;
const MOCK_SYMBOL: &str = "ETH-USDC";

#[derive(Debug, Clone)]
pub struct MockSourceConfig {
    /// Time between generated blocks
    pub interval: Duration,
    /// First generated event carries `start_block + 1`
    pub start_block: u64,
    /// Fixed seed for reproducible streams
    pub seed: Option<u64>,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            start_block: 18_000_000,
            seed: None,
        }
    }
}

/// Random event generator, one block per call
pub struct MockGenerator {
    rng: StdRng,
    block: u64,
}

impl MockGenerator {
    pub fn new(start_block: u64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            block: start_block,
        }
    }

    pub fn current_block(&self) -> u64 {
        self.block
    }

    pub fn next_event(&mut self, now: DateTime<Utc>) -> Event {
        self.block += 1;

        if !self.rng.random_bool(OPPORTUNITY_PROBABILITY) {
            return Event::heartbeat(self.block, now);
        }

        let direction = if self.rng.random_bool(0.5) {
            Direction::CexToDex
        } else {
            Direction::DexToCex
        };

        Event::opportunity(
            self.block,
            now,
            TradeData {
                cex_price: self.rng.random_range(3000.0..3050.0),
                dex_price: self.rng.random_range(3000.0..3050.0),
                spread_pct: self.rng.random_range(-1.0..1.0),
                estimated_profit: self.rng.random_range(-20.0..80.0),
                gas_cost: self.rng.random_range(5.0..10.0),
                symbol: MOCK_SYMBOL.to_string(),
                direction,
            },
        )
    }

    /// Fake round-trip time in ms
    pub fn latency_sample(&mut self) -> i64 {
        self.rng.random_range(10..60)
    }
}

/// Emits one generated event per interval, followed by a latency sample
pub struct MockSource {
    config: MockSourceConfig,
}

impl MockSource {
    pub fn new(config: MockSourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EventSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(
        self: Box<Self>,
        tx: mpsc::Sender<FeedUpdate>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!(
            "Starting mock feed from block {} every {}ms",
            self.config.start_block,
            self.config.interval.as_millis()
        );

        let mut generator = MockGenerator::new(self.config.start_block, self.config.seed);
        if !forward(&tx, FeedUpdate::Connected(true)).await {
            return Ok(());
        }

        let mut ticker = interval_at(Instant::now() + self.config.interval, self.config.interval);

        loop {
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => {
                    info!("Mock feed stopped at block {}", generator.current_block());
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let event = generator.next_event(Utc::now());
                    let latency = generator.latency_sample();
                    if !forward(&tx, FeedUpdate::Event(event)).await
                        || !forward(&tx, FeedUpdate::Latency(latency)).await
                    {
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;

    #[test]
    fn test_generator_blocks_increment() {
        let mut generator = MockGenerator::new(18_000_000, Some(7));
        let now = Utc::now();

        for expected in 18_000_001..18_000_021 {
            assert_eq!(generator.next_event(now).block_number, expected);
        }
        assert_eq!(generator.current_block(), 18_000_020);
    }

    #[test]
    fn test_generator_field_ranges() {
        let mut generator = MockGenerator::new(0, Some(42));
        let now = Utc::now();
        let mut opportunities = 0;

        for _ in 0..500 {
            let event = generator.next_event(now);
            match event.kind {
                EventKind::Heartbeat => assert!(event.payload.is_none()),
                EventKind::Opportunity => {
                    opportunities += 1;
                    let data = event.payload.expect("opportunity carries data");
                    assert!((3000.0..3050.0).contains(&data.cex_price));
                    assert!((3000.0..3050.0).contains(&data.dex_price));
                    assert!((-1.0..1.0).contains(&data.spread_pct));
                    assert!((-20.0..80.0).contains(&data.estimated_profit));
                    assert!((5.0..10.0).contains(&data.gas_cost));
                    assert_eq!(data.symbol, "ETH-USDC");
                }
            }
            let latency = generator.latency_sample();
            assert!((10..60).contains(&latency));
        }

        // Roughly 70% opportunities
        assert!(opportunities > 250 && opportunities < 450, "{}", opportunities);
    }

    #[test]
    fn test_seeded_generators_agree() {
        let now = Utc::now();
        let mut a = MockGenerator::new(5, Some(99));
        let mut b = MockGenerator::new(5, Some(99));
        for _ in 0..20 {
            assert_eq!(a.next_event(now), b.next_event(now));
        }
    }

    #[tokio::test]
    async fn test_mock_source_emits_and_stops() {
        let source = Box::new(MockSource::new(MockSourceConfig {
            interval: Duration::from_millis(5),
            start_block: 100,
            seed: Some(1),
        }));
        let (tx, mut rx) = mpsc::channel(64);
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(source.run(tx, stop_rx));

        assert_eq!(rx.recv().await, Some(FeedUpdate::Connected(true)));
        match rx.recv().await {
            Some(FeedUpdate::Event(event)) => assert_eq!(event.block_number, 101),
            other => panic!("Expected event, got {:?}", other),
        }
        assert!(matches!(rx.recv().await, Some(FeedUpdate::Latency(_))));

        stop_tx.send(true).unwrap();
        drop(rx);
        let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap();
        tokio_test::assert_ok!(result.unwrap());
    }
}
