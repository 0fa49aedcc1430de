//! WebSocket feed from the arbitrage engine

use super::{forward, shutdown_requested, EventSource, FeedUpdate};
use crate::error::Result;
use crate::types::Event;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct LiveSourceConfig {
    pub url: String,
    /// Wait before reconnecting after a drop or a failed connect
    pub reconnect_delay: Duration,
}

impl Default for LiveSourceConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/ws".to_string(),
            reconnect_delay: Duration::from_secs(3),
        }
    }
}

/// Reads JSON events from a WebSocket, reconnecting forever
pub struct LiveSource {
    config: LiveSourceConfig,
}

impl LiveSource {
    pub fn new(config: LiveSourceConfig) -> Self {
        Self { config }
    }
}

/// Turn one text frame into the updates it produces: a latency sample
/// followed by the event itself.
pub fn frame_updates(raw: &str, now: DateTime<Utc>) -> Result<[FeedUpdate; 2]> {
    let event = Event::parse(raw)?;
    Ok([
        FeedUpdate::Latency(event.latency_ms(now)),
        FeedUpdate::Event(event),
    ])
}

#[async_trait]
impl EventSource for LiveSource {
    fn name(&self) -> &str {
        "live"
    }

    async fn run(
        self: Box<Self>,
        tx: mpsc::Sender<FeedUpdate>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let delay = self.config.reconnect_delay;
        info!("🔌 Connecting to feed at {}", self.config.url);

        loop {
            let connected = tokio::select! {
                _ = shutdown_requested(&mut shutdown) => return Ok(()),
                res = connect_async(self.config.url.as_str()) => res,
            };

            match connected {
                Ok((ws_stream, _)) => {
                    info!("✅ Connected to feed");
                    if !forward(&tx, FeedUpdate::Connected(true)).await {
                        return Ok(());
                    }

                    let (_, mut read) = ws_stream.split();
                    loop {
                        let msg = tokio::select! {
                            _ = shutdown_requested(&mut shutdown) => {
                                forward(&tx, FeedUpdate::Connected(false)).await;
                                return Ok(());
                            }
                            msg = read.next() => msg,
                        };

                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match frame_updates(text.as_str(), Utc::now()) {
                                    Ok(updates) => {
                                        for update in updates {
                                            if !forward(&tx, update).await {
                                                return Ok(());
                                            }
                                        }
                                    }
                                    Err(e) => warn!("Dropping frame: {}", e),
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!("Feed read error: {}", e);
                                break;
                            }
                        }
                    }

                    warn!("Feed disconnected, reconnecting in {}s...", delay.as_secs_f64());
                }
                Err(e) => {
                    warn!("Feed connection failed: {}, retrying in {}s...", e, delay.as_secs_f64());
                }
            }

            if !forward(&tx, FeedUpdate::Connected(false)).await {
                return Ok(());
            }

            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
