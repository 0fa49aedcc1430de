//! Configuration
//!
//! Loaded from an optional TOML file, then overridden by `ARB_*` environment
//! variables (nested keys use `__`, e.g. `ARB_FEED__WS_URL`).

use crate::error::{DashboardError, Result};
use crate::feed::{LiveSourceConfig, MockSourceConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Use the synthetic feed instead of the live WebSocket
    #[serde(default = "default_true")]
    pub mock_mode: bool,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub mock: MockConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mock_mode: true,
            feed: FeedConfig::default(),
            mock: MockConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

impl FeedConfig {
    pub fn source_config(&self) -> LiveSourceConfig {
        LiveSourceConfig {
            url: self.ws_url.clone(),
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    #[serde(default = "default_mock_interval")]
    pub interval_ms: u64,
    #[serde(default = "default_start_block")]
    pub start_block: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_mock_interval(),
            start_block: default_start_block(),
            seed: None,
        }
    }
}

impl MockConfig {
    pub fn source_config(&self) -> MockSourceConfig {
        MockSourceConfig {
            interval: Duration::from_millis(self.interval_ms),
            start_block: self.start_block,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_port(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ws_url() -> String {
    "ws://localhost:8080/ws".to_string()
}

fn default_reconnect_delay() -> u64 {
    3
}

fn default_mock_interval() -> u64 {
    2000
}

fn default_start_block() -> u64 {
    18_000_000
}

fn default_port() -> u16 {
    3001
}

impl Config {
    /// Load from `path` (missing file is fine) and the environment
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = PathBuf::from(shellexpand::tilde(path).into_owned());
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix("ARB")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mock.interval_ms == 0 {
            return Err(DashboardError::Config("mock.interval_ms must be > 0".into()));
        }
        if self.feed.reconnect_delay_secs == 0 {
            return Err(DashboardError::Config(
                "feed.reconnect_delay_secs must be > 0".into(),
            ));
        }
        if self.feed.ws_url.is_empty() {
            return Err(DashboardError::Config("feed.ws_url must not be empty".into()));
        }
        Ok(())
    }
}
