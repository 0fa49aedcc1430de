//! Error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed event: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feed task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<::config::ConfigError> for DashboardError {
    fn from(e: ::config::ConfigError) -> Self {
        DashboardError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
