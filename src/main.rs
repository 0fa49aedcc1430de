//! CEX-DEX Arbitrage Dashboard
//!
//! Runs an event feed into the dashboard store and serves it over HTTP.

use arb_dashboard::{
    config::Config,
    feed::{replay, run_ingest, stop_source, EventSource, LiveSource, MockSource},
    monitor::{start_dashboard, DashboardApi},
    store::{LogObserver, SharedStore},
    views::HeaderStats,
};
use clap::{Parser, Subcommand};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Feed updates buffered between a source and the store
const FEED_BUFFER: usize = 256;

#[derive(Parser)]
#[command(name = "arb-dashboard")]
#[command(about = "Live dashboard for CEX-DEX arbitrage opportunities")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard against a feed
    Run {
        /// Use the synthetic feed
        #[arg(long, conflicts_with = "live")]
        mock: bool,
        /// Use the live WebSocket feed
        #[arg(long)]
        live: bool,
        /// Override the HTTP port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ingest a JSONL recording and print the resulting header stats
    Replay {
        /// File with one event per line
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run { mock, live, port } => {
            if mock {
                config.mock_mode = true;
            } else if live {
                config.mock_mode = false;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_dashboard(config).await
        }
        Commands::Replay { file } => replay_file(&file),
    }
}

async fn run_dashboard(config: Config) -> anyhow::Result<()> {
    let store = SharedStore::default();
    store.subscribe(Arc::new(LogObserver));

    if config.server.enabled {
        let api = DashboardApi::new(store.clone());
        let port = config.server.port;
        tokio::spawn(async move {
            if let Err(e) = start_dashboard(api, port).await {
                tracing::error!("Dashboard server error: {}", e);
            }
        });
    }

    let source: Box<dyn EventSource> = if config.mock_mode {
        Box::new(MockSource::new(config.mock.source_config()))
    } else {
        Box::new(LiveSource::new(config.feed.source_config()))
    };
    tracing::info!("Starting {} feed", source.name());

    let (tx, rx) = mpsc::channel(FEED_BUFFER);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ingest = tokio::spawn(run_ingest(store.clone(), rx));
    let feed = tokio::spawn(source.run(tx, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    stop_source(&shutdown_tx, feed).await?;
    let stats = ingest.await?;

    let header = store.read(HeaderStats::from_state);
    tracing::info!(
        "Final state: block {}, {} events ingested, {} duplicates, avg spread {:.3}%",
        header.last_block,
        stats.appended,
        stats.duplicates,
        header.avg_spread_pct
    );
    Ok(())
}

fn replay_file(path: &Path) -> anyhow::Result<()> {
    let store = SharedStore::default();
    let reader = BufReader::new(std::fs::File::open(path)?);
    let stats = replay(&store, reader)?;

    tracing::info!(
        "Replayed {}: {} appended, {} duplicates, {} malformed",
        path.display(),
        stats.appended,
        stats.duplicates,
        stats.malformed
    );

    let header = store.read(HeaderStats::from_state);
    println!("{}", serde_json::to_string_pretty(&header)?);
    Ok(())
}
