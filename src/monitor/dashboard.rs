//! Real-time dashboard API
//!
//! HTTP endpoints serving read-only views of the store, plus a WebSocket
//! that pushes every state change to connected browsers.

use crate::store::{DashboardState, SharedStore, StateChange, StateObserver};
use crate::types::{ChartPoint, Event};
use crate::views::{feed_rows, FeedRow, HeaderStats};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Rows included in `/summary`
const SUMMARY_ROWS: usize = 10;
/// Pending pushes per client before it starts skipping
const UPDATE_BUFFER: usize = 256;

/// Message pushed over `/ws`. The first message after connecting has no change.
#[derive(Serialize)]
struct StateUpdate<'a> {
    change: Option<StateChange>,
    state: &'a DashboardState,
}

fn encode_update(change: Option<StateChange>, state: &DashboardState) -> Option<String> {
    serde_json::to_string(&StateUpdate { change, state }).ok()
}

/// Fans store changes out to WebSocket clients
struct BroadcastObserver {
    tx: broadcast::Sender<String>,
}

impl StateObserver for BroadcastObserver {
    fn on_change(&self, change: &StateChange, state: &DashboardState) {
        // No receivers is fine; nobody is watching yet
        if self.tx.receiver_count() > 0 {
            if let Some(json) = encode_update(Some(*change), state) {
                let _ = self.tx.send(json);
            }
        }
    }
}

/// Shared across handlers
pub struct DashboardApi {
    store: SharedStore,
    updates: broadcast::Sender<String>,
}

impl DashboardApi {
    /// Wire the API to a store, registering the push observer
    pub fn new(store: SharedStore) -> Arc<Self> {
        let (tx, _) = broadcast::channel(UPDATE_BUFFER);
        store.subscribe(Arc::new(BroadcastObserver { tx: tx.clone() }));
        Arc::new(Self { store, updates: tx })
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}

/// Header stats plus the newest feed rows
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub header: HeaderStats,
    pub recent: Vec<FeedRow>,
}

// ============ HTTP API Handlers ============

async fn health_check() -> &'static str {
    "OK"
}

async fn get_state(State(api): State<Arc<DashboardApi>>) -> Json<DashboardState> {
    Json(api.store.snapshot())
}

async fn get_events(State(api): State<Arc<DashboardApi>>) -> Json<Vec<Event>> {
    Json(api.store.read(|s| s.events.iter().cloned().collect()))
}

async fn get_chart(State(api): State<Arc<DashboardApi>>) -> Json<Vec<ChartPoint>> {
    Json(api.store.read(|s| s.chart_data.iter().copied().collect()))
}

async fn get_summary(State(api): State<Arc<DashboardApi>>) -> Json<DashboardSummary> {
    Json(api.store.read(|s| DashboardSummary {
        header: HeaderStats::from_state(s),
        recent: feed_rows(s, SUMMARY_ROWS),
    }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(api): State<Arc<DashboardApi>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_updates(socket, api))
}

async fn stream_updates(socket: WebSocket, api: Arc<DashboardApi>) {
    let (mut sender, mut receiver) = socket.split();
    // Subscribe before the snapshot so nothing falls between them
    let mut updates = api.updates.subscribe();

    let initial = api.store.read(|s| encode_update(None, s));
    if let Some(json) = initial {
        if sender.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }
    debug!("Dashboard client connected");

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Dashboard client lagging, skipped {} updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("Dashboard client disconnected");
}

/// Create dashboard router
pub fn create_router(api: Arc<DashboardApi>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/state", get(get_state))
        .route("/events", get(get_events))
        .route("/chart", get(get_chart))
        .route("/summary", get(get_summary))
        .route("/ws", get(ws_handler))
        .with_state(api)
}

/// Serve the dashboard on an already bound listener
pub async fn serve_dashboard(listener: TcpListener, api: Arc<DashboardApi>) -> std::io::Result<()> {
    axum::serve(listener, create_router(api)).await
}

/// Start dashboard server
pub async fn start_dashboard(api: Arc<DashboardApi>, port: u16) -> std::io::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Dashboard server starting on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    serve_dashboard(listener, api).await
}
