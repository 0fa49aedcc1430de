//! Store handle shared between the ingest task and readers

use super::{DashboardState, DashboardStore, IngestOutcome, StateObserver};
use crate::types::Event;
use parking_lot::RwLock;
use std::sync::Arc;

/// Cloneable handle. Each mutation holds the write lock from start to
/// notification, so readers only ever see fully applied updates.
#[derive(Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<DashboardStore>>,
}

impl SharedStore {
    pub fn new(store: DashboardStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn subscribe(&self, observer: Arc<dyn StateObserver>) {
        self.inner.write().subscribe(observer);
    }

    pub fn set_connected(&self, status: bool) {
        self.inner.write().set_connected(status);
    }

    pub fn update_latency(&self, ms: i64) {
        self.inner.write().update_latency(ms);
    }

    pub fn update_block(&self, block: u64) {
        self.inner.write().update_block(block);
    }

    pub fn ingest(&self, event: Event) -> IngestOutcome {
        self.inner.write().ingest(event)
    }

    pub fn snapshot(&self) -> DashboardState {
        self.inner.read().snapshot()
    }

    /// Run `f` against the current state without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        f(self.inner.read().state())
    }
}
