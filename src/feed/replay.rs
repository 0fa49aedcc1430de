//! Offline ingestion of recorded events (one JSON object per line)

use crate::error::Result;
use crate::store::{IngestOutcome, SharedStore};
use crate::types::Event;
use std::io::BufRead;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub appended: u64,
    pub duplicates: u64,
    /// Lines that failed to parse and were skipped
    pub malformed: u64,
}

/// Ingest every well-formed line of `reader` into `store`
pub fn replay<R: BufRead>(store: &SharedStore, reader: R) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match Event::parse(line) {
            Ok(event) => match store.ingest(event) {
                IngestOutcome::Appended => stats.appended += 1,
                IngestOutcome::Duplicate => stats.duplicates += 1,
            },
            Err(e) => {
                warn!("Skipping line {}: {}", idx + 1, e);
                stats.malformed += 1;
            }
        }
    }

    Ok(stats)
}
