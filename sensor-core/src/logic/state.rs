//! Latest-State Cell
//!
//! Holds the most recent scored record. The ingestion loop is the only
//! writer; HTTP handlers read. The writer swaps a whole `Arc`, so a reader
//! gets either the previous record or the new one, never a mix.

use std::sync::Arc;

use parking_lot::RwLock;

use super::features::ScoredRecord;

#[derive(Default)]
pub struct LatestState {
    current: RwLock<Option<Arc<ScoredRecord>>>,
}

impl LatestState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current record
    pub fn set(&self, record: ScoredRecord) {
        let record = Arc::new(record);
        *self.current.write() = Some(record);
    }

    pub fn get(&self) -> Option<Arc<ScoredRecord>> {
        self.current.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_none()
    }
}
