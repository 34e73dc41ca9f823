//! Pipeline context
//!
//! The process-wide resources, built once in `main` and handed to the
//! ingestion loop and the HTTP handlers. The inference engine is not here:
//! it moves into the ingestion loop and nothing else touches it.

use std::sync::Arc;

use super::history::AppendLog;
use super::ingest::IngestStats;
use super::state::LatestState;

#[derive(Clone)]
pub struct PipelineContext {
    pub latest: Arc<LatestState>,
    pub log: Arc<AppendLog>,
    pub stats: Arc<IngestStats>,
}

impl PipelineContext {
    pub fn new(log: AppendLog) -> Self {
        Self {
            latest: Arc::new(LatestState::new()),
            log: Arc::new(log),
            stats: Arc::new(IngestStats::new()),
        }
    }
}
