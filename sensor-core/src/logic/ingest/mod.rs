//! Ingest Module - the real-time pipeline driver
//!
//! - `source` - opens the frame stream
//! - `pipeline` - the read/decode/score/publish loop
//! - `stats` - counters shared with the forwarder and the status endpoint

pub mod pipeline;
pub mod source;
pub mod stats;


pub use pipeline::{IngestionLoop, LoopState, LoopSummary, ReadinessPolicy, StopReason};
pub use source::FrameSource;
pub use stats::{IngestStats, StatsSnapshot};

/// Fatal startup conditions
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("cannot open frame source {target}: {source}")]
    StreamOpen {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("downstream not ready after {attempts} attempts")]
    DownstreamNeverReady { attempts: u32 },
}
