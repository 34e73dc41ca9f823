//! Features Module - Feature schema and record types
//!
//! `layout` is the single definition of feature order; `record` holds the
//! values that flow through the pipeline.

pub mod layout;
pub mod record;

// Re-export common types
pub use layout::{layout_hash, LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use record::{ScoredRecord, SensorRecord, TIMESTAMP_FORMAT};
