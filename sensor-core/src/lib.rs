//! Sensor Core - real-time ingestion and scoring pipeline
//!
//! ```text
//! device ─▶ frame ─▶ model ─┬─▶ state   (latest reading)
//!                           ├─▶ history (deduplicating CSV log)
//!                           └─▶ forward (best-effort push)
//! ```
//!
//! Everything the control plane reads is reachable through
//! [`logic::context::PipelineContext`].

pub mod constants;
pub mod logic;

pub use logic::context::PipelineContext;
pub use logic::features::{ScoredRecord, SensorRecord, FEATURE_COUNT, FEATURE_LAYOUT};
