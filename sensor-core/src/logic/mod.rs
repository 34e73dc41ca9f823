//! Logic Module - Pipeline stages
//!
//! Leaf-first:
//! - `features/` - Feature layout and record types
//! - `frame/` - Line decoder
//! - `model/` - Scaler + classifier inference
//! - `history/` - Deduplicating CSV append log
//! - `state` - Latest-state cell
//! - `forward/` - Best-effort downstream push
//! - `ingest/` - Read → decode → score → publish loop
//! - `context` - Shared handles for the control plane

pub mod features;
pub mod frame;
pub mod model;
pub mod history;
pub mod state;
pub mod forward;
pub mod ingest;
pub mod context;
