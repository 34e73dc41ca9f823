//! Model Module - Anomaly inference
//!
//! Artifacts are fit offline on the same FEATURE_LAYOUT used here.
//! `artifact` validates, `inference` applies.

pub mod scaler;
pub mod tree;
pub mod classifier;
pub mod artifact;
pub mod inference;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export common types
pub use artifact::{ArtifactError, ArtifactPaths, ModelArtifact, ModelInfo};
pub use classifier::{Classifier, ClassifierFamily, Decision};
pub use inference::{InferenceEngine, Scorer};
pub use scaler::{Scaler, ScalerParams};
