//! Inference Engine - scaler + classifier over one reading
//!
//! Owns the model artifact exclusively. Scoring takes `&self` only, so one
//! record can never influence the outcome of another.

use chrono::{Local, NaiveDateTime};

use super::artifact::{ArtifactError, ArtifactPaths, ModelArtifact, ModelInfo};
use crate::logic::features::{ScoredRecord, SensorRecord};

/// Anything that turns a reading into a decision
pub trait Scorer: Send {
    fn score(&self, record: &SensorRecord) -> ScoredRecord;
}

pub struct InferenceEngine {
    artifact: ModelArtifact,
}

impl InferenceEngine {
    /// Wrap a validated artifact and run the startup check
    pub fn new(artifact: ModelArtifact) -> Result<Self, ArtifactError> {
        let engine = Self { artifact };
        engine.self_check()?;
        Ok(engine)
    }

    /// Load from files (fatal on error)
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        Self::new(ModelArtifact::load(paths)?)
    }

    pub fn info(&self) -> &ModelInfo {
        self.artifact.info()
    }

    /// Score with an explicit timestamp
    pub fn score_at(&self, record: &SensorRecord, timestamp: NaiveDateTime) -> ScoredRecord {
        let scaled = self.artifact.scaler.transform(&record.features());
        let decision = self.artifact.classifier.decide(&scaled.view());

        ScoredRecord {
            reading: *record,
            anomaly: decision.anomaly,
            score: decision.score,
            timestamp,
        }
    }

    /// A classifier fault must show up now, not on the first live reading
    fn self_check(&self) -> Result<(), ArtifactError> {
        let origin = SensorRecord::new(0.0, 0.0, 0);
        let scaled = self.artifact.scaler.transform(&origin.features());
        if scaled.iter().any(|v| !v.is_finite()) {
            return Err(ArtifactError::Invalid {
                what: "scaler",
                reason: "self-check transform produced non-finite values".to_string(),
            });
        }

        let decision = self.artifact.classifier.decide(&scaled.view());
        if decision.score.is_some_and(|s| !s.is_finite()) {
            return Err(ArtifactError::Invalid {
                what: "classifier",
                reason: "self-check produced a non-finite score".to_string(),
            });
        }

        log::debug!("Model self-check ok: label {} score {:?}", decision.label, decision.score);
        Ok(())
    }
}

impl Scorer for InferenceEngine {
    fn score(&self, record: &SensorRecord) -> ScoredRecord {
        self.score_at(record, Local::now().naive_local())
    }
}
