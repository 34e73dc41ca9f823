//! Model artifacts - the (scaler, classifier) pair produced offline
//!
//! Both files are JSON documents that declare the feature names they were
//! fit on. Everything is validated here so that a bad artifact stops the
//! process at startup instead of failing on a live reading.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::classifier::{Classifier, ClassifierFamily};
use super::scaler::{Scaler, ScalerParams};
use crate::logic::features::layout::{validate_names, LayoutInfo, LayoutMismatchError};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("cannot read {what} artifact {path}: {source}")]
    Io {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} artifact is not valid: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{what} artifact was fit on a different feature layout: {source}")]
    Layout {
        what: &'static str,
        #[source]
        source: LayoutMismatchError,
    },

    #[error("{what} artifact checksum mismatch: expected {expected}, got {actual}")]
    Checksum {
        what: &'static str,
        expected: String,
        actual: String,
    },

    #[error("invalid {what} artifact: {reason}")]
    Invalid { what: &'static str, reason: String },
}

const SCALER: &str = "scaler";
const MODEL: &str = "classifier";

// ============================================================================
// FILE FORMATS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerFile {
    pub feature_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hash: Option<u32>,
    #[serde(flatten)]
    pub params: ScalerParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierFile {
    pub feature_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hash: Option<u32>,
    #[serde(flatten)]
    pub classifier: Classifier,
}

// ============================================================================
// LOADED ARTIFACT
// ============================================================================

/// Where to find the artifacts, plus optional pinned checksums
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub scaler: PathBuf,
    pub model: PathBuf,
    pub scaler_sha256: Option<String>,
    pub model_sha256: Option<String>,
}

impl ArtifactPaths {
    pub fn new(scaler: impl Into<PathBuf>, model: impl Into<PathBuf>) -> Self {
        Self {
            scaler: scaler.into(),
            model: model.into(),
            scaler_sha256: None,
            model_sha256: None,
        }
    }
}

/// Metadata about the loaded pair
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub classifier_kind: &'static str,
    pub family: ClassifierFamily,
    pub trees: usize,
    pub scaler_kind: &'static str,
    pub scaler_sha256: String,
    pub model_sha256: String,
    pub loaded_at: DateTime<Utc>,
    pub layout: LayoutInfo,
}

/// Validated (scaler, classifier) pair
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub(crate) scaler: Scaler,
    pub(crate) classifier: Classifier,
    pub(crate) info: ModelInfo,
}

impl ModelArtifact {
    /// Load both files, fail fast on anything unusable
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        log::info!(
            "Loading model artifacts: scaler={} classifier={}",
            paths.scaler.display(),
            paths.model.display()
        );

        let scaler_bytes = read(SCALER, &paths.scaler)?;
        let model_bytes = read(MODEL, &paths.model)?;

        verify_checksum(SCALER, &scaler_bytes, paths.scaler_sha256.as_deref())?;
        verify_checksum(MODEL, &model_bytes, paths.model_sha256.as_deref())?;

        Self::from_slices(&scaler_bytes, &model_bytes)
    }

    /// Parse and validate from in-memory documents
    pub fn from_slices(scaler_bytes: &[u8], model_bytes: &[u8]) -> Result<Self, ArtifactError> {
        let scaler_file: ScalerFile = serde_json::from_slice(scaler_bytes)
            .map_err(|source| ArtifactError::Parse { what: SCALER, source })?;
        let model_file: ClassifierFile = serde_json::from_slice(model_bytes)
            .map_err(|source| ArtifactError::Parse { what: MODEL, source })?;

        validate_names(&scaler_file.feature_names, scaler_file.layout_hash)
            .map_err(|source| ArtifactError::Layout { what: SCALER, source })?;
        validate_names(&model_file.feature_names, model_file.layout_hash)
            .map_err(|source| ArtifactError::Layout { what: MODEL, source })?;

        let scaler = Scaler::from_params(&scaler_file.params)
            .map_err(|reason| ArtifactError::Invalid { what: SCALER, reason })?;

        let classifier = model_file.classifier;
        classifier
            .validate()
            .map_err(|reason| ArtifactError::Invalid { what: MODEL, reason })?;

        let info = ModelInfo {
            classifier_kind: classifier.kind(),
            family: classifier.family(),
            trees: classifier.tree_count(),
            scaler_kind: scaler.kind(),
            scaler_sha256: sha256_hex(scaler_bytes),
            model_sha256: sha256_hex(model_bytes),
            loaded_at: Utc::now(),
            layout: LayoutInfo::current(),
        };

        log::info!(
            "Model artifacts loaded: {} ({} trees), scaler {} [sha256 {}..]",
            info.classifier_kind,
            info.trees,
            info.scaler_kind,
            &info.model_sha256[..12]
        );

        Ok(Self { scaler, classifier, info })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

fn read(what: &'static str, path: &Path) -> Result<Vec<u8>, ArtifactError> {
    std::fs::read(path).map_err(|source| ArtifactError::Io {
        what,
        path: path.to_path_buf(),
        source,
    })
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn verify_checksum(what: &'static str, bytes: &[u8], expected: Option<&str>) -> Result<(), ArtifactError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let actual = sha256_hex(bytes);
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(ArtifactError::Checksum {
            what,
            expected: expected.trim().to_string(),
            actual,
        });
    }
    Ok(())
}
