//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema shared by artifact fitting and inference.**
//!
//! ## Rules:
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Scaler and classifier artifacts declare the feature names they were fit
//! on; loading rejects anything that differs from [`FEATURE_LAYOUT`].

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector.
/// Also the wire keys of inbound frames and the CSV column names.
pub const FEATURE_LAYOUT: &[&str] = &[
    "Temperature", // 0: degrees Celsius
    "Humidity",    // 1: relative humidity percent
    "Gas",         // 2: raw gas sensor reading (integer ADC value)
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 3;

/// Index of each feature in the vector
pub const TEMPERATURE: usize = 0;
pub const HUMIDITY: usize = 1;
pub const GAS: usize = 2;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
/// Used to detect layout mismatches at artifact load time
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Get layout hash
pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when an artifact was fit on a different feature layout
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutMismatchError {
    #[error("feature names {actual:?} do not match layout {expected:?}")]
    Names {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("layout hash mismatch: expected {expected:08x}, got {actual:08x}")]
    Hash { expected: u32, actual: u32 },
}

/// Validate the feature names (and optional hash) an artifact declares
pub fn validate_names(names: &[String], hash: Option<u32>) -> Result<(), LayoutMismatchError> {
    let matches = names.len() == FEATURE_COUNT
        && names.iter().zip(FEATURE_LAYOUT).all(|(a, b)| a == b);

    if !matches {
        return Err(LayoutMismatchError::Names {
            expected: LayoutInfo::current().feature_names,
            actual: names.to_vec(),
        });
    }

    if let Some(actual) = hash {
        let expected = layout_hash();
        if actual != expected {
            return Err(LayoutMismatchError::Hash { expected, actual });
        }
    }

    Ok(())
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

// ============================================================================
// TESTS
// ============================================================================
