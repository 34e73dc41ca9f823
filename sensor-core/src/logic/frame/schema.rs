//! Required-field configuration for the frame decoder

use serde::{Deserialize, Serialize};

use crate::logic::features::layout::{FEATURE_COUNT, FEATURE_LAYOUT};

/// Expected numeric type of a frame field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Float,
    Integer,
}

/// Field types, one per layout slot
pub const FIELD_KINDS: [FieldKind; FEATURE_COUNT] = [
    FieldKind::Float,   // Temperature
    FieldKind::Float,   // Humidity
    FieldKind::Integer, // Gas
];

/// Wire keys of the required fields, in layout order.
///
/// The default uses the layout names. A device that reports under other
/// keys gets its own schema instead of call-site string literals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSchema {
    keys: [String; FEATURE_COUNT],
}

impl FrameSchema {
    pub fn with_keys(keys: [&str; FEATURE_COUNT]) -> Self {
        Self {
            keys: keys.map(str::to_string),
        }
    }

    /// (key, kind) per layout slot
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldKind)> + '_ {
        self.keys.iter().map(String::as_str).zip(FIELD_KINDS)
    }

    pub fn key(&self, slot: usize) -> Option<&str> {
        self.keys.get(slot).map(String::as_str)
    }
}

impl Default for FrameSchema {
    fn default() -> Self {
        let mut keys: [&str; FEATURE_COUNT] = [""; FEATURE_COUNT];
        keys.copy_from_slice(FEATURE_LAYOUT);
        Self::with_keys(keys)
    }
}
