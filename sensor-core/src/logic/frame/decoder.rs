//! Frame Decoder
//!
//! `bytes → SensorRecord`. Every failure carries the raw offending line so
//! the ingestion loop can log it and move on.

use serde::Serialize;
use serde_json::{Map, Value};

use super::schema::{FieldKind, FrameSchema};
use crate::logic::features::layout::{FEATURE_COUNT, GAS, HUMIDITY, TEMPERATURE};
use crate::logic::features::SensorRecord;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// Not valid structured text (or not a keyed object)
    #[error("malformed frame ({reason}): {raw}")]
    MalformedFrame { reason: String, raw: String },

    /// Structurally valid, required key absent
    #[error("incomplete frame, missing `{field}`: {raw}")]
    IncompleteFrame { field: String, raw: String },

    /// Required key present but not numerically coercible
    #[error("type mismatch for `{field}` (got {value}): {raw}")]
    TypeMismatch {
        field: String,
        value: String,
        raw: String,
    },
}

/// Error category, used for counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorKind {
    Malformed,
    Incomplete,
    TypeMismatch,
}

impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::MalformedFrame { .. } => DecodeErrorKind::Malformed,
            Self::IncompleteFrame { .. } => DecodeErrorKind::Incomplete,
            Self::TypeMismatch { .. } => DecodeErrorKind::TypeMismatch,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            Self::MalformedFrame { raw, .. }
            | Self::IncompleteFrame { raw, .. }
            | Self::TypeMismatch { raw, .. } => raw,
        }
    }
}

// ============================================================================
// DECODER
// ============================================================================

/// Decoder bound to one required-field schema
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    schema: FrameSchema,
}

/// Decode with the default schema
pub fn decode(line: &[u8]) -> Result<SensorRecord, DecodeError> {
    FrameDecoder::default().decode(line)
}

impl FrameDecoder {
    pub fn new(schema: FrameSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FrameSchema {
        &self.schema
    }

    pub fn decode(&self, line: &[u8]) -> Result<SensorRecord, DecodeError> {
        let raw = || String::from_utf8_lossy(line).trim().to_string();

        let text = std::str::from_utf8(line).map_err(|_| DecodeError::MalformedFrame {
            reason: "not valid UTF-8".to_string(),
            raw: raw(),
        })?;
        let text = text.trim();

        let value: Value = serde_json::from_str(text).map_err(|e| DecodeError::MalformedFrame {
            reason: e.to_string(),
            raw: raw(),
        })?;

        let object = match value {
            Value::Object(map) => map,
            _ => {
                return Err(DecodeError::MalformedFrame {
                    reason: "expected a JSON object".to_string(),
                    raw: raw(),
                })
            }
        };

        // Presence first, then types: a frame missing a key is incomplete
        // even when another key also has a bad value.
        if let Some((key, _)) = self.schema.fields().find(|(key, _)| !object.contains_key(*key)) {
            return Err(DecodeError::IncompleteFrame {
                field: key.to_string(),
                raw: raw(),
            });
        }

        let slots = self.coerce_all(&object).map_err(|(field, value)| DecodeError::TypeMismatch {
            field,
            value,
            raw: raw(),
        })?;

        Ok(SensorRecord::new(
            slots[TEMPERATURE].as_f64(),
            slots[HUMIDITY].as_f64(),
            slots[GAS].as_i64(),
        ))
    }

    fn coerce_all(&self, object: &Map<String, Value>) -> Result<[Scalar; FEATURE_COUNT], (String, String)> {
        let mut slots = [Scalar::Float(0.0); FEATURE_COUNT];

        for (slot, (key, kind)) in self.schema.fields().enumerate() {
            let value = &object[key];
            slots[slot] = coerce(kind, value).ok_or_else(|| (key.to_string(), value.to_string()))?;
        }

        Ok(slots)
    }
}

// ============================================================================
// COERCION
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Scalar {
    Float(f64),
    Integer(i64),
}

impl Scalar {
    fn as_f64(self) -> f64 {
        match self {
            Scalar::Float(v) => v,
            Scalar::Integer(v) => v as f64,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Scalar::Float(v) => v as i64,
            Scalar::Integer(v) => v,
        }
    }
}

/// Numbers and numeric strings are accepted; non-finite values never are.
fn coerce(kind: FieldKind, value: &Value) -> Option<Scalar> {
    match kind {
        FieldKind::Float => coerce_float(value).map(Scalar::Float),
        FieldKind::Integer => coerce_integer(value).map(Scalar::Integer),
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else if n.as_u64().is_some() {
                // Beyond i64::MAX
                None
            } else {
                n.as_f64().and_then(integral_f64)
            }
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Accept `100.0` as 100, reject `100.5`
fn integral_f64(v: f64) -> Option<i64> {
    const LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= LIMIT {
        Some(v as i64)
    } else {
        None
    }
}
