//! Scaler - fixed per-feature affine transform
//!
//! Parameters are fit offline; here they are only applied.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::logic::features::layout::{feature_name, FEATURE_COUNT};

/// Serialized scaler parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerParams {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `(x - min) / (max - min)`
    MinMax { min: Vec<f64>, max: Vec<f64> },
}

impl ScalerParams {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Standard { .. } => "standard",
            Self::MinMax { .. } => "min_max",
        }
    }
}

/// Validated scaler: `(x - offset) / divisor`
#[derive(Debug, Clone)]
pub struct Scaler {
    kind: &'static str,
    offset: Array1<f64>,
    divisor: Array1<f64>,
}

impl Scaler {
    pub fn from_params(params: &ScalerParams) -> Result<Self, String> {
        let (offset, divisor) = match params {
            ScalerParams::Standard { mean, scale } => {
                check_len("mean", mean)?;
                check_len("scale", scale)?;
                for (i, s) in scale.iter().enumerate() {
                    if *s == 0.0 {
                        return Err(format!("scale for {} is zero", name(i)));
                    }
                }
                (mean.clone(), scale.clone())
            }
            ScalerParams::MinMax { min, max } => {
                check_len("min", min)?;
                check_len("max", max)?;
                let mut range = Vec::with_capacity(FEATURE_COUNT);
                for i in 0..FEATURE_COUNT {
                    if max[i] < min[i] {
                        return Err(format!("max < min for {}", name(i)));
                    }
                    range.push((max[i] - min[i]).max(1e-8));
                }
                (min.clone(), range)
            }
        };

        Ok(Self {
            kind: params.kind(),
            offset: Array1::from(offset),
            divisor: Array1::from(divisor),
        })
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Raw feature values (layout order) to model space
    pub fn transform(&self, raw: &[f64; FEATURE_COUNT]) -> Array1<f64> {
        (Array1::from(raw.to_vec()) - &self.offset) / &self.divisor
    }
}

fn name(index: usize) -> &'static str {
    feature_name(index).unwrap_or("?")
}

fn check_len(field: &str, values: &[f64]) -> Result<(), String> {
    if values.len() != FEATURE_COUNT {
        return Err(format!(
            "`{}` has {} values, expected {}",
            field,
            values.len(),
            FEATURE_COUNT
        ));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(format!("`{}` for {} is not finite", field, name(i)));
    }
    Ok(())
}
