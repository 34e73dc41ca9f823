//! Artifact documents shared by tests across the crate

use super::{InferenceEngine, ModelArtifact};

/// Standard scaler centred on a mild indoor reading
pub(crate) const SCALER_JSON: &str = r#"{
    "kind": "standard",
    "feature_names": ["Temperature", "Humidity", "Gas"],
    "mean": [30.0, 40.0, 200.0],
    "scale": [5.0, 20.0, 100.0]
}"#;

/// Hot, dry and gassy pushes the logit up.
/// (25, 60, 100) scores z = -5, (40, 20, 350) scores z = +5.
pub(crate) const LOGISTIC_JSON: &str = r#"{
    "kind": "logistic_regression",
    "feature_names": ["Temperature", "Humidity", "Gas"],
    "coef": [1.0, -1.0, 2.0],
    "intercept": -1.0
}"#;

/// One isolation tree: readings with scaled gas above 1.0 are isolated immediately
pub(crate) const ISOLATION_JSON: &str = r#"{
    "kind": "isolation_forest",
    "feature_names": ["Temperature", "Humidity", "Gas"],
    "max_samples": 256,
    "offset": -0.5,
    "trees": [{
        "children_left": [1, -1, -1],
        "children_right": [2, -1, -1],
        "feature": [2, -2, -2],
        "threshold": [1.0, -2.0, -2.0],
        "n_node_samples": [256, 255, 1]
    }]
}"#;

pub(crate) fn logistic_engine() -> InferenceEngine {
    let artifact = ModelArtifact::from_slices(SCALER_JSON.as_bytes(), LOGISTIC_JSON.as_bytes())
        .expect("fixture artifacts are valid");
    InferenceEngine::new(artifact).expect("fixture self-check passes")
}

pub(crate) fn isolation_engine() -> InferenceEngine {
    let artifact = ModelArtifact::from_slices(SCALER_JSON.as_bytes(), ISOLATION_JSON.as_bytes())
        .expect("fixture artifacts are valid");
    InferenceEngine::new(artifact).expect("fixture self-check passes")
}
