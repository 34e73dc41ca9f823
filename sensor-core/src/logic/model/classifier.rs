//! Classifier families
//!
//! Supervised models report P(anomaly); outlier detectors report a decision
//! value where lower means more anomalous. Both produce a binary flag.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::tree::DecisionTree;
use crate::logic::features::layout::FEATURE_COUNT;

/// Raw label an outlier detector emits for outliers
pub const OUTLIER_LABEL: i64 = -1;
/// Raw label an outlier detector emits for inliers
pub const INLIER_LABEL: i64 = 1;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierFamily {
    /// Exposes a positive-class probability
    Supervised,
    /// Exposes a decision value and an outlier sentinel
    OutlierDetector,
}

/// Serialized classifier parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    /// Averaged per-tree class distributions
    RandomForest {
        classes: Vec<i64>,
        #[serde(default = "default_anomaly_class")]
        anomaly_class: i64,
        trees: Vec<DecisionTree>,
    },
    /// Boosted trees with a logistic link; leaf values are margins
    GradientBoosting {
        #[serde(default)]
        base_margin: f64,
        trees: Vec<DecisionTree>,
    },
    LogisticRegression {
        coef: Vec<f64>,
        intercept: f64,
    },
    /// Isolation trees with per-node sample counts
    IsolationForest {
        max_samples: u64,
        #[serde(default = "default_offset")]
        offset: f64,
        trees: Vec<DecisionTree>,
    },
}

fn default_anomaly_class() -> i64 {
    1
}

/// Offset used when the detector was fit without a contamination estimate
fn default_offset() -> f64 {
    -0.5
}

/// Classifier output for one feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub label: i64,
    pub anomaly: bool,
    pub score: Option<f64>,
}

impl Classifier {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RandomForest { .. } => "random_forest",
            Self::GradientBoosting { .. } => "gradient_boosting",
            Self::LogisticRegression { .. } => "logistic_regression",
            Self::IsolationForest { .. } => "isolation_forest",
        }
    }

    pub fn family(&self) -> ClassifierFamily {
        match self {
            Self::IsolationForest { .. } => ClassifierFamily::OutlierDetector,
            _ => ClassifierFamily::Supervised,
        }
    }

    pub fn tree_count(&self) -> usize {
        match self {
            Self::RandomForest { trees, .. }
            | Self::GradientBoosting { trees, .. }
            | Self::IsolationForest { trees, .. } => trees.len(),
            Self::LogisticRegression { .. } => 0,
        }
    }

    /// Everything `decide` relies on
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::RandomForest { classes, anomaly_class, trees } => {
                if classes.len() < 2 {
                    return Err("random_forest needs at least two classes".to_string());
                }
                if !classes.contains(anomaly_class) {
                    return Err(format!("anomaly class {} not in classes {:?}", anomaly_class, classes));
                }
                validate_trees(trees, |tree| {
                    tree.validate_values(classes.len())?;
                    for leaf in tree.leaves() {
                        let row = &tree.value[leaf];
                        if row.iter().any(|v| *v < 0.0) || row.iter().sum::<f64>() <= 0.0 {
                            return Err(format!("leaf {} has no class mass", leaf));
                        }
                    }
                    Ok(())
                })
            }
            Self::GradientBoosting { base_margin, trees } => {
                if !base_margin.is_finite() {
                    return Err("base_margin is not finite".to_string());
                }
                validate_trees(trees, |tree| tree.validate_values(1))
            }
            Self::LogisticRegression { coef, intercept } => {
                if coef.len() != FEATURE_COUNT {
                    return Err(format!("coef has {} values, expected {}", coef.len(), FEATURE_COUNT));
                }
                if !intercept.is_finite() || coef.iter().any(|c| !c.is_finite()) {
                    return Err("coefficients must be finite".to_string());
                }
                Ok(())
            }
            Self::IsolationForest { max_samples, offset, trees } => {
                if *max_samples < 2 {
                    return Err("max_samples must be at least 2".to_string());
                }
                if !offset.is_finite() {
                    return Err("offset is not finite".to_string());
                }
                validate_trees(trees, |tree| {
                    if tree.n_node_samples.len() != tree.node_count() {
                        return Err("n_node_samples missing or wrong length".to_string());
                    }
                    Ok(())
                })
            }
        }
    }

    /// Classify one scaled feature vector
    pub fn decide(&self, x: &ArrayView1<f64>) -> Decision {
        match self {
            Self::RandomForest { classes, anomaly_class, trees } => {
                let mut proba = vec![0.0; classes.len()];
                for tree in trees {
                    let row = &tree.value[tree.apply(x).node];
                    let total: f64 = row.iter().sum();
                    for (p, v) in proba.iter_mut().zip(row) {
                        *p += v / total;
                    }
                }
                for p in proba.iter_mut() {
                    *p /= trees.len() as f64;
                }

                // First maximum wins ties
                let mut best = 0;
                for (i, p) in proba.iter().enumerate() {
                    if *p > proba[best] {
                        best = i;
                    }
                }
                let label = classes[best];
                let anomaly_idx = classes.iter().position(|c| c == anomaly_class).unwrap_or(0);

                Decision {
                    label,
                    anomaly: label == *anomaly_class,
                    score: Some(proba[anomaly_idx]),
                }
            }
            Self::GradientBoosting { base_margin, trees } => {
                let margin = trees
                    .iter()
                    .map(|tree| tree.value[tree.apply(x).node][0])
                    .sum::<f64>()
                    + base_margin;
                binary(sigmoid(margin))
            }
            Self::LogisticRegression { coef, intercept } => {
                let z = coef.iter().zip(x.iter()).map(|(c, v)| c * v).sum::<f64>() + intercept;
                binary(sigmoid(z))
            }
            Self::IsolationForest { max_samples, offset, trees } => {
                let total_path: f64 = trees
                    .iter()
                    .map(|tree| {
                        let leaf = tree.apply(x);
                        leaf.depth as f64 + average_path_length(tree.n_node_samples[leaf.node])
                    })
                    .sum();
                let mean_path = total_path / trees.len() as f64;
                let score_samples = -(2f64).powf(-mean_path / average_path_length(*max_samples));
                let decision = score_samples - offset;
                let label = if decision < 0.0 { OUTLIER_LABEL } else { INLIER_LABEL };

                Decision {
                    label,
                    anomaly: label == OUTLIER_LABEL,
                    score: Some(decision),
                }
            }
        }
    }
}

fn validate_trees<F>(trees: &[DecisionTree], leaf_check: F) -> Result<(), String>
where
    F: Fn(&DecisionTree) -> Result<(), String>,
{
    if trees.is_empty() {
        return Err("ensemble has no trees".to_string());
    }
    for (i, tree) in trees.iter().enumerate() {
        tree.validate()
            .and_then(|_| leaf_check(tree))
            .map_err(|e| format!("tree {}: {}", i, e))?;
    }
    Ok(())
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Label 1 (anomaly) when p > 0.5
fn binary(p: f64) -> Decision {
    let label = i64::from(p > 0.5);
    Decision {
        label,
        anomaly: label == 1,
        score: Some(p),
    }
}

/// Average path length of an unsuccessful BST search over `n` samples
pub fn average_path_length(n: u64) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}
