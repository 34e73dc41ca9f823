//! Decision trees in flat array encoding
//!
//! Node `i` is a leaf when `children_left[i] == TREE_LEAF`. Internal nodes
//! send `x[feature[i]] <= threshold[i]` to the left child. Children always
//! have a larger index than their parent, which is what exporters emit and
//! what guarantees traversal terminates.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::logic::features::layout::FEATURE_COUNT;

pub const TREE_LEAF: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,

    /// Per-node outputs: class counts/fractions, or a single leaf margin
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<Vec<f64>>,

    /// Training samples per node (isolation trees)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub n_node_samples: Vec<u64>,
}

/// Where a sample ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    pub node: usize,
    pub depth: usize,
}

impl DecisionTree {
    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == TREE_LEAF
    }

    /// Leaf node indices
    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.node_count()).filter(move |&n| self.is_leaf(n))
    }

    /// Structural checks; traversal after this never panics or loops.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_right.len() != n || self.feature.len() != n || self.threshold.len() != n {
            return Err(format!(
                "node arrays differ in length (left {}, right {}, feature {}, threshold {})",
                n,
                self.children_right.len(),
                self.feature.len(),
                self.threshold.len()
            ));
        }

        for node in 0..n {
            let left = self.children_left[node];
            let right = self.children_right[node];

            if left == TREE_LEAF {
                if right != TREE_LEAF {
                    return Err(format!("node {} has only a right child", node));
                }
                continue;
            }

            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {} has invalid child {}", node, child));
                }
            }

            let feature = self.feature[node];
            if feature < 0 || feature >= FEATURE_COUNT as i64 {
                return Err(format!("node {} splits on unknown feature {}", node, feature));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {} has non-finite threshold", node));
            }
        }

        Ok(())
    }

    /// Leaf values must exist with `width` finite entries
    pub fn validate_values(&self, width: usize) -> Result<(), String> {
        if self.value.len() != self.node_count() {
            return Err(format!(
                "value has {} rows for {} nodes",
                self.value.len(),
                self.node_count()
            ));
        }
        for leaf in self.leaves() {
            let row = &self.value[leaf];
            if row.len() != width {
                return Err(format!("leaf {} has {} values, expected {}", leaf, row.len(), width));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(format!("leaf {} has non-finite values", leaf));
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf
    pub fn apply(&self, x: &ArrayView1<f64>) -> Leaf {
        let mut node = 0usize;
        let mut depth = 0usize;

        while !self.is_leaf(node) {
            let feature = self.feature[node] as usize;
            node = if x[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
            depth += 1;
        }

        Leaf { node, depth }
    }
}
