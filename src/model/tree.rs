//! Fitted decision tree

use crate::error::{AttritionError, Result};
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Leaf node with the class distribution of its training samples
    Leaf {
        value: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

impl TreeNode {
    pub fn leaf(value: Vec<f64>, n_samples: usize) -> Self {
        TreeNode::Leaf { value, n_samples }
    }

    pub fn split(feature_idx: usize, threshold: f64, left: TreeNode, right: TreeNode) -> Self {
        let n_samples = left.n_samples() + right.n_samples();
        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
            n_samples,
        }
    }

    /// Training samples that reached this node (the node's cover)
    pub fn n_samples(&self) -> usize {
        match self {
            TreeNode::Leaf { n_samples, .. } | TreeNode::Split { n_samples, .. } => *n_samples,
        }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<()> {
        if self.n_samples() == 0 {
            return Err(AttritionError::ArtifactError(
                "tree node with zero samples".to_string(),
            ));
        }

        match self {
            TreeNode::Leaf { value, .. } => {
                if value.len() != n_classes {
                    return Err(AttritionError::ArtifactError(format!(
                        "leaf has {} class values, expected {}",
                        value.len(),
                        n_classes
                    )));
                }
                if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(AttritionError::ArtifactError(
                        "leaf values must be finite and non-negative".to_string(),
                    ));
                }
                if value.iter().sum::<f64>() <= 0.0 {
                    return Err(AttritionError::ArtifactError(
                        "leaf class distribution sums to zero".to_string(),
                    ));
                }
                Ok(())
            }
            TreeNode::Split { feature_idx, threshold, left, right, n_samples } => {
                if *feature_idx >= n_features {
                    return Err(AttritionError::ArtifactError(format!(
                        "split on feature {} but the model has {} features",
                        feature_idx, n_features
                    )));
                }
                if threshold.is_nan() {
                    return Err(AttritionError::ArtifactError("split threshold is NaN".to_string()));
                }
                if left.n_samples() + right.n_samples() != *n_samples {
                    return Err(AttritionError::ArtifactError(format!(
                        "children cover {} + {} samples but parent covers {}",
                        left.n_samples(),
                        right.n_samples(),
                        n_samples
                    )));
                }
                left.validate(n_features, n_classes)?;
                right.validate(n_features, n_classes)
            }
        }
    }
}

/// Class distribution normalized to probabilities
pub(crate) fn normalized(value: &[f64]) -> Vec<f64> {
    let total: f64 = value.iter().sum();
    value.iter().map(|v| v / total).collect()
}

/// Fitted classification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: TreeNode,
}

impl DecisionTree {
    pub fn new(root: TreeNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Check the tree against the owning model's shape
    pub fn validate(&self, n_features: usize, n_classes: usize) -> Result<()> {
        self.root.validate(n_features, n_classes)
    }

    /// Class probabilities of the leaf `sample` falls into
    pub fn predict_proba_sample(&self, sample: &[f64]) -> Vec<f64> {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return normalized(value),
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if sample[*feature_idx] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    /// Cover-weighted mean of the leaf distributions
    pub fn expected_value(&self) -> Vec<f64> {
        let root_cover = self.root.n_samples() as f64;
        let mut acc: Vec<f64> = Vec::new();
        self.accumulate_expected(&self.root, root_cover, &mut acc);
        acc
    }

    fn accumulate_expected(&self, node: &TreeNode, root_cover: f64, acc: &mut Vec<f64>) {
        match node {
            TreeNode::Leaf { value, n_samples } => {
                let weight = *n_samples as f64 / root_cover;
                let proba = normalized(value);
                if acc.is_empty() {
                    acc.resize(proba.len(), 0.0);
                }
                for (a, p) in acc.iter_mut().zip(proba) {
                    *a += weight * p;
                }
            }
            TreeNode::Split { left, right, .. } => {
                self.accumulate_expected(left, root_cover, acc);
                self.accumulate_expected(right, root_cover, acc);
            }
        }
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        node_depth(&self.root)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        count_leaves(&self.root)
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
    }
}
