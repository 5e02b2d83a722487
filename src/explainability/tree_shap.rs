//! Exact path-dependent TreeSHAP
//!
//! Walks each tree once per sample, tracking the set of unique features on the
//! current root-to-node path together with the fraction of "zero" (feature
//! absent, follow covers) and "one" (feature present, follow the sample) paths
//! that flow through it. At each leaf the path weights give every feature's
//! Shapley contribution to that leaf's class distribution.

use crate::error::{AttritionError, Result};
use crate::model::{normalized, DecisionTree, RandomForestClassifier, TreeNode};
use super::{Attribution, AttributionExplainer};
use ndarray::Array2;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// None for the root sentinel
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

/// TreeSHAP explainer bound to a fitted forest
#[derive(Debug, Clone)]
pub struct TreeExplainer {
    model: Arc<RandomForestClassifier>,
    expected_value: Vec<f64>,
}

impl TreeExplainer {
    pub fn new(model: Arc<RandomForestClassifier>) -> Self {
        let expected_value = model.expected_value();
        debug!(?expected_value, n_trees = model.n_estimators(), "Built tree explainer");
        Self { model, expected_value }
    }

    /// Expected forest output per class over the training covers
    pub fn expected_value(&self) -> &[f64] {
        &self.expected_value
    }

    /// Attribution for one transformed sample
    pub fn explain_sample(&self, sample: &[f64]) -> Result<Attribution> {
        let n_features = self.model.n_features;
        let n_classes = self.model.classes.len();
        if sample.len() != n_features {
            return Err(AttritionError::ShapeError {
                expected: format!("{} features", n_features),
                actual: format!("{} features", sample.len()),
            });
        }

        // Per-tree values are computed in parallel but summed in tree order
        let per_tree: Vec<Array2<f64>> = self
            .model
            .trees
            .par_iter()
            .map(|tree| tree_shap(tree, sample, n_features, n_classes))
            .collect();

        let mut values = Array2::<f64>::zeros((n_features, n_classes));
        for phi in &per_tree {
            values += phi;
        }
        values /= self.model.n_estimators() as f64;

        Ok(Attribution {
            values,
            base_values: self.expected_value.clone(),
        })
    }
}

impl AttributionExplainer for TreeExplainer {
    fn explain(&self, x: &Array2<f64>) -> Result<Vec<Attribution>> {
        x.outer_iter()
            .map(|row| self.explain_sample(&row.to_vec()))
            .collect()
    }
}

/// SHAP values of a single tree, shape `[n_features, n_classes]`
fn tree_shap(tree: &DecisionTree, sample: &[f64], n_features: usize, n_classes: usize) -> Array2<f64> {
    let mut phi = Array2::<f64>::zeros((n_features, n_classes));
    recurse(tree.root(), sample, &mut phi, &[], 1.0, 1.0, None);
    phi
}

fn recurse(
    node: &TreeNode,
    sample: &[f64],
    phi: &mut Array2<f64>,
    parent_path: &[PathElement],
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let mut path = parent_path.to_vec();
    extend_path(&mut path, zero_fraction, one_fraction, feature);

    match node {
        TreeNode::Leaf { value, .. } => {
            let proba = normalized(value);
            let unique_depth = path.len() - 1;
            for i in 1..=unique_depth {
                let element = path[i];
                let Some(f) = element.feature else { continue };
                let scale = unwound_path_sum(&path, i)
                    * (element.one_fraction - element.zero_fraction);
                for (c, p) in proba.iter().enumerate() {
                    phi[[f, c]] += scale * p;
                }
            }
        }
        TreeNode::Split { feature_idx, threshold, left, right, n_samples } => {
            let (hot, cold) = if sample[*feature_idx] <= *threshold {
                (&**left, &**right)
            } else {
                (&**right, &**left)
            };

            // A feature seen higher up the path is folded into this split
            let mut incoming_zero = 1.0;
            let mut incoming_one = 1.0;
            if let Some(k) = (1..path.len()).find(|&k| path[k].feature == Some(*feature_idx)) {
                incoming_zero = path[k].zero_fraction;
                incoming_one = path[k].one_fraction;
                unwind_path(&mut path, k);
            }

            let cover = *n_samples as f64;
            recurse(
                hot,
                sample,
                phi,
                &path,
                incoming_zero * hot.n_samples() as f64 / cover,
                incoming_one,
                Some(*feature_idx),
            );
            recurse(
                cold,
                sample,
                phi,
                &path,
                incoming_zero * cold.n_samples() as f64 / cover,
                0.0,
                Some(*feature_idx),
            );
        }
    }
}

fn extend_path(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });

    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / denom;
    }
}

fn unwind_path(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * denom / ((i + 1) as f64 * one);
            next_one_portion = tmp - path[i].weight * zero * (depth - i) as f64 / denom;
        } else {
            path[i].weight = path[i].weight * denom / (zero * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

fn unwound_path_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let mut next_one_portion = path[depth].weight;
    let mut total = 0.0;

    if one != 0.0 {
        for i in (0..depth).rev() {
            let tmp = next_one_portion / ((i + 1) as f64 * one);
            total += tmp;
            next_one_portion = path[i].weight - tmp * zero * (depth - i) as f64;
        }
    } else {
        for i in (0..depth).rev() {
            total += path[i].weight / (zero * (depth - i) as f64);
        }
    }

    total * (depth + 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Classifier;
    use ndarray::array;

    const EPS: f64 = 1e-12;

    fn stump_forest() -> Arc<RandomForestClassifier> {
        let tree = DecisionTree::new(TreeNode::split(
            0,
            0.5,
            TreeNode::leaf(vec![2.0, 0.0], 2),
            TreeNode::leaf(vec![0.0, 2.0], 2),
        ));
        Arc::new(RandomForestClassifier::new(vec![0, 1], 2, vec![tree]).unwrap())
    }

    /// Depth-3 tree that splits on feature 0 twice along one path
    fn deep_forest() -> Arc<RandomForestClassifier> {
        let a = DecisionTree::new(TreeNode::split(
            0,
            0.3,
            TreeNode::split(
                1,
                1.0,
                TreeNode::leaf(vec![5.0, 1.0], 6),
                TreeNode::leaf(vec![1.0, 3.0], 4),
            ),
            TreeNode::split(
                0,
                0.8,
                TreeNode::split(
                    2,
                    0.0,
                    TreeNode::leaf(vec![2.0, 1.0], 3),
                    TreeNode::leaf(vec![0.0, 2.0], 2),
                ),
                TreeNode::leaf(vec![1.0, 4.0], 5),
            ),
        ));
        let b = DecisionTree::new(TreeNode::split(
            2,
            0.5,
            TreeNode::leaf(vec![3.0, 3.0], 6),
            TreeNode::split(
                1,
                0.0,
                TreeNode::leaf(vec![4.0, 0.0], 4),
                TreeNode::leaf(vec![1.0, 9.0], 10),
            ),
        ));
        Arc::new(RandomForestClassifier::new(vec![0, 1], 3, vec![a, b]).unwrap())
    }

    #[test]
    fn test_stump_values() {
        let explainer = TreeExplainer::new(stump_forest());
        let attribution = explainer.explain_sample(&[1.0, 0.0]).unwrap();

        assert!((attribution.values[[0, 0]] + 0.5).abs() < EPS);
        assert!((attribution.values[[0, 1]] - 0.5).abs() < EPS);
        // Feature 1 is never used by the tree
        assert_eq!(attribution.values[[1, 0]], 0.0);
        assert_eq!(attribution.values[[1, 1]], 0.0);
        assert_eq!(attribution.base_values, vec![0.5, 0.5]);
    }

    #[test]
    fn test_local_accuracy() {
        let model = deep_forest();
        let explainer = TreeExplainer::new(Arc::clone(&model));
        let samples = array![[0.1, 2.0, -1.0], [0.5, -3.0, 1.0], [0.9, 0.5, 0.7], [0.3, 1.0, 0.0]];

        let proba = model.predict_proba(&samples).unwrap();
        let attributions = explainer.explain(&samples).unwrap();
        assert_eq!(attributions.len(), 4);

        for (row, attribution) in attributions.iter().enumerate() {
            let output = attribution.reconstructed_output();
            for class in 0..2 {
                assert!(
                    (output[class] - proba[[row, class]]).abs() < 1e-9,
                    "row {} class {}: {} vs {}",
                    row,
                    class,
                    output[class],
                    proba[[row, class]]
                );
            }
        }
    }

    #[test]
    fn test_binary_classes_are_negations() {
        let explainer = TreeExplainer::new(deep_forest());
        let attribution = explainer.explain_sample(&[0.5, -3.0, 1.0]).unwrap();
        for f in 0..3 {
            assert!((attribution.values[[f, 0]] + attribution.values[[f, 1]]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_deterministic() {
        let explainer = TreeExplainer::new(deep_forest());
        let first = explainer.explain_sample(&[0.9, 0.5, 0.7]).unwrap();
        let second = explainer.explain_sample(&[0.9, 0.5, 0.7]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_wrong_width() {
        let explainer = TreeExplainer::new(deep_forest());
        assert!(matches!(
            explainer.explain_sample(&[0.1]),
            Err(AttritionError::ShapeError { .. })
        ));
    }
}
