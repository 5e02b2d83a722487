//! Model explainability module
//!
//! Provides per-prediction feature attribution:
//! - Exact path-dependent TreeSHAP for the random forest
//! - Ranking of attributions into the top contributing factors

mod tree_shap;
mod ranker;

pub use tree_shap::TreeExplainer;
pub use ranker::{
    clean_feature_name, AlignedAttributions, AttributionRanker, FeatureImpact, ImpactDirection,
    DEFAULT_TOP_K,
};

use crate::error::Result;
use ndarray::{Array2, Axis};

/// Per-feature, per-class attribution for one row
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    /// Shape `[n_features, n_classes]`
    pub values: Array2<f64>,
    /// Expected model output per class
    pub base_values: Vec<f64>,
}

impl Attribution {
    pub fn n_features(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_classes(&self) -> usize {
        self.values.ncols()
    }

    /// Attribution of every feature towards class column `class_idx`
    pub fn class_values(&self, class_idx: usize) -> Option<Vec<f64>> {
        if class_idx >= self.n_classes() {
            return None;
        }
        Some(self.values.column(class_idx).to_vec())
    }

    /// Base value plus all contributions: the model output being explained
    pub fn reconstructed_output(&self) -> Vec<f64> {
        self.values
            .sum_axis(Axis(0))
            .iter()
            .zip(&self.base_values)
            .map(|(sum, base)| sum + base)
            .collect()
    }
}

/// Explains model outputs for already-transformed feature rows
pub trait AttributionExplainer: Send + Sync {
    /// One attribution per row of `x`
    fn explain(&self, x: &Array2<f64>) -> Result<Vec<Attribution>>;
}
