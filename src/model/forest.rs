//! Fitted random forest classifier

use crate::error::{AttritionError, Result};
use crate::pipeline::Classifier;
use super::tree::DecisionTree;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest whose probability is the mean of its trees' leaf distributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    /// Class labels, in probability column order
    pub classes: Vec<i64>,
    /// Number of input features
    pub n_features: usize,
    /// Individual trees
    pub trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    pub fn new(classes: Vec<i64>, n_features: usize, trees: Vec<DecisionTree>) -> Result<Self> {
        let forest = Self { classes, n_features, trees };
        forest.validate()?;
        Ok(forest)
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(AttritionError::ArtifactError("forest has no trees".to_string()));
        }
        let mut sorted = self.classes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != self.classes.len() || self.classes.is_empty() {
            return Err(AttritionError::ArtifactError(format!(
                "invalid class labels {:?}",
                self.classes
            )));
        }
        for tree in &self.trees {
            tree.validate(self.n_features, self.classes.len())?;
        }
        Ok(())
    }

    /// Mean class probabilities for one sample
    pub fn predict_proba_sample(&self, sample: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.predict_proba_sample(sample)) {
                *a += p;
            }
        }
        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|a| *a /= n);
        acc
    }

    /// Mean over trees of each tree's expected value
    pub fn expected_value(&self) -> Vec<f64> {
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (a, e) in acc.iter_mut().zip(tree.expected_value()) {
                *a += e;
            }
        }
        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|a| *a /= n);
        acc
    }

    fn check_width(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(AttritionError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }
}

impl Classifier for RandomForestClassifier {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x)?;

        let rows: Vec<Vec<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|i| self.predict_proba_sample(&x.row(i).to_vec()))
            .collect();

        let n_classes = self.classes.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((x.nrows(), n_classes), flat)?)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let proba = self.predict_proba(x)?;
        let labels = proba
            .outer_iter()
            .map(|row| {
                let mut best = 0;
                for (idx, p) in row.iter().enumerate() {
                    if *p > row[best] {
                        best = idx;
                    }
                }
                self.classes[best]
            })
            .collect();
        Ok(labels)
    }
}
