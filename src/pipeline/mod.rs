//! Prediction pipeline contracts
//!
//! A pipeline is a preprocessing stage followed by a classifier. Both stages are
//! reached through named accessors so callers never look stages up by string.

mod artifact;

pub use artifact::AttritionPipeline;

use crate::error::Result;
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;

/// Label of the "will leave" class
pub const POSITIVE_CLASS: i64 = 1;

/// Column of the positive class in probability and attribution outputs
pub const POSITIVE_CLASS_INDEX: usize = 1;

/// Preprocessing stage: feature table in, dense numeric matrix out
pub trait Preprocessor: Send + Sync {
    /// Transform a feature table into the matrix the model consumes
    fn transform(&self, frame: &DataFrame) -> Result<Array2<f64>>;

    /// Output feature names, index-aligned with the columns of `transform`
    fn feature_names_out(&self) -> Vec<String>;
}

/// Model stage: a fitted classifier over transformed features
pub trait Classifier: Send + Sync {
    /// Class labels in probability column order
    fn classes(&self) -> &[i64];

    fn n_features(&self) -> usize;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>>;

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;
}

/// Composite pipeline with named stages
pub trait PredictionPipeline: Send + Sync {
    fn preprocessing_stage(&self) -> &dyn Preprocessor;

    fn model_stage(&self) -> &dyn Classifier;

    /// Predicted labels for every row of `frame`
    fn predict(&self, frame: &DataFrame) -> Result<Array1<i64>> {
        let x = self.preprocessing_stage().transform(frame)?;
        self.model_stage().predict(&x)
    }

    /// Class probabilities for every row of `frame`
    fn predict_proba(&self, frame: &DataFrame) -> Result<Array2<f64>> {
        let x = self.preprocessing_stage().transform(frame)?;
        self.model_stage().predict_proba(&x)
    }

    fn feature_names(&self) -> Vec<String> {
        self.preprocessing_stage().feature_names_out()
    }
}
