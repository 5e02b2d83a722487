//! Fitted standard scaler

use crate::error::{AttritionError, Result};
use serde::{Deserialize, Serialize};

/// Standard scaling (z-score normalization): (x - mean) / scale
///
/// Holds one (mean, scale) pair per input column, in the order of the owning
/// stage's column list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Create a scaler from fitted parameters
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Identity scaler for `n` columns
    pub fn identity(n: usize) -> Self {
        Self {
            mean: vec![0.0; n],
            scale: vec![1.0; n],
        }
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Check the fitted parameters are usable
    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            return Err(AttritionError::ArtifactError(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(m) = self.mean.iter().find(|m| !m.is_finite()) {
            return Err(AttritionError::ArtifactError(format!(
                "scaler mean {} is not finite",
                m
            )));
        }
        if let Some(s) = self.scale.iter().find(|s| !s.is_finite() || **s == 0.0) {
            return Err(AttritionError::ArtifactError(format!(
                "scaler scale {} must be finite and non-zero",
                s
            )));
        }
        Ok(())
    }

    /// Scale one value of column `idx`
    pub fn transform_value(&self, idx: usize, value: f64) -> f64 {
        (value - self.mean[idx]) / self.scale[idx]
    }

    /// Scale a whole column
    pub fn transform_column(&self, idx: usize, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform_value(idx, v)).collect()
    }
}
