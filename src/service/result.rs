//! Prediction response types

use crate::explainability::FeatureImpact;
use crate::pipeline::POSITIVE_CLASS;
use super::risk::RiskLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionLabel {
    Leave,
    Stay,
}

impl PredictionLabel {
    /// The positive class is "Leave"; any other label is "Stay"
    pub fn from_class(label: i64) -> Self {
        if label == POSITIVE_CLASS {
            PredictionLabel::Leave
        } else {
            PredictionLabel::Stay
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionLabel::Leave => "Leave",
            PredictionLabel::Stay => "Stay",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prediction with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: PredictionLabel,
    /// Probability of class 0, 2 decimals
    pub attrition_probability: f64,
    /// Probability of class 1 ("will leave"), 2 decimals
    pub leave_probability: f64,
    pub risk_level: RiskLevel,
    pub top_factors: Vec<FeatureImpact>,
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} (leave probability {:.0}%, risk {})",
            self.prediction,
            self.leave_probability * 100.0,
            self.risk_level
        )?;
        for factor in &self.top_factors {
            writeln!(
                f,
                "  {} {} ({:.3})",
                factor.direction.arrow(),
                factor.feature,
                factor.magnitude
            )?;
        }
        Ok(())
    }
}
