//! Service configuration

use crate::error::{AttritionError, Result};
use crate::explainability::DEFAULT_TOP_K;
use super::risk::RiskThresholds;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "experiments/attrition_pipeline.json";

/// Ranker settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankerConfig {
    /// Number of factors kept per prediction
    pub top_k: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K }
    }
}

/// Configuration for [`AttritionService`](super::AttritionService)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Serialized pipeline artifact
    pub model_path: PathBuf,
    pub risk_thresholds: RiskThresholds,
    pub ranker: RankerConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let defaults = RiskThresholds::default();
        Self {
            model_path: std::env::var("ATTRITION_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH)),
            risk_thresholds: RiskThresholds {
                medium: std::env::var("ATTRITION_RISK_MEDIUM")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.medium),
                high: std::env::var("ATTRITION_RISK_HIGH")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.high),
            },
            ranker: RankerConfig {
                top_k: std::env::var("ATTRITION_TOP_FACTORS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TOP_K),
            },
        }
    }
}

impl ServiceConfig {
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_risk_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.risk_thresholds = thresholds;
        self
    }

    pub fn with_top_factors(mut self, top_k: usize) -> Self {
        self.ranker.top_k = top_k;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.risk_thresholds.validate()?;
        if self.ranker.top_k == 0 {
            return Err(AttritionError::ConfigError(
                "top factor count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
