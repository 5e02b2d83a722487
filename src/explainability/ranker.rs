//! Ranking of per-feature attributions into top contributing factors

use crate::error::{AttritionError, Result};
use crate::pipeline::POSITIVE_CLASS_INDEX;
use crate::preprocessing::STAGE_SEPARATOR;
use crate::utils::round_to;
use super::Attribution;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of factors reported when nothing else is configured
pub const DEFAULT_TOP_K: usize = 3;

/// Whether a feature pushes the prediction towards leaving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactDirection {
    IncreasesLeaveRisk,
    DecreasesLeaveRisk,
}

impl ImpactDirection {
    /// Strictly positive attribution increases risk; zero does not
    pub fn from_value(value: f64) -> Self {
        if value > 0.0 {
            ImpactDirection::IncreasesLeaveRisk
        } else {
            ImpactDirection::DecreasesLeaveRisk
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactDirection::IncreasesLeaveRisk => "increases_leave_risk",
            ImpactDirection::DecreasesLeaveRisk => "decreases_leave_risk",
        }
    }

    pub fn arrow(&self) -> char {
        match self {
            ImpactDirection::IncreasesLeaveRisk => '↑',
            ImpactDirection::DecreasesLeaveRisk => '↓',
        }
    }
}

impl fmt::Display for ImpactDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked contributing factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
    /// Feature name without the preprocessing stage prefix
    pub feature: String,
    #[serde(rename = "impact")]
    pub direction: ImpactDirection,
    /// Signed positive-class attribution, 3 decimals
    #[serde(rename = "contribution_strength")]
    pub magnitude: f64,
}

/// Feature names bound to their attribution values
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedAttributions {
    entries: Vec<(String, f64)>,
}

impl AlignedAttributions {
    /// Pair names and values by position; both must have the same length
    pub fn bind(names: &[String], values: &[f64]) -> Result<Self> {
        if names.len() != values.len() {
            return Err(AttritionError::AttributionAlignmentError {
                names: names.len(),
                values: values.len(),
            });
        }
        let entries = names.iter().cloned().zip(values.iter().copied()).collect();
        Ok(Self { entries })
    }

    /// Entries by descending absolute value; ties keep their original order
    pub fn sorted_by_magnitude(&self) -> Vec<&(String, f64)> {
        let mut sorted: Vec<&(String, f64)> = self.entries.iter().collect();
        sorted.sort_by(|a, b| {
            b.1.abs()
                .partial_cmp(&a.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }
}

/// Strip everything up to and including the last stage separator
pub fn clean_feature_name(name: &str) -> &str {
    name.rsplit(STAGE_SEPARATOR).next().unwrap_or(name)
}

/// Selects the positive-class attributions and keeps the strongest `top_k`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributionRanker {
    top_k: usize,
}

impl Default for AttributionRanker {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K }
    }
}

impl AttributionRanker {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Rank the positive-class column of `attribution`
    pub fn rank(&self, attribution: &Attribution, feature_names: &[String]) -> Result<Vec<FeatureImpact>> {
        let values = attribution
            .class_values(POSITIVE_CLASS_INDEX)
            .ok_or(AttritionError::AttributionAlignmentError {
                names: feature_names.len(),
                values: 0,
            })?;
        let aligned = AlignedAttributions::bind(feature_names, &values)?;
        Ok(self.rank_aligned(&aligned))
    }

    pub fn rank_aligned(&self, aligned: &AlignedAttributions) -> Vec<FeatureImpact> {
        aligned
            .sorted_by_magnitude()
            .into_iter()
            .take(self.top_k)
            .map(|(name, value)| FeatureImpact {
                feature: clean_feature_name(name).to_string(),
                direction: ImpactDirection::from_value(*value),
                magnitude: round_to(*value, 3),
            })
            .collect()
    }
}
