//! Fitted one-hot encoder

use crate::error::{AttritionError, Result};
use serde::{Deserialize, Serialize};

/// What to do with a category that was not seen during fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategory {
    /// Fail with a schema error
    #[default]
    Error,
    /// Emit an all-zero block
    Ignore,
}

/// One-hot encoder with fixed, ordered categories per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Known categories for each input column, in output order
    pub categories: Vec<Vec<String>>,
    #[serde(default)]
    pub handle_unknown: UnknownCategory,
}

impl OneHotEncoder {
    pub fn new(categories: Vec<Vec<String>>) -> Self {
        Self {
            categories,
            handle_unknown: UnknownCategory::Error,
        }
    }

    pub fn with_handle_unknown(mut self, handle_unknown: UnknownCategory) -> Self {
        self.handle_unknown = handle_unknown;
        self
    }

    pub fn n_features_in(&self) -> usize {
        self.categories.len()
    }

    /// Number of indicator columns produced
    pub fn n_features_out(&self) -> usize {
        self.categories.iter().map(|c| c.len()).sum()
    }

    pub fn validate(&self) -> Result<()> {
        for cats in &self.categories {
            if cats.is_empty() {
                return Err(AttritionError::ArtifactError(
                    "one-hot encoder column has no categories".to_string(),
                ));
            }
            let mut seen = std::collections::HashSet::new();
            if let Some(dup) = cats.iter().find(|c| !seen.insert(c.as_str())) {
                return Err(AttritionError::ArtifactError(format!(
                    "duplicate category '{}' in one-hot encoder",
                    dup
                )));
            }
        }
        Ok(())
    }

    /// Encode one value of column `idx` into indicator columns
    pub fn encode_value(&self, idx: usize, column: &str, value: &str) -> Result<Vec<f64>> {
        let cats = &self.categories[idx];
        let position = cats.iter().position(|c| c == value);

        match (position, self.handle_unknown) {
            (Some(pos), _) => {
                let mut block = vec![0.0; cats.len()];
                block[pos] = 1.0;
                Ok(block)
            }
            (None, UnknownCategory::Ignore) => Ok(vec![0.0; cats.len()]),
            (None, UnknownCategory::Error) => Err(AttritionError::FeatureSchemaError(format!(
                "unknown category '{}' in column '{}'",
                value, column
            ))),
        }
    }

    /// Output names for column `idx`: `{column}_{category}`
    pub fn feature_names_out(&self, idx: usize, column: &str) -> Vec<String> {
        self.categories[idx]
            .iter()
            .map(|cat| format!("{}_{}", column, cat))
            .collect()
    }
}
