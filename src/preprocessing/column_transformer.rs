//! Fitted column transformer
//!
//! Routes named input columns through named stages (scaler, one-hot encoder or
//! passthrough) and concatenates the results into one dense feature matrix.
//! Output feature names carry the stage name as a `{stage}__` prefix.

use crate::error::{AttritionError, Result};
use crate::pipeline::Preprocessor;
use super::{OneHotEncoder, StandardScaler};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Separator between stage name and column name in output feature names
pub const STAGE_SEPARATOR: &str = "__";

/// Fitted transformation applied by one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformerKind {
    StandardScaler(StandardScaler),
    OneHotEncoder(OneHotEncoder),
    Passthrough,
}

/// One named stage and the input columns it consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStage {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(flatten)]
    pub kind: TransformerKind,
}

impl ColumnStage {
    pub fn new(name: impl Into<String>, columns: &[&str], kind: TransformerKind) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            kind,
        }
    }

    fn is_numeric(&self) -> bool {
        !matches!(self.kind, TransformerKind::OneHotEncoder(_))
    }

    fn n_features_out(&self) -> usize {
        match &self.kind {
            TransformerKind::OneHotEncoder(encoder) => encoder.n_features_out(),
            _ => self.columns.len(),
        }
    }

    fn feature_names_out(&self) -> Vec<String> {
        let local: Vec<String> = match &self.kind {
            TransformerKind::OneHotEncoder(encoder) => self
                .columns
                .iter()
                .enumerate()
                .flat_map(|(idx, col)| encoder.feature_names_out(idx, col))
                .collect(),
            _ => self.columns.clone(),
        };
        local
            .into_iter()
            .map(|name| format!("{}{}{}", self.name, STAGE_SEPARATOR, name))
            .collect()
    }

    /// Transform this stage's columns into output columns (column-major)
    fn transform(&self, frame: &DataFrame) -> Result<Vec<Vec<f64>>> {
        let n_rows = frame.height();
        let mut out: Vec<Vec<f64>> = Vec::with_capacity(self.n_features_out());

        for (idx, col_name) in self.columns.iter().enumerate() {
            match &self.kind {
                TransformerKind::StandardScaler(scaler) => {
                    let values = numeric_values(frame, col_name)?;
                    out.push(scaler.transform_column(idx, &values));
                }
                TransformerKind::Passthrough => {
                    out.push(numeric_values(frame, col_name)?);
                }
                TransformerKind::OneHotEncoder(encoder) => {
                    let values = string_values(frame, col_name)?;
                    let width = encoder.categories[idx].len();
                    let mut block = vec![Vec::with_capacity(n_rows); width];
                    for value in &values {
                        let encoded = encoder.encode_value(idx, col_name, value)?;
                        for (slot, v) in block.iter_mut().zip(encoded) {
                            slot.push(v);
                        }
                    }
                    out.extend(block);
                }
            }
        }

        Ok(out)
    }
}

/// Column transformer with verbose (stage-prefixed) output names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    /// Input columns, in the order they were seen at fit time
    pub feature_names_in: Vec<String>,
    pub transformers: Vec<ColumnStage>,
}

impl ColumnTransformer {
    pub fn new(feature_names_in: &[&str], transformers: Vec<ColumnStage>) -> Result<Self> {
        let transformer = Self {
            feature_names_in: feature_names_in.iter().map(|c| c.to_string()).collect(),
            transformers,
        };
        transformer.validate()?;
        Ok(transformer)
    }

    /// Structural checks on the fitted parameters
    pub fn validate(&self) -> Result<()> {
        let known: HashSet<&str> = self.feature_names_in.iter().map(|s| s.as_str()).collect();
        if known.len() != self.feature_names_in.len() {
            return Err(AttritionError::ArtifactError(
                "duplicate input column in preprocessor".to_string(),
            ));
        }

        let mut consumed: HashSet<&str> = HashSet::new();
        for stage in &self.transformers {
            for col in &stage.columns {
                if !known.contains(col.as_str()) {
                    return Err(AttritionError::ArtifactError(format!(
                        "stage '{}' consumes unknown column '{}'",
                        stage.name, col
                    )));
                }
                if !consumed.insert(col.as_str()) {
                    return Err(AttritionError::ArtifactError(format!(
                        "column '{}' is consumed by more than one stage",
                        col
                    )));
                }
            }

            let fitted_width = match &stage.kind {
                TransformerKind::StandardScaler(scaler) => {
                    scaler.validate()?;
                    Some(scaler.n_features())
                }
                TransformerKind::OneHotEncoder(encoder) => {
                    encoder.validate()?;
                    Some(encoder.n_features_in())
                }
                TransformerKind::Passthrough => None,
            };
            if let Some(width) = fitted_width {
                if width != stage.columns.len() {
                    return Err(AttritionError::ArtifactError(format!(
                        "stage '{}' was fitted on {} columns but lists {}",
                        stage.name,
                        width,
                        stage.columns.len()
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn n_features_out(&self) -> usize {
        self.transformers.iter().map(|s| s.n_features_out()).sum()
    }

    /// The frame must carry exactly the fitted input columns
    fn check_schema(&self, frame: &DataFrame) -> Result<()> {
        let present: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();

        for expected in &self.feature_names_in {
            if !present.contains(expected) {
                return Err(AttritionError::FeatureSchemaError(format!(
                    "missing column '{}'",
                    expected
                )));
            }
        }
        for name in &present {
            if !self.feature_names_in.contains(name) {
                return Err(AttritionError::FeatureSchemaError(format!(
                    "unexpected column '{}'",
                    name
                )));
            }
        }

        Ok(())
    }
}

impl Preprocessor for ColumnTransformer {
    fn transform(&self, frame: &DataFrame) -> Result<Array2<f64>> {
        self.check_schema(frame)?;

        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(self.n_features_out());
        for stage in &self.transformers {
            columns.extend(stage.transform(frame)?);
        }

        let n_rows = frame.height();
        Ok(Array2::from_shape_fn((n_rows, columns.len()), |(r, c)| columns[c][r]))
    }

    fn feature_names_out(&self) -> Vec<String> {
        self.transformers
            .iter()
            .flat_map(|s| s.feature_names_out())
            .collect()
    }
}

/// Read a numeric column as f64 values; integer columns are widened
fn numeric_values(frame: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = frame
        .column(name)
        .map_err(|_| AttritionError::FeatureSchemaError(format!("missing column '{}'", name)))?;

    let casted = match column.dtype() {
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
        DataType::Float32 | DataType::Float64 => column.cast(&DataType::Float64)?,
        other => {
            return Err(AttritionError::FeatureSchemaError(format!(
                "column '{}' must be numeric, found {}",
                name, other
            )))
        }
    };

    let ca = casted.f64()?;
    ca.into_iter()
        .map(|v| {
            v.ok_or_else(|| {
                AttritionError::FeatureSchemaError(format!("null value in column '{}'", name))
            })
        })
        .collect()
}

/// Read a categorical column as owned strings
fn string_values(frame: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = frame
        .column(name)
        .map_err(|_| AttritionError::FeatureSchemaError(format!("missing column '{}'", name)))?;

    let ca = column.str().map_err(|_| {
        AttritionError::FeatureSchemaError(format!(
            "column '{}' must be a string column, found {}",
            name,
            column.dtype()
        ))
    })?;

    ca.into_iter()
        .map(|v| {
            v.map(|s| s.to_string()).ok_or_else(|| {
                AttritionError::FeatureSchemaError(format!("null value in column '{}'", name))
            })
        })
        .collect()
}
