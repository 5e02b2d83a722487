//! Error types for the attrition prediction core

use thiserror::Error;

/// Result type alias for attrition operations
pub type Result<T> = std::result::Result<T, AttritionError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum AttritionError {
    /// The pipeline or explainer failed to load at startup
    #[error("Service unavailable: prediction pipeline is not loaded")]
    ServiceUnavailable,

    /// The feature table does not match what the pipeline was fitted on
    #[error("Feature schema error: {0}")]
    FeatureSchemaError(String),

    /// Attribution values and feature names are not index-aligned
    #[error("Attribution alignment error: {names} feature names vs {values} attribution values")]
    AttributionAlignmentError { names: usize, values: usize },

    #[error("Invalid record: {field} = {value}, {reason}")]
    InvalidRecord {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Artifact error: {0}")]
    ArtifactError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },
}

impl AttritionError {
    /// Whether the failure was caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AttritionError::FeatureSchemaError(_) | AttritionError::InvalidRecord { .. }
        )
    }
}

impl From<polars::error::PolarsError> for AttritionError {
    fn from(err: polars::error::PolarsError) -> Self {
        AttritionError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for AttritionError {
    fn from(err: serde_json::Error) -> Self {
        AttritionError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AttritionError {
    fn from(err: ndarray::ShapeError) -> Self {
        AttritionError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
