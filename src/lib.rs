//! Attrition Explain - Employee attrition prediction with explanations
//!
//! This crate scores a single employee record against a fitted pipeline and
//! explains the prediction:
//! - Record validation and materialization as a one-row feature table
//! - Fitted preprocessing (standard scaler, one-hot encoder, column transformer)
//! - Random forest inference with calibrated class probabilities
//! - Exact TreeSHAP attribution and top-factor ranking
//! - A model service with risk levels and a CLI
//!
//! # Modules
//!
//! - [`record`] - Employee record, field domains, training column names
//! - [`preprocessing`] - Fitted column transformer and its stages
//! - [`model`] - Decision tree and random forest classifier
//! - [`pipeline`] - Stage traits and the serialized pipeline artifact
//! - [`explainability`] - TreeSHAP explainer and attribution ranker
//! - [`service`] - Prediction service, risk levels, configuration
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Inputs and fitted stages
pub mod record;
pub mod preprocessing;
pub mod model;
pub mod pipeline;

// Explanations
pub mod explainability;

// Services
pub mod service;
pub mod cli;

// Utilities
pub mod utils;

pub use error::{AttritionError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{AttritionError, Result};

    // Records
    pub use crate::record::{BinaryFlag, Department, EmployeeRecord, SalaryBand};

    // Pipeline
    pub use crate::pipeline::{AttritionPipeline, Classifier, PredictionPipeline, Preprocessor};
    pub use crate::preprocessing::{ColumnStage, ColumnTransformer, OneHotEncoder, StandardScaler, TransformerKind};
    pub use crate::model::{DecisionTree, RandomForestClassifier, TreeNode};

    // Explainability
    pub use crate::explainability::{Attribution, AttributionExplainer, AttributionRanker, FeatureImpact, ImpactDirection, TreeExplainer};

    // Service
    pub use crate::service::{AttritionService, ModelContext, PredictionLabel, PredictionResult, RiskLevel, RiskThresholds, ServiceConfig};
}
