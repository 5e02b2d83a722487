//! Serialized attrition pipeline artifact

use crate::error::{AttritionError, Result};
use crate::model::RandomForestClassifier;
use crate::preprocessing::ColumnTransformer;
use super::{Classifier, PredictionPipeline, Preprocessor, POSITIVE_CLASS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Fitted column transformer followed by a random forest
///
/// The model is held behind an `Arc` so an explainer can be bound to the same
/// fitted forest without copying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttritionPipeline {
    preprocess: ColumnTransformer,
    model: Arc<RandomForestClassifier>,
}

impl AttritionPipeline {
    pub fn new(preprocess: ColumnTransformer, model: RandomForestClassifier) -> Result<Self> {
        let pipeline = Self {
            preprocess,
            model: Arc::new(model),
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Shared handle to the fitted model stage
    pub fn shared_model(&self) -> Arc<RandomForestClassifier> {
        Arc::clone(&self.model)
    }

    pub fn column_transformer(&self) -> &ColumnTransformer {
        &self.preprocess
    }

    /// Check that both stages fit together
    pub fn validate(&self) -> Result<()> {
        self.preprocess.validate()?;
        self.model.validate()?;

        if self.model.classes != [0, POSITIVE_CLASS] {
            return Err(AttritionError::ArtifactError(format!(
                "expected binary classes [0, {}], found {:?}",
                POSITIVE_CLASS, self.model.classes
            )));
        }

        let produced = self.preprocess.n_features_out();
        if produced != self.model.n_features {
            return Err(AttritionError::ArtifactError(format!(
                "preprocessor produces {} features but the model expects {}",
                produced, self.model.n_features
            )));
        }

        Ok(())
    }

    /// Save the pipeline to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a pipeline from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let pipeline: Self = serde_json::from_str(&json)?;
        pipeline.validate()?;

        info!(
            path = %path.display(),
            n_features = pipeline.model.n_features,
            n_estimators = pipeline.model.n_estimators(),
            "Loaded attrition pipeline"
        );
        Ok(pipeline)
    }
}

impl PredictionPipeline for AttritionPipeline {
    fn preprocessing_stage(&self) -> &dyn Preprocessor {
        &self.preprocess
    }

    fn model_stage(&self) -> &dyn Classifier {
        self.model.as_ref()
    }
}
