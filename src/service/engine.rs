//! Prediction and explanation service

use crate::error::{AttritionError, Result};
use crate::explainability::{AttributionExplainer, AttributionRanker, TreeExplainer};
use crate::pipeline::{AttritionPipeline, PredictionPipeline, POSITIVE_CLASS_INDEX};
use crate::record::EmployeeRecord;
use crate::utils::round_to;
use super::config::ServiceConfig;
use super::result::{PredictionLabel, PredictionResult};
use super::risk::RiskThresholds;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Fitted pipeline and the explainer bound to its model stage
pub struct ModelContext {
    pipeline: Box<dyn PredictionPipeline>,
    explainer: Box<dyn AttributionExplainer>,
}

impl ModelContext {
    pub fn new(pipeline: Box<dyn PredictionPipeline>, explainer: Box<dyn AttributionExplainer>) -> Self {
        Self { pipeline, explainer }
    }

    /// Bind a TreeSHAP explainer to the pipeline's forest
    pub fn from_pipeline(pipeline: AttritionPipeline) -> Self {
        let explainer = TreeExplainer::new(pipeline.shared_model());
        Self::new(Box::new(pipeline), Box::new(explainer))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_pipeline(AttritionPipeline::load(path)?))
    }

    pub fn pipeline(&self) -> &dyn PredictionPipeline {
        self.pipeline.as_ref()
    }

    pub fn explainer(&self) -> &dyn AttributionExplainer {
        self.explainer.as_ref()
    }
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("n_features", &self.pipeline.model_stage().n_features())
            .field("classes", &self.pipeline.model_stage().classes())
            .finish()
    }
}

/// Predicts attrition for one employee and explains the prediction
///
/// Built once at startup. When the artifact fails to load the service is still
/// constructed, but every request fails with `ServiceUnavailable`.
#[derive(Debug)]
pub struct AttritionService {
    context: Option<Arc<ModelContext>>,
    thresholds: RiskThresholds,
    ranker: AttributionRanker,
}

impl AttritionService {
    /// Load the artifact named by `config`, degrading on load failure
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let service = match ModelContext::load(&config.model_path) {
            Ok(context) => {
                info!(path = %config.model_path.display(), "Attrition service ready");
                Self::with_context(context)
            }
            Err(e) => {
                error!(
                    path = %config.model_path.display(),
                    error = %e,
                    "Failed to load attrition pipeline, serving in degraded mode"
                );
                Self::unavailable()
            }
        };

        Ok(service
            .with_thresholds(config.risk_thresholds)
            .with_ranker(AttributionRanker::new(config.ranker.top_k)))
    }

    pub fn with_context(context: ModelContext) -> Self {
        Self {
            context: Some(Arc::new(context)),
            thresholds: RiskThresholds::default(),
            ranker: AttributionRanker::default(),
        }
    }

    /// A service whose dependencies never loaded
    pub fn unavailable() -> Self {
        Self {
            context: None,
            thresholds: RiskThresholds::default(),
            ranker: AttributionRanker::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_ranker(mut self, ranker: AttributionRanker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.context.is_some()
    }

    /// Predict, score risk and rank the top contributing factors
    pub fn predict_and_explain(&self, record: &EmployeeRecord) -> Result<PredictionResult> {
        let context = self.context.as_ref().ok_or(AttritionError::ServiceUnavailable)?;
        let pipeline = context.pipeline();

        let frame = record.to_frame()?;
        let x = pipeline.preprocessing_stage().transform(&frame)?;
        debug!(n_features = x.ncols(), "Transformed record");

        let model = pipeline.model_stage();
        let labels = model.predict(&x)?;
        let proba = model.predict_proba(&x)?;
        if labels.len() != 1 || proba.nrows() != 1 || proba.ncols() <= POSITIVE_CLASS_INDEX {
            return Err(AttritionError::InferenceError(format!(
                "expected one label and one probability row with at least {} classes, got {} labels and {:?} probabilities",
                POSITIVE_CLASS_INDEX + 1,
                labels.len(),
                proba.shape()
            )));
        }

        let label = labels[0];
        let stay_probability = proba[[0, 0]];
        let leave_probability = proba[[0, POSITIVE_CLASS_INDEX]];
        debug!(label, stay_probability, leave_probability, "Model output");

        let attributions = context.explainer().explain(&x)?;
        let attribution = attributions.first().ok_or_else(|| {
            AttritionError::InferenceError("explainer returned no attribution rows".to_string())
        })?;
        debug!(base_values = ?attribution.base_values, "Computed attributions");

        let top_factors = self.ranker.rank(attribution, &pipeline.feature_names())?;

        Ok(PredictionResult {
            prediction: PredictionLabel::from_class(label),
            attrition_probability: round_to(stay_probability, 2),
            leave_probability: round_to(leave_probability, 2),
            risk_level: self.thresholds.classify(leave_probability),
            top_factors,
        })
    }

    /// [`predict_and_explain`](Self::predict_and_explain) on the blocking pool
    pub async fn predict_and_explain_async(
        self: Arc<Self>,
        record: EmployeeRecord,
    ) -> Result<PredictionResult> {
        tokio::task::spawn_blocking(move || self.predict_and_explain(&record))
            .await
            .map_err(|e| AttritionError::InferenceError(format!("prediction task failed: {}", e)))?
    }
}
