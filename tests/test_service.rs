//! Integration test: record → pipeline → explainer → ranked prediction
//! Tests: scenario record, response invariants, degraded service, injected stages

mod common;

use attrition_explain::error::AttritionError;
use attrition_explain::explainability::{
    Attribution, AttributionExplainer, ImpactDirection, TreeExplainer,
};
use attrition_explain::model::RandomForestClassifier;
use attrition_explain::pipeline::{
    AttritionPipeline, Classifier, PredictionPipeline, Preprocessor,
};
use attrition_explain::preprocessing::{
    ColumnStage, ColumnTransformer, OneHotEncoder, TransformerKind,
};
use attrition_explain::service::{
    AttritionService, ModelContext, PredictionLabel, RiskLevel, ServiceConfig,
};
use common::*;
use ndarray::{Array1, Array2};
use std::sync::Arc;

fn fixture_service() -> AttritionService {
    AttritionService::with_context(ModelContext::from_pipeline(fixture_pipeline()))
}

// ============================================================================
// Bundled artifact
// ============================================================================

#[test]
fn test_bundled_artifact_matches_fixture() {
    let loaded = AttritionPipeline::load(bundled_artifact()).unwrap();
    let fixture = fixture_pipeline();
    assert_eq!(loaded.column_transformer(), fixture.column_transformer());
    assert_eq!(*loaded.shared_model(), *fixture.shared_model());
    assert_eq!(loaded.feature_names().len(), 20);
}

#[test]
fn test_scenario_record_from_bundled_artifact() {
    let config = ServiceConfig::default().with_model_path(bundled_artifact());
    let service = AttritionService::from_config(&config).unwrap();
    assert!(service.is_ready());

    let result = service.predict_and_explain(&leaving_record()).unwrap();
    assert_eq!(result.prediction, PredictionLabel::Leave);
    assert!(result.leave_probability >= 0.7);
    assert_eq!(result.risk_level, RiskLevel::High);
    assert!(result
        .top_factors
        .iter()
        .any(|f| f.feature == "number_project" || f.feature == "average_montly_hours"));
}

// ============================================================================
// Prediction and explanation
// ============================================================================

#[test]
fn test_leaving_employee_factors() {
    let result = fixture_service().predict_and_explain(&leaving_record()).unwrap();

    assert_eq!(result.leave_probability, 0.98);
    assert_eq!(result.attrition_probability, 0.02);

    let features: Vec<&str> = result.top_factors.iter().map(|f| f.feature.as_str()).collect();
    assert_eq!(features, vec!["satisfaction_level", "number_project", "average_montly_hours"]);
    assert!(result
        .top_factors
        .iter()
        .all(|f| f.direction == ImpactDirection::IncreasesLeaveRisk));
    assert_eq!(result.top_factors[0].magnitude, 0.299);
    assert_eq!(result.top_factors[1].magnitude, 0.282);
    assert_eq!(result.top_factors[2].magnitude, 0.136);
}

#[test]
fn test_staying_employee() {
    let result = fixture_service().predict_and_explain(&staying_record()).unwrap();

    assert_eq!(result.prediction, PredictionLabel::Stay);
    assert_eq!(result.leave_probability, 0.09);
    assert_eq!(result.risk_level, RiskLevel::Low);
    assert_eq!(result.top_factors[0].feature, "satisfaction_level");
    assert!(result
        .top_factors
        .iter()
        .all(|f| f.direction == ImpactDirection::DecreasesLeaveRisk));
    assert!(result.top_factors[0].magnitude < 0.0);
}

#[test]
fn test_response_invariants() {
    let service = fixture_service();
    for record in [leaving_record(), staying_record()] {
        let result = service.predict_and_explain(&record).unwrap();

        let total = result.attrition_probability + result.leave_probability;
        assert!((total - 1.0).abs() <= 0.01 + 1e-9, "probabilities sum to {}", total);
        assert!(result.top_factors.len() <= 3);
        for pair in result.top_factors.windows(2) {
            assert!(pair[0].magnitude.abs() >= pair[1].magnitude.abs());
        }
        for factor in &result.top_factors {
            assert!(!factor.feature.contains("__"));
        }
    }
}

#[test]
fn test_idempotent() {
    let service = fixture_service();
    let first = service.predict_and_explain(&leaving_record()).unwrap();
    let second = service.predict_and_explain(&leaving_record()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_configured_top_factors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");
    fixture_pipeline().save(&path).unwrap();

    let config = ServiceConfig::default().with_model_path(&path).with_top_factors(5);
    let service = AttritionService::from_config(&config).unwrap();
    let result = service.predict_and_explain(&leaving_record()).unwrap();
    assert_eq!(result.top_factors.len(), 5);
    assert_eq!(result.top_factors[3].feature, "time_spend_company");
    assert_eq!(result.top_factors[3].direction, ImpactDirection::DecreasesLeaveRisk);
}

#[test]
fn test_local_accuracy_on_fixture() {
    let pipeline = fixture_pipeline();
    let explainer = TreeExplainer::new(pipeline.shared_model());

    for record in [leaving_record(), staying_record()] {
        let x = pipeline
            .preprocessing_stage()
            .transform(&record.to_frame().unwrap())
            .unwrap();
        let proba = pipeline.model_stage().predict_proba(&x).unwrap();
        let attributions = explainer.explain(&x).unwrap();
        let output = attributions[0].reconstructed_output();
        for class in 0..2 {
            assert!((output[class] - proba[[0, class]]).abs() < 1e-9);
        }
    }
}

#[tokio::test]
async fn test_async_matches_sync() {
    let service = Arc::new(fixture_service());
    let sync_result = service.predict_and_explain(&leaving_record()).unwrap();
    let async_result = Arc::clone(&service)
        .predict_and_explain_async(leaving_record())
        .await
        .unwrap();
    assert_eq!(sync_result, async_result);
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_uninitialized_service() {
    let service = AttritionService::unavailable();
    for record in [leaving_record(), staying_record()] {
        assert!(matches!(
            service.predict_and_explain(&record),
            Err(AttritionError::ServiceUnavailable)
        ));
    }
}

#[tokio::test]
async fn test_uninitialized_service_async() {
    let service = Arc::new(AttritionService::unavailable());
    let result = service.predict_and_explain_async(leaving_record()).await;
    assert!(matches!(result, Err(AttritionError::ServiceUnavailable)));
}

#[test]
fn test_unknown_category_is_schema_error() {
    let departments: Vec<String> = DEPARTMENTS
        .iter()
        .filter(|d| **d != "sales")
        .map(|d| d.to_string())
        .collect();
    let salaries: Vec<String> = SALARIES.iter().map(|s| s.to_string()).collect();

    let mut preprocess = fixture_preprocessor();
    preprocess.transformers[1] = ColumnStage::new(
        "cat",
        &["Departments ", "salary"],
        TransformerKind::OneHotEncoder(OneHotEncoder::new(vec![departments, salaries])),
    );
    let model = RandomForestClassifier::new(vec![0, 1], 19, fixture_forest().trees).unwrap();
    let pipeline = AttritionPipeline::new(preprocess, model).unwrap();
    let service = AttritionService::with_context(ModelContext::from_pipeline(pipeline));

    let err = service.predict_and_explain(&leaving_record()).unwrap_err();
    assert!(matches!(err, AttritionError::FeatureSchemaError(_)));
    assert!(err.is_client_error());
}

// ============================================================================
// Injected stages
// ============================================================================

/// Classifier whose label disagrees with a 0.5 probability threshold
struct FixedClassifier {
    classes: Vec<i64>,
    label: i64,
    proba: [f64; 2],
}

impl Classifier for FixedClassifier {
    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        20
    }

    fn predict(&self, x: &Array2<f64>) -> attrition_explain::Result<Array1<i64>> {
        Ok(Array1::from_elem(x.nrows(), self.label))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> attrition_explain::Result<Array2<f64>> {
        Ok(Array2::from_shape_fn((x.nrows(), 2), |(_, c)| self.proba[c]))
    }
}

struct InjectedPipeline {
    preprocess: ColumnTransformer,
    model: FixedClassifier,
}

impl PredictionPipeline for InjectedPipeline {
    fn preprocessing_stage(&self) -> &dyn Preprocessor {
        &self.preprocess
    }

    fn model_stage(&self) -> &dyn Classifier {
        &self.model
    }
}

/// Explainer that attributes `i * 0.01` to feature `i`
struct RampExplainer {
    n_features: usize,
}

impl AttributionExplainer for RampExplainer {
    fn explain(&self, x: &Array2<f64>) -> attrition_explain::Result<Vec<Attribution>> {
        Ok((0..x.nrows())
            .map(|_| Attribution {
                values: Array2::from_shape_fn((self.n_features, 2), |(f, c)| {
                    let v = f as f64 * 0.01;
                    if c == 1 { v } else { -v }
                }),
                base_values: vec![0.5, 0.5],
            })
            .collect())
    }
}

/// Explainer that returns the given positive-class values
struct FixedExplainer {
    positive: Vec<f64>,
}

impl AttributionExplainer for FixedExplainer {
    fn explain(&self, x: &Array2<f64>) -> attrition_explain::Result<Vec<Attribution>> {
        Ok((0..x.nrows())
            .map(|_| Attribution {
                values: Array2::from_shape_fn((self.positive.len(), 2), |(f, c)| {
                    if c == 1 { self.positive[f] } else { -self.positive[f] }
                }),
                base_values: vec![0.5, 0.5],
            })
            .collect())
    }
}

fn injected_pipeline(label: i64, proba: [f64; 2]) -> InjectedPipeline {
    InjectedPipeline {
        preprocess: fixture_preprocessor(),
        model: FixedClassifier {
            classes: vec![0, 1],
            label,
            proba,
        },
    }
}

fn injected_service(label: i64, proba: [f64; 2], explained_features: usize) -> AttritionService {
    let pipeline = injected_pipeline(label, proba);
    let explainer = RampExplainer {
        n_features: explained_features,
    };
    AttritionService::with_context(ModelContext::new(Box::new(pipeline), Box::new(explainer)))
}

#[test]
fn test_prediction_follows_model_not_threshold() {
    let service = injected_service(1, [0.6, 0.4], 20);
    let result = service.predict_and_explain(&staying_record()).unwrap();

    assert_eq!(result.prediction, PredictionLabel::Leave);
    assert_eq!(result.leave_probability, 0.4);
    assert_eq!(result.risk_level, RiskLevel::Medium);

    let service = injected_service(0, [0.3, 0.7], 20);
    let result = service.predict_and_explain(&staying_record()).unwrap();
    assert_eq!(result.prediction, PredictionLabel::Stay);
    assert_eq!(result.risk_level, RiskLevel::High);
}

#[test]
fn test_injected_attributions_ranked() {
    let service = injected_service(0, [0.9, 0.1], 20);
    let result = service.predict_and_explain(&staying_record()).unwrap();

    let features: Vec<&str> = result.top_factors.iter().map(|f| f.feature.as_str()).collect();
    assert_eq!(features, vec!["salary_medium", "salary_low", "salary_high"]);
    assert_eq!(result.top_factors[0].magnitude, 0.19);
}

#[test]
fn test_misaligned_attributions() {
    let service = injected_service(0, [0.9, 0.1], 19);
    let err = service.predict_and_explain(&staying_record()).unwrap_err();
    assert!(matches!(
        err,
        AttritionError::AttributionAlignmentError { names: 20, values: 19 }
    ));
    assert!(!err.is_client_error());
}

#[test]
fn test_risk_uses_unrounded_probability() {
    // 0.396 reports as 0.4 but stays below the medium threshold
    let service = injected_service(0, [0.604, 0.396], 20);
    let result = service.predict_and_explain(&staying_record()).unwrap();
    assert_eq!(result.leave_probability, 0.4);
    assert_eq!(result.risk_level, RiskLevel::Low);

    let service = injected_service(1, [0.304, 0.696], 20);
    let result = service.predict_and_explain(&leaving_record()).unwrap();
    assert_eq!(result.leave_probability, 0.7);
    assert_eq!(result.risk_level, RiskLevel::Medium);
}

#[test]
fn test_contribution_strength_keeps_sign() {
    let mut positive = vec![0.0; 20];
    positive[F_SATISFACTION] = -0.3123;
    positive[F_PROJECTS] = 0.1;
    let context = ModelContext::new(
        Box::new(injected_pipeline(0, [0.8, 0.2])),
        Box::new(FixedExplainer { positive }),
    );
    let service = AttritionService::with_context(context);
    let result = service.predict_and_explain(&staying_record()).unwrap();

    let top = &result.top_factors[0];
    assert_eq!(top.feature, "satisfaction_level");
    assert_eq!(top.direction, ImpactDirection::DecreasesLeaveRisk);
    assert_eq!(top.magnitude, -0.312);
    assert_eq!(result.top_factors[1].magnitude, 0.1);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["top_factors"][0]["contribution_strength"], serde_json::json!(-0.312));
    assert_eq!(json["top_factors"][0]["impact"], "decreases_leave_risk");
}
