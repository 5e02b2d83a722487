//! Model service
//!
//! Holds the fitted pipeline and its explainer, loaded once at startup, and
//! turns an [`EmployeeRecord`](crate::record::EmployeeRecord) into a
//! [`PredictionResult`] with a risk level and the top contributing factors.

mod config;
mod engine;
mod result;
mod risk;

pub use config::{RankerConfig, ServiceConfig, DEFAULT_MODEL_PATH};
pub use engine::{AttritionService, ModelContext};
pub use result::{PredictionLabel, PredictionResult};
pub use risk::{RiskLevel, RiskThresholds};
