//! Fitted tree models
//!
//! Inference-only decision trees and random forests. Trees keep the class
//! distribution and sample cover of every node, which is what both
//! `predict_proba` and the TreeSHAP explainer need.

mod tree;
mod forest;

pub use tree::{DecisionTree, TreeNode};
pub use forest::RandomForestClassifier;

pub(crate) use tree::normalized;
