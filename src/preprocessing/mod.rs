//! Fitted preprocessing stage
//!
//! Provides the transform-only half of a fitted preprocessing pipeline:
//! - Standard scaling of numeric columns
//! - One-hot encoding of categorical columns
//! - A column transformer that routes named columns through named stages and
//!   produces stage-prefixed output feature names

mod scaler;
mod encoder;
mod column_transformer;

pub use scaler::StandardScaler;
pub use encoder::{OneHotEncoder, UnknownCategory};
pub use column_transformer::{ColumnStage, ColumnTransformer, TransformerKind, STAGE_SEPARATOR};
