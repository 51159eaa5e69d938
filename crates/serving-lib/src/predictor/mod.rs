//! Model adapters and prediction post-processing

mod features;
mod inference;
mod linear;
mod output;

pub use features::{EFFICIENCY_FIELDS, IMPACT_FIELDS};
pub use inference::OnnxPredictor;
pub use linear::LinearPredictor;
pub use output::{format_prediction, round_prediction, RESPONSE_DECIMALS};

use crate::error::PredictionError;
use crate::models::FeatureVector;

/// Capability every served model exposes: one row in, one scalar out
pub trait Predictor: Send + Sync {
    /// Predict the target for a single feature row
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError>;

    /// Short name of the backing implementation, for logs
    fn kind(&self) -> &'static str;
}
