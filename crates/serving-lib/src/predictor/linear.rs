//! Linear model stored as JSON
//!
//! Artifact shape: `{"coefficients": [c0, c1, c2, c3, c4], "intercept": b}`.
//! Prediction is `b + sum(ci * xi)`.

use super::Predictor;
use crate::error::PredictionError;
use crate::models::{FeatureVector, FEATURE_COUNT};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct LinearArtifact {
    coefficients: Vec<f64>,
    #[serde(default)]
    intercept: f64,
}

/// Ordinary linear regression over the feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPredictor {
    coefficients: FeatureVector,
    intercept: f64,
}

impl LinearPredictor {
    pub fn new(coefficients: FeatureVector, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Parse a JSON artifact, checking that it matches the feature count
    pub fn from_json(bytes: &[u8]) -> Result<Self, String> {
        let artifact: LinearArtifact =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid linear model: {e}"))?;

        let coefficients: FeatureVector = artifact.coefficients.try_into().map_err(|c: Vec<f64>| {
            format!("expected {} coefficients, found {}", FEATURE_COUNT, c.len())
        })?;

        if coefficients.iter().any(|c| !c.is_finite()) || !artifact.intercept.is_finite() {
            return Err("coefficients must be finite".to_string());
        }

        Ok(Self::new(coefficients, artifact.intercept))
    }

    pub fn coefficients(&self) -> &FeatureVector {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(features.iter())
            .map(|(c, x)| c * x)
            .sum();
        Ok(self.intercept + dot)
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}
