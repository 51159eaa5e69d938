//! ONNX inference using tract
//!
//! Serves regression models exported to ONNX (e.g. scikit-learn estimators
//! converted with skl2onnx). The graph is optimized once at load time for a
//! single `f32[1, 5]` input row.

use super::Predictor;
use crate::error::PredictionError;
use crate::models::{FeatureVector, FEATURE_COUNT};
use anyhow::{Context, Result};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-backed predictor
pub struct OnnxPredictor {
    model: TractModel,
}

impl OnnxPredictor {
    /// Parse and optimize an ONNX model from bytes
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            model: Self::load_model(model_bytes)?,
        })
    }

    fn load_model(model_bytes: &[u8]) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, FEATURE_COUNT]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    /// Single-row input tensor; the exported graphs take float32
    fn features_to_tensor(features: &FeatureVector) -> Result<Tensor> {
        let row: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        Ok(Tensor::from_shape(&[1, FEATURE_COUNT], &row)?)
    }

    fn run(&self, features: &FeatureVector) -> Result<Option<f64>> {
        let input = Self::features_to_tensor(features)?;
        let result = self.model.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let values = output.cast_to::<f64>()?;
        let first = values.to_array_view::<f64>()?.iter().next().copied();
        Ok(first)
    }
}

impl Predictor for OnnxPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let start = Instant::now();

        let value = self
            .run(features)
            .map_err(|e| PredictionError::Backend(format!("{e:#}")))?
            .ok_or(PredictionError::EmptyOutput)?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(value)
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
