//! Prediction dispatch
//!
//! A [`Dispatcher`] is one endpoint with its model resolved at bind time:
//! validate, assemble, predict a single row, round, wrap.

use crate::error::{NotFoundError, PredictionError, ValidationError};
use crate::models::{FeatureVector, PredictionResponse};
use crate::predictor::{format_prediction, Predictor};
use crate::registry::{ModelRegistry, PredictorHandle};
use crate::service::{Endpoint, FeatureParser};
use serde_json::Value;

pub struct Dispatcher {
    endpoint: Endpoint,
    parse: FeatureParser,
    predictor: PredictorHandle,
}

impl Dispatcher {
    /// Bind an endpoint to its model; fails if the registry lacks it
    pub fn bind(
        endpoint: Endpoint,
        parse: FeatureParser,
        registry: &ModelRegistry,
    ) -> Result<Self, NotFoundError> {
        let predictor = registry.get(endpoint.model)?;
        Ok(Self {
            endpoint,
            parse,
            predictor,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Validate a body and assemble its feature vector. Touches no model.
    pub fn features(&self, body: &Value) -> Result<FeatureVector, ValidationError> {
        (self.parse)(body)
    }

    /// Run the bound model on one feature row and shape the response
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResponse, PredictionError> {
        if let Some((index, value)) = features
            .iter()
            .copied()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(PredictionError::NonFiniteFeature { index, value });
        }

        let raw = self.predictor.predict(features)?;
        format_prediction(self.endpoint.response_key, raw)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoint", &self.endpoint)
            .field("model_kind", &self.predictor.kind())
            .finish()
    }
}
