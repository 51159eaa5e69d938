//! Observability infrastructure for the prediction services
//!
//! Provides:
//! - Prometheus metrics (prediction latency, request outcomes, loaded models)
//! - Structured JSON logging with tracing

use crate::registry::LoadedModel;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, error, info, warn};

/// Histogram buckets for single-row inference latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0,
];

static GLOBAL_METRICS: OnceLock<ServingMetricsInner> = OnceLock::new();

struct ServingMetricsInner {
    prediction_latency_seconds: HistogramVec,
    predictions_total: IntCounterVec,
    validation_failures_total: IntCounterVec,
    prediction_errors_total: IntCounterVec,
    models_loaded: IntGauge,
}

impl ServingMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram_vec!(
                "energy_predictor_prediction_latency_seconds",
                "Time spent in model inference per request",
                &["endpoint"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "energy_predictor_predictions_total",
                "Predictions served successfully",
                &["endpoint"]
            )
            .expect("Failed to register predictions_total"),

            validation_failures_total: register_int_counter_vec!(
                "energy_predictor_validation_failures_total",
                "Requests rejected by input validation",
                &["endpoint"]
            )
            .expect("Failed to register validation_failures_total"),

            prediction_errors_total: register_int_counter_vec!(
                "energy_predictor_prediction_errors_total",
                "Requests that failed inside the model",
                &["endpoint"]
            )
            .expect("Failed to register prediction_errors_total"),

            models_loaded: register_int_gauge!(
                "energy_predictor_models_loaded",
                "Number of models held by the registry"
            )
            .expect("Failed to register models_loaded"),
        }
    }
}

/// Handle to the process-wide Prometheus metrics.
///
/// Clones share the same underlying collectors.
#[derive(Clone)]
pub struct ServingMetrics {
    _private: (),
}

impl Default for ServingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServingMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServingMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServingMetricsInner {
        GLOBAL_METRICS.get_or_init(ServingMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, endpoint: &str, duration_secs: f64) {
        self.inner()
            .prediction_latency_seconds
            .with_label_values(&[endpoint])
            .observe(duration_secs);
    }

    pub fn inc_predictions(&self, endpoint: &str) {
        self.inner()
            .predictions_total
            .with_label_values(&[endpoint])
            .inc();
    }

    pub fn inc_validation_failures(&self, endpoint: &str) {
        self.inner()
            .validation_failures_total
            .with_label_values(&[endpoint])
            .inc();
    }

    pub fn inc_prediction_errors(&self, endpoint: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[endpoint])
            .inc();
    }

    pub fn set_models_loaded(&self, count: usize) {
        self.inner().models_loaded.set(count as i64);
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, service: &str) {
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            service = %service,
            "Prediction service starting"
        );
    }

    pub fn log_model_loaded(&self, model: &LoadedModel) {
        info!(
            event = "model_loaded",
            instance = %self.instance,
            model = %model.name,
            kind = model.kind,
            path = %model.path.display(),
            sha256 = %model.sha256,
            "Model loaded"
        );
    }

    pub fn log_model_load_failed(&self, model: &str, reason: &str) {
        error!(
            event = "model_load_failed",
            instance = %self.instance,
            model = %model,
            reason = %reason,
            "Model failed to load, refusing to start"
        );
    }

    pub fn log_prediction(&self, endpoint: &str, model: &str, value: f64, elapsed_us: u128) {
        debug!(
            event = "prediction_served",
            instance = %self.instance,
            endpoint = %endpoint,
            model = %model,
            value = value,
            elapsed_us = elapsed_us as u64,
            "Prediction served"
        );
    }

    pub fn log_validation_rejected(&self, endpoint: &str, fields: &[&str]) {
        info!(
            event = "validation_rejected",
            instance = %self.instance,
            endpoint = %endpoint,
            fields = ?fields,
            "Request body rejected"
        );
    }

    pub fn log_prediction_failed(&self, endpoint: &str, model: &str, reason: &str) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            endpoint = %endpoint,
            model = %model,
            reason = %reason,
            "Prediction failed"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Prediction service shutting down"
        );
    }
}
