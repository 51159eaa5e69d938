//! Per-model health and service readiness
//!
//! A model that fails a prediction is degraded and goes back to healthy on
//! its next success. After [`UNHEALTHY_AFTER_FAILURES`] failures in a row it
//! is unhealthy, which also takes the service out of readiness.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Consecutive failures that turn a degraded model unhealthy
pub const UNHEALTHY_AFTER_FAILURES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Recent failures, still serving
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        !matches!(self, ComponentStatus::Unhealthy)
    }
}

/// Health of one loaded model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            last_error: None,
            consecutive_failures: 0,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    fn record_failure(&mut self, reason: String) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.status = if self.consecutive_failures >= UNHEALTHY_AFTER_FAILURES {
            ComponentStatus::Unhealthy
        } else {
            ComponentStatus::Degraded
        };
        self.last_error = Some(reason);
        self.last_check_timestamp = chrono::Utc::now().timestamp();
    }
}

/// Body of `GET /healthz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub models: BTreeMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst model status; healthy when there are no models
    pub fn compute_status(models: &BTreeMap<String, ComponentHealth>) -> ComponentStatus {
        models
            .values()
            .map(|h| h.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy)
    }
}

/// Body of `GET /readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    models: Arc<RwLock<BTreeMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a model as healthy
    pub async fn register(&self, model: &str) {
        self.models
            .write()
            .await
            .insert(model.to_string(), ComponentHealth::healthy());
    }

    /// Successful prediction. Only takes the write lock if the model was
    /// not already healthy.
    pub async fn record_success(&self, model: &str) {
        let needs_update = matches!(
            self.models.read().await.get(model),
            Some(h) if h.status != ComponentStatus::Healthy
        );
        if needs_update {
            if let Some(health) = self.models.write().await.get_mut(model) {
                *health = ComponentHealth::healthy();
            }
        }
    }

    /// Failed prediction; unknown models are ignored
    pub async fn record_failure(&self, model: &str, reason: impl Into<String>) {
        if let Some(health) = self.models.write().await.get_mut(model) {
            health.record_failure(reason.into());
        }
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let models = self.models.read().await.clone();
        let status = HealthResponse::compute_status(&models);
        HealthResponse { status, models }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        if !*self.ready.read().await {
            return ReadinessResponse {
                ready: false,
                reason: Some("Service not yet initialized".to_string()),
            };
        }

        let unhealthy: Vec<String> = self
            .models
            .read()
            .await
            .iter()
            .filter(|(_, h)| !h.status.is_operational())
            .map(|(name, _)| name.clone())
            .collect();

        if unhealthy.is_empty() {
            ReadinessResponse {
                ready: true,
                reason: None,
            }
        } else {
            ReadinessResponse {
                ready: false,
                reason: Some(format!("Unhealthy models: {}", unhealthy.join(", "))),
            }
        }
    }
}
