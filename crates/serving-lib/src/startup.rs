//! Service initialization
//!
//! Loads every model the service needs, binds every endpoint, and only then
//! reports ready. Any failure aborts: there is no partial service.

use crate::api::AppState;
use crate::error::{LoadError, NotFoundError};
use crate::health::HealthRegistry;
use crate::observability::{ServingMetrics, StructuredLogger};
use crate::registry::{ModelRegistry, ModelSource};
use crate::service::ServiceKind;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("endpoint cannot be bound: {0}")]
    Binding(#[from] NotFoundError),
}

/// Load `sources` into a frozen registry, logging each outcome
pub fn load_registry(
    sources: &[ModelSource],
    logger: &StructuredLogger,
) -> Result<ModelRegistry, LoadError> {
    let mut builder = ModelRegistry::builder();
    for source in sources {
        match builder.load(source) {
            Ok(loaded) => logger.log_model_loaded(&loaded),
            Err(err) => {
                logger.log_model_load_failed(&source.name, &err.to_string());
                return Err(err);
            }
        }
    }
    Ok(builder.build())
}

/// Bind the service to an already loaded registry and mark it ready
pub async fn initialize(
    service: ServiceKind,
    registry: &ModelRegistry,
    health_registry: HealthRegistry,
    metrics: ServingMetrics,
    logger: StructuredLogger,
) -> Result<Arc<AppState>, StartupError> {
    let state = AppState::new(service, registry, health_registry, metrics, logger)?;

    for model in service.model_names() {
        state.health_registry.register(model).await;
    }
    state.metrics.set_models_loaded(registry.len());
    state.health_registry.set_ready(true).await;

    Ok(Arc::new(state))
}

/// Load artifacts from disk, then initialize
pub async fn start(
    service: ServiceKind,
    sources: &[ModelSource],
    health_registry: HealthRegistry,
    metrics: ServingMetrics,
    logger: StructuredLogger,
) -> Result<Arc<AppState>, StartupError> {
    let registry = load_registry(sources, &logger)?;
    initialize(service, &registry, health_registry, metrics, logger).await
}
