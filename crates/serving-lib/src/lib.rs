//! Serving library for the energy predictor services
//!
//! This crate provides:
//! - A startup-loaded, read-only model registry
//! - Input validation and feature vector assembly
//! - Single-row prediction dispatch with rounding
//! - The HTTP router, health checks and observability

pub mod api;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod registry;
pub mod schema;
pub mod service;
pub mod startup;

pub use api::{create_router, AppState};
pub use error::{
    DispatchError, FieldError, LoadError, NotFoundError, PredictionError, ValidationError,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServingMetrics, StructuredLogger};
pub use predictor::Predictor;
pub use registry::{ModelRegistry, ModelSource, PredictorHandle};
pub use service::{Endpoint, ServiceKind};
pub use startup::StartupError;
