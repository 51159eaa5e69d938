//! HTTP surface
//!
//! `GET /` liveness, one `POST` per endpoint of the configured service, plus
//! `/healthz`, `/readyz` and `/metrics`. The CORS policy is fully permissive
//! with credentials allowed; there is no access control.

use crate::dispatch::Dispatcher;
use crate::error::{DispatchError, NotFoundError, PredictionError, ValidationError};
use crate::health::{ComponentStatus, HealthRegistry};
use crate::models::{LivenessResponse, PredictionResponse};
use crate::observability::{ServingMetrics, StructuredLogger};
use crate::registry::ModelRegistry;
use crate::schema::decode_body;
use crate::service::ServiceKind;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::{any, get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub service: ServiceKind,
    pub dispatchers: Vec<Arc<Dispatcher>>,
    pub health_registry: HealthRegistry,
    pub metrics: ServingMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    /// Bind every endpoint of `service` to its model. Fails if the registry
    /// is missing any of them, which must abort startup.
    pub fn new(
        service: ServiceKind,
        registry: &ModelRegistry,
        health_registry: HealthRegistry,
        metrics: ServingMetrics,
        logger: StructuredLogger,
    ) -> Result<Self, NotFoundError> {
        let parse = service.feature_parser();
        let dispatchers = service
            .endpoints()
            .iter()
            .map(|endpoint| Dispatcher::bind(*endpoint, parse, registry).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            service,
            dispatchers,
            health_registry,
            metrics,
            logger,
        })
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        match self {
            DispatchError::Validation(err) => err.into_response(),
            DispatchError::Prediction(err) => err.into_response(),
        }
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(self)).into_response()
    }
}

impl IntoResponse for PredictionError {
    fn into_response(self) -> Response {
        internal_error()
    }
}

impl IntoResponse for NotFoundError {
    fn into_response(self) -> Response {
        error!(model = %self.0, "Endpoint bound to a model missing from the registry");
        internal_error()
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal Server Error" })),
    )
        .into_response()
}

async fn root(State(state): State<Arc<AppState>>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        message: state.service.liveness_message().to_string(),
    })
}

/// 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn predict(
    state: Arc<AppState>,
    dispatcher: Arc<Dispatcher>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    match run_prediction(&state, dispatcher, content_type, &body).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn run_prediction(
    state: &AppState,
    dispatcher: Arc<Dispatcher>,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<PredictionResponse, DispatchError> {
    let endpoint = *dispatcher.endpoint();

    let decoded = decode_body(content_type, body);
    let features = match decoded.and_then(|value| dispatcher.features(&value)) {
        Ok(features) => features,
        Err(err) => {
            let fields: Vec<&str> = err.detail.iter().filter_map(|e| e.field()).collect();
            state.logger.log_validation_rejected(endpoint.route, &fields);
            state.metrics.inc_validation_failures(endpoint.route);
            return Err(err.into());
        }
    };

    let start = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || dispatcher.predict(&features))
        .await
        .unwrap_or_else(|e| Err(PredictionError::Backend(format!("inference task failed: {e}"))));
    let elapsed = start.elapsed();

    match outcome {
        Ok(response) => {
            state
                .metrics
                .observe_prediction_latency(endpoint.route, elapsed.as_secs_f64());
            state.metrics.inc_predictions(endpoint.route);
            state.health_registry.record_success(endpoint.model).await;
            state.logger.log_prediction(
                endpoint.route,
                endpoint.model,
                response.value,
                elapsed.as_micros(),
            );
            Ok(response)
        }
        Err(err) => {
            let reason = err.to_string();
            state.metrics.inc_prediction_errors(endpoint.route);
            if err.is_model_fault() {
                state
                    .health_registry
                    .record_failure(endpoint.model, reason.clone())
                    .await;
            }
            state
                .logger
                .log_prediction_failed(endpoint.route, endpoint.model, &reason);
            Err(err.into())
        }
    }
}

/// All origins, methods and headers, with credentials. A wildcard cannot be
/// combined with credentials, so the request values are mirrored instead.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics));

    for dispatcher in &state.dispatchers {
        let route = dispatcher.endpoint().route;
        let bound = dispatcher.clone();
        router = router.route(
            route,
            post(
                move |State(state): State<Arc<AppState>>, headers: HeaderMap, body: Bytes| {
                    predict(state, bound, headers, body)
                },
            ),
        );

        // Slash-less form redirects to the canonical route, query kept
        let bare = route.trim_end_matches('/');
        if !bare.is_empty() && bare != route {
            router = router.route(
                bare,
                any(move |uri: Uri| async move {
                    let target = match uri.query() {
                        Some(query) => format!("{route}?{query}"),
                        None => route.to_string(),
                    };
                    Redirect::temporary(&target)
                }),
            );
        }
    }

    router.layer(cors_layer()).with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
