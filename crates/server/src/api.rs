//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};
use wellness_core::{
    health::{ComponentStatus, HealthMonitor},
    ServeError, ServingOrchestrator, StatusClass,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: ServingOrchestrator,
    pub health: HealthMonitor,
}

impl AppState {
    /// Health is derived from the same artifact slot the orchestrator serves
    pub fn new(orchestrator: ServingOrchestrator) -> Self {
        let health = HealthMonitor::new(orchestrator.artifacts().clone());
        Self {
            orchestrator,
            health,
        }
    }
}

/// JSON error body: `{"error": "<kind>", "detail": "<message>"}`
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    detail: &'a str,
}

/// Maps a serving error onto an HTTP response
pub struct ApiError(pub ServeError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.status_class() {
            StatusClass::ClientError => StatusCode::BAD_REQUEST,
            StatusClass::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            StatusClass::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = ErrorBody {
            error: self.0.kind(),
            detail: self.0.detail(),
        };
        (status, Json(body)).into_response()
    }
}

/// Liveness message for the service root
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Employee wellness inference service is running",
    }))
}

/// Classify one telemetry record. The body is taken raw so artifact
/// availability is decided before any parsing.
async fn predict(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match state.orchestrator.handle_json(&body) {
        Ok(response) => {
            state.health.record_success().await;
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            if let ServeError::PredictionFailed(detail) = &err {
                state.health.record_failure(detail).await;
            }
            ApiError(err).into_response()
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health.readiness();

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
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

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
