//! Health check routes.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};

use crate::api::error::ApiResult;
use crate::api::models::{ComponentHealth, HealthResponse};
use crate::api::server::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let uptime = state.start_time.elapsed().as_secs();
    let encoder_available = state.supervisor.runtime_available();

    let components = vec![ComponentHealth {
        name: "encoder".to_string(),
        status: if encoder_available {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        message: state.supervisor.runtime_version(),
    }];

    Ok(Json(HealthResponse {
        status: if encoder_available {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
        components,
    }))
}

/// Readiness check - is the service ready to accept pipeline requests?
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.supervisor.runtime_available() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

/// Liveness check - is the service running at all?
async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}
