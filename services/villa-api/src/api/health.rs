//! Health check endpoints.
//!
//! These endpoints are used by load balancers and orchestration systems
//! to determine if the service is healthy and ready to receive traffic.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    /// Service status: "ok" or "degraded".
    pub status: String,

    /// Service name.
    pub service: String,

    /// Service version.
    pub version: String,

    /// Current timestamp (ISO 8601).
    pub timestamp: String,

    /// Store health (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreStatus>,
}

/// Store backend status.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StoreStatus {
    /// Backend name: "memory" or "postgres".
    pub backend: String,

    /// Status: "ok" or "unavailable".
    pub status: String,

    /// Optional message with details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Create health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/livez", get(livez))
}

fn response(status: &str, store: Option<StoreStatus>) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        service: "villa-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        store,
    }
}

/// Basic health check; does not touch the store.
async fn healthz() -> impl IntoResponse {
    Json(response("ok", None))
}

/// Readiness check; returns 503 when the store is unreachable.
async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.service().store();
    let result = store.health_check().await;
    let ok = result.is_ok();

    let store_status = StoreStatus {
        backend: store.backend().to_string(),
        status: if ok { "ok" } else { "unavailable" }.to_string(),
        message: result.err().map(|e| e.to_string()),
    };

    if ok {
        (StatusCode::OK, Json(response("ok", Some(store_status))))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(response("degraded", Some(store_status))),
        )
    }
}

/// Liveness check with an empty body.
async fn livez() -> impl IntoResponse {
    StatusCode::OK
}
