use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::api::AuthApi;
use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
}

/// GET /health -- liveness probe.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router<E: AuthApi>() -> Router<AppState<E>> {
    Router::new().route("/health", get(health_check))
}
