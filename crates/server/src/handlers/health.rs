//! Liveness and fallback handlers.

use crate::error::ApiError;
use axum::Json;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health - Liveness probe. Does not touch the content backend.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Any unrouted request.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("not found".to_string())
}
