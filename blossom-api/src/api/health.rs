//! Health check and ping endpoints (no authentication)

use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

/// Health check response: status, module name, version and build commit
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub build: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "blossom-api".to_string(),
        version: blossom_common::VERSION.to_string(),
        build: env!("BLOSSOM_COMMIT").to_string(),
    })
}

/// GET /api/ping
pub async fn ping() -> Json<Value> {
    Json(json!({ "ping?!": "PONG" }))
}

/// Build unauthenticated routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/ping", get(ping))
}
