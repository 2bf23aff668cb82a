use crate::startup::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde_json::json;
use std::path::Path;

/// Fallback body for `GET /` when no frontend bundle is present.
const LIVENESS_MESSAGE: &str = "Plant Analysis API is live. Use /analyze or /download routes.";

/// Landing page: serves the static frontend when one is deployed alongside
/// the service, otherwise a plain liveness message.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let index_path = Path::new(&state.config.static_assets.dir).join("index.html");
    match tokio::fs::read_to_string(&index_path).await {
        Ok(contents) => Html(contents).into_response(),
        Err(_) => LIVENESS_MESSAGE.into_response(),
    }
}

/// Health check endpoint for Docker/K8s liveness probes.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "plant-analysis-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check endpoint for K8s readiness probes.
pub async fn readiness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}
