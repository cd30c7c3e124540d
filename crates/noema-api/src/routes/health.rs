//! # Health Probes
//!
//! `/health` answers as long as the process is up; `/ready` additionally
//! proves the uploads and runs directories are writable.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// GET /health — liveness.
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// GET /ready — readiness: uploads and runs directories must be writable.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if std::fs::create_dir_all(&state.config.uploads_dir).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"status": "error", "error": "uploads dir not writable"})),
        );
    }
    if std::fs::create_dir_all(&state.config.runs_dir).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"status": "error", "error": "runs dir not writable"})),
        );
    }
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
