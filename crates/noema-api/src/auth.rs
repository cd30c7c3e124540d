//! # Judge-Key Authentication
//!
//! Gated routes require the judge key in the `X-Judge-Key` header or the
//! `judge_key` query parameter. Comparison is constant-time. A server
//! without a configured key rejects every gated request.

use std::collections::HashMap;

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

use crate::error::ApiError;
use crate::state::AppState;

/// Middleware enforcing the judge key on gated routes.
pub async fn require_judge_key(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let expected = state.config.judge_key.as_str();
    if expected.is_empty() {
        return Err(ApiError::Internal("JUDGE_KEY not configured".to_string()));
    }

    let provided = request
        .headers()
        .get("x-judge-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| params.get("judge_key").cloned())
        .unwrap_or_default();

    if !constant_time_eq(&provided, expected) {
        return Err(ApiError::Unauthorized("invalid judge key".to_string()));
    }
    Ok(next.run(request).await)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
