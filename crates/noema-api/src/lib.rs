//! # noema-api — HTTP Boundary
//!
//! Thin axum adapter over the evaluation core: it parses uploads into a
//! `PolicyEvaluation`, dispatches to the orchestrator, and renders the
//! resulting artifact. Everything stateful lives below this crate.
//!
//! ## API Surface
//!
//! | Route                | Auth      | Purpose                          |
//! |----------------------|-----------|----------------------------------|
//! | `POST /api/evaluate` | judge key | Evaluate a dataset, return proof |
//! | `POST /api/verify`   | public    | Verify a proof                   |
//! | `GET /health`        | public    | Liveness                         |
//! | `GET /ready`         | public    | Uploads/runs dirs writable       |
//! | `GET /about`         | public    | Proof-system metadata + vk hash  |
//! | `GET /openapi.json`  | public    | OpenAPI 3 document               |

pub mod auth;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router.
///
/// Health probes, `/about`, `/openapi.json`, and `POST /api/verify` are
/// public; `POST /api/evaluate` sits behind the judge-key middleware.
pub fn app(state: AppState) -> Router {
    let gated = Router::new()
        .route("/api/evaluate", post(routes::evaluate::handler))
        .layer(from_fn_with_state(state.clone(), auth::require_judge_key))
        .layer(routes::evaluate::body_limit());

    let public = Router::new()
        .route("/health", get(routes::health::health))
        .route("/ready", get(routes::health::ready))
        .route("/about", get(routes::about::about))
        .route("/openapi.json", get(openapi::serve))
        .route(
            "/api/verify",
            post(routes::verify::handler).layer(routes::verify::body_limit()),
        );

    Router::new()
        .merge(gated)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
