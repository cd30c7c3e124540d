//! # Proof Verification Endpoint
//!
//! `POST /api/verify` is public: anyone holding a proof bundle can check
//! it. Malformed requests are 400s; a well-formed proof that simply fails
//! verification is a 200 with `verified: false` and a reason.

use axum::extract::rejection::JsonRejection;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use noema_core::limits;
use noema_zkp::{verify_proof, ZkError};

use crate::error::ApiError;

/// Request body for `POST /api/verify`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// Run identifier the proof belongs to (echoed back).
    #[serde(default)]
    pub run_id: String,
    /// Base64 proof bytes.
    #[serde(default)]
    pub proof_b64: String,
    /// Base64 public-input payload.
    #[serde(default)]
    pub public_inputs_b64: String,
}

/// Response body for `POST /api/verify`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub run_id: String,
    pub verified: bool,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub message: String,
}

/// Body limit for the verify route.
pub fn body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(limits::MAX_VERIFY_BYTES)
}

/// POST /api/verify.
#[utoipa::path(
    post,
    path = "/api/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Verification outcome", body = VerifyResponse),
        (status = 400, description = "Malformed request"),
        (status = 413, description = "Body too large"),
        (status = 500, description = "Verifier initialization failed"),
    ),
    tag = "verify"
)]
pub async fn handler(
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(req) = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::Oversized("request body too large".to_string())
        } else {
            ApiError::BadRequest("invalid JSON body".to_string())
        }
    })?;

    let VerifyRequest {
        run_id,
        proof_b64,
        public_inputs_b64,
    } = req;
    if run_id.is_empty() {
        return Err(ApiError::BadRequest("missing run_id".to_string()));
    }
    if proof_b64.is_empty() || public_inputs_b64.is_empty() {
        return Err(ApiError::BadRequest(
            "missing proof or public inputs".to_string(),
        ));
    }

    let outcome =
        tokio::task::spawn_blocking(move || verify_proof(&proof_b64, &public_inputs_b64))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(|e| match e {
                ZkError::Setup(detail) => ApiError::Internal(detail),
                other => ApiError::BadRequest(other.to_string()),
            })?;

    Ok(Json(VerifyResponse {
        run_id,
        verified: outcome.verified,
        message: outcome.message,
    }))
}
