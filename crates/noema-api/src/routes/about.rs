//! # Proof-System Metadata
//!
//! `GET /about` exposes the proof-system identifiers and the verifying-key
//! fingerprint so external verifiers can pin the key they validate
//! against.

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use noema_zkp::{verifying_key_fingerprint, CONSTRAINT_SLOTS, PROOF_CURVE, PROOF_SYSTEM};

use crate::error::ApiError;

/// Response body for `GET /about`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AboutResponse {
    /// Proof system identifier.
    pub system: String,
    /// Curve identifier.
    pub curve: String,
    /// Fixed constraint slot count.
    pub constraint_slots: usize,
    /// SHA-256 of the compressed verifying key, lowercase hex.
    pub verifying_key_fingerprint: String,
}

/// GET /about.
#[utoipa::path(
    get,
    path = "/about",
    responses(
        (status = 200, description = "Proof-system metadata", body = AboutResponse),
        (status = 500, description = "Verifier initialization failed"),
    ),
    tag = "meta"
)]
pub async fn about() -> Result<Json<AboutResponse>, ApiError> {
    let fingerprint = tokio::task::spawn_blocking(verifying_key_fingerprint)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(AboutResponse {
        system: PROOF_SYSTEM.to_string(),
        curve: PROOF_CURVE.to_string(),
        constraint_slots: CONSTRAINT_SLOTS,
        verifying_key_fingerprint: fingerprint,
    }))
}
