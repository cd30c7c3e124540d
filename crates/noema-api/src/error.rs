//! # API Error Type
//!
//! Maps core error kinds to HTTP status codes and `{"error": …}` bodies.
//! Validation failures return their precise message; proof failures return
//! a fixed phrase; everything else internal is logged and hidden.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use noema_core::NoemaError;

/// JSON error body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

/// Application-level error with its HTTP mapping.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 400 — validation failure, message returned verbatim.
    #[error("{0}")]
    BadRequest(String),

    /// 401 — missing or invalid judge key.
    #[error("{0}")]
    Unauthorized(String),

    /// 413 — request body or upload over its size limit.
    #[error("{0}")]
    Oversized(String),

    /// 500 — proof generation or self-verification failed. The message is
    /// one of the fixed public phrases, details stay in the logs.
    #[error("{0}")]
    ProofFailure(String),

    /// 500 — anything else. Message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Oversized(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ProofFailure(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error");
                "internal error".to_string()
            }
            Self::ProofFailure(msg) => {
                tracing::error!(error = %msg, "proof failure");
                msg.clone()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<NoemaError> for ApiError {
    fn from(err: NoemaError) -> Self {
        match err {
            NoemaError::BadRequest(msg) => Self::BadRequest(msg),
            NoemaError::UnsupportedConstraint(_) | NoemaError::MissingResult(_) => {
                Self::BadRequest(err.to_string())
            }
            NoemaError::Oversized(msg) => Self::Oversized(msg),
            NoemaError::ProofFailure(detail) => {
                if detail == "proof verification failed" {
                    Self::ProofFailure(detail)
                } else {
                    tracing::error!(error = %detail, "proof generation failed");
                    Self::ProofFailure("proof generation failed".to_string())
                }
            }
            NoemaError::CommitmentMismatch => {
                Self::ProofFailure("proof generation failed".to_string())
            }
            NoemaError::VerifierInit(detail) => Self::Internal(detail),
            NoemaError::ExternalEvaluator(detail) => Self::Internal(detail),
            NoemaError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Oversized("x".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::ProofFailure("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_kinds_map_to_400() {
        let err: ApiError = NoemaError::bad_request("bad field").into();
        assert!(matches!(err, ApiError::BadRequest(_)));
        let err: ApiError = NoemaError::UnsupportedConstraint("novel".into()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
        let err: ApiError = NoemaError::MissingResult("pii_exposure_risk".into()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn self_verification_message_is_preserved() {
        let err: ApiError =
            NoemaError::ProofFailure("proof verification failed".to_string()).into();
        match err {
            ApiError::ProofFailure(msg) => assert_eq!(msg, "proof verification failed"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn prover_details_are_replaced_with_fixed_phrase() {
        let err: ApiError = NoemaError::ProofFailure("synthesis blew up".to_string()).into();
        match err {
            ApiError::ProofFailure(msg) => assert_eq!(msg, "proof generation failed"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
