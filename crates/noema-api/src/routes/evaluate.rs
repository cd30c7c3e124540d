//! # Evaluation Endpoint
//!
//! `POST /api/evaluate` accepts a multipart form — `policy_config` (JSON
//! string, required), `evaluation_result` (JSON string, optional),
//! `dataset` (file, required), `images` (files, 0..=10) — builds a
//! `PolicyEvaluation`, and dispatches to the orchestrator. Per-upload size
//! ceilings are validation errors (400); blowing the whole-body limit is a
//! 413.

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use noema_core::{limits, parse_evaluation_result, parse_policy_config};
use noema_eval::{ImageInput, PolicyEvaluation};

use crate::error::ApiError;
use crate::state::AppState;

/// Public-output block of the response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicOutputBody {
    pub overall_pass: bool,
    pub max_severity: u8,
    pub policy_threshold: u8,
    pub commitment: String,
}

/// Proof block of the response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProofBody {
    pub system: String,
    pub curve: String,
    pub proof_b64: String,
    pub public_inputs_b64: String,
}

/// Response body for `POST /api/evaluate`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvaluateResponse {
    pub run_id: String,
    /// `PASS` or `FAIL`.
    pub status: String,
    pub overall_pass: bool,
    pub max_severity: u8,
    pub commitment: String,
    pub proof_b64: String,
    pub public_inputs_b64: String,
    pub public_output: PublicOutputBody,
    pub proof: ProofBody,
    pub verified: bool,
}

/// Whole-body limit: dataset + images + multipart overhead.
pub fn body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(
        limits::MAX_DATASET_BYTES
            + limits::MAX_IMAGES * limits::MAX_IMAGE_BYTES
            + limits::MULTIPART_OVERHEAD,
    )
}

/// POST /api/evaluate.
#[utoipa::path(
    post,
    path = "/api/evaluate",
    responses(
        (status = 200, description = "Evaluation artifact with proof", body = EvaluateResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Missing or invalid judge key"),
        (status = 413, description = "Body too large"),
        (status = 500, description = "Proof failure"),
    ),
    tag = "evaluate"
)]
pub async fn handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let form = parse_form(multipart).await?;

    let policy_raw = form
        .policy_config
        .ok_or_else(|| ApiError::BadRequest("missing field: policy_config".to_string()))?;
    let policy = parse_policy_config(&policy_raw).map_err(ApiError::from)?;

    let evaluation_result = match form.evaluation_result {
        Some(raw) => Some(parse_evaluation_result(&raw).map_err(ApiError::from)?),
        None => None,
    };

    let dataset = form
        .dataset
        .ok_or_else(|| ApiError::BadRequest("missing required file: dataset".to_string()))?;

    let artifact = state
        .orchestrator
        .evaluate(PolicyEvaluation {
            policy,
            dataset,
            images: form.images,
            evaluation_result,
            deadline: None,
        })
        .await
        .map_err(ApiError::from)?;

    let output = artifact.public_output;
    Ok(Json(EvaluateResponse {
        run_id: artifact.run_id,
        status: artifact.status,
        overall_pass: output.overall_pass,
        max_severity: output.max_severity,
        commitment: output.commitment.clone(),
        proof_b64: artifact.proof.proof_b64.clone(),
        public_inputs_b64: artifact.proof.public_inputs_b64.clone(),
        public_output: PublicOutputBody {
            overall_pass: output.overall_pass,
            max_severity: output.max_severity,
            policy_threshold: output.policy_threshold,
            commitment: output.commitment,
        },
        proof: ProofBody {
            system: artifact.proof.system,
            curve: artifact.proof.curve,
            proof_b64: artifact.proof.proof_b64,
            public_inputs_b64: artifact.proof.public_inputs_b64,
        },
        verified: artifact.verified,
    }))
}

#[derive(Default)]
struct EvaluateForm {
    policy_config: Option<String>,
    evaluation_result: Option<String>,
    dataset: Option<Vec<u8>>,
    images: Vec<ImageInput>,
}

async fn parse_form(mut multipart: Multipart) -> Result<EvaluateForm, ApiError> {
    let mut form = EvaluateForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("policy_config") => {
                if form.policy_config.is_some() {
                    return Err(ApiError::BadRequest(
                        "only one policy_config value allowed".to_string(),
                    ));
                }
                let raw = field.text().await.map_err(multipart_error)?;
                let trimmed = raw.trim().to_string();
                if trimmed.is_empty() {
                    return Err(ApiError::BadRequest(
                        "policy_config must be non-empty".to_string(),
                    ));
                }
                form.policy_config = Some(trimmed);
            }
            Some("evaluation_result") => {
                if form.evaluation_result.is_some() {
                    return Err(ApiError::BadRequest(
                        "only one evaluation_result value allowed".to_string(),
                    ));
                }
                let raw = field.text().await.map_err(multipart_error)?;
                let trimmed = raw.trim().to_string();
                if trimmed.is_empty() {
                    return Err(ApiError::BadRequest(
                        "evaluation_result must be non-empty".to_string(),
                    ));
                }
                form.evaluation_result = Some(trimmed);
            }
            Some("dataset") => {
                if form.dataset.is_some() {
                    return Err(ApiError::BadRequest(
                        "only one dataset file allowed".to_string(),
                    ));
                }
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if bytes.len() > limits::MAX_DATASET_BYTES {
                    return Err(ApiError::BadRequest(format!(
                        "dataset exceeds limit of {}MB",
                        limits::MAX_DATASET_BYTES / (1024 * 1024)
                    )));
                }
                form.dataset = Some(bytes.to_vec());
            }
            Some("images") => {
                if form.images.len() >= limits::MAX_IMAGES {
                    return Err(ApiError::BadRequest(format!(
                        "maximum {} images allowed",
                        limits::MAX_IMAGES
                    )));
                }
                let filename = field
                    .file_name()
                    .map(str::to_owned)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| {
                        ApiError::BadRequest("image upload requires a filename".to_string())
                    })?;
                if form.images.iter().any(|i| i.filename == filename) {
                    return Err(ApiError::BadRequest(
                        "image filenames must be unique".to_string(),
                    ));
                }
                let mime_type = field
                    .content_type()
                    .map(str::to_owned)
                    .unwrap_or_else(|| mime_from_extension(&filename));
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if bytes.len() > limits::MAX_IMAGE_BYTES {
                    return Err(ApiError::BadRequest(format!(
                        "each image must be at most {}MB",
                        limits::MAX_IMAGE_BYTES / (1024 * 1024)
                    )));
                }
                form.images.push(ImageInput {
                    filename,
                    mime_type,
                    data: bytes.to_vec(),
                });
            }
            _ => {
                // Unknown form fields are ignored; drain the body.
                let _ = field.bytes().await.map_err(multipart_error)?;
            }
        }
    }
    Ok(form)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::Oversized("request body too large".to_string())
    } else {
        ApiError::BadRequest("invalid multipart form".to_string())
    }
}

fn mime_from_extension(filename: &str) -> String {
    let ext = std::path::Path::new(filename)
        .extension()
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_fallback_by_extension() {
        assert_eq!(mime_from_extension("a.png"), "image/png");
        assert_eq!(mime_from_extension("a.JPG"), "image/jpeg");
        assert_eq!(mime_from_extension("a.jpeg"), "image/jpeg");
        assert_eq!(mime_from_extension("a"), "application/octet-stream");
        assert_eq!(mime_from_extension("a.dat"), "application/octet-stream");
    }
}
