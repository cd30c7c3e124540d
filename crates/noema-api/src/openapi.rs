//! # OpenAPI Document
//!
//! Auto-generated OpenAPI 3 spec from the route annotations, served at
//! `/openapi.json`.

use axum::Json;
use utoipa::OpenApi;

use crate::error::ErrorBody;
use crate::routes::about::AboutResponse;
use crate::routes::evaluate::{EvaluateResponse, ProofBody, PublicOutputBody};
use crate::routes::verify::{VerifyRequest, VerifyResponse};

/// OpenAPI document for the Noema API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Noema Policy-Audit API",
        description = "Zero-knowledge policy-gate proofs over private datasets"
    ),
    paths(
        crate::routes::evaluate::handler,
        crate::routes::verify::handler,
        crate::routes::about::about,
    ),
    components(schemas(
        EvaluateResponse,
        PublicOutputBody,
        ProofBody,
        VerifyRequest,
        VerifyResponse,
        AboutResponse,
        ErrorBody,
    ))
)]
pub struct ApiDoc;

/// GET /openapi.json.
pub async fn serve() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
