//! # Evaluator Capability
//!
//! The external-evaluator contract: prompt plus response schema in,
//! validated structured result out. Implementations are interchangeable
//! behind the trait: the production Gemini client, or scripted fakes in
//! tests. The evaluator is always optional: callers may supply an
//! evaluation result directly, and any evaluator failure falls back to the
//! deterministic stub result.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use noema_core::NoemaError;

/// Default evaluator deadline when the caller supplies none.
pub const DEFAULT_EVAL_TIMEOUT: Duration = Duration::from_secs(45);

/// An uploaded image forwarded to the evaluator.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Original upload filename; referenced by `dataset.items[].image_ref`.
    pub filename: String,
    /// MIME type, falling back to `application/octet-stream`.
    pub mime_type: String,
    /// Raw image bytes.
    pub data: Vec<u8>,
}

/// One evaluation request.
#[derive(Debug, Clone)]
pub struct EvalRequest {
    /// System instruction for the evaluator.
    pub system_prompt: String,
    /// User prompt carrying constraints and the (sampled) dataset.
    pub user_prompt: String,
    /// JSON schema the structured response must satisfy.
    pub response_schema: serde_json::Value,
    /// Images referenced by the dataset.
    pub images: Vec<ImageInput>,
    /// Sampling temperature; 0 for deterministic output.
    pub temperature: f32,
    /// Output token ceiling.
    pub max_output_tokens: u32,
    /// Wall-clock deadline for the call.
    pub deadline: Duration,
}

/// Token accounting reported by the evaluator, when available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: i32,
    pub candidate_tokens: i32,
    pub total_tokens: i32,
    pub cached_token_count: i32,
}

/// Structured evaluator response.
#[derive(Debug, Clone)]
pub struct EvalResponse {
    /// Raw response text; the caller parses and validates it as JSON.
    pub text: String,
    /// Model that produced the response.
    pub model: String,
    /// Token usage, when the backend reports it.
    pub usage: Option<Usage>,
}

/// Abstract evaluator capability.
///
/// Transport failures, timeouts, and refusals surface as
/// [`NoemaError::ExternalEvaluator`]; the orchestrator treats them as
/// transient and falls back to the stub result.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// The model name this evaluator resolves to; part of the cache key.
    fn model(&self) -> &str;

    /// Run one evaluation.
    async fn evaluate(&self, req: EvalRequest) -> Result<EvalResponse, NoemaError>;
}
