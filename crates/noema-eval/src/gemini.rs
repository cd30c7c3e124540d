//! # Gemini Evaluator
//!
//! `generateContent` client for the Google Gemini API, implementing the
//! [`Evaluator`] capability: structured JSON output constrained by a
//! response schema, inline image parts, and usage metadata. Transient
//! transport errors are retried with bounded exponential backoff before the
//! caller's stub fallback kicks in.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

use noema_core::NoemaError;

use crate::evaluator::{EvalRequest, EvalResponse, Evaluator, Usage};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Maximum retry attempts after the initial request.
const MAX_RETRIES: u32 = 3;

/// Base retry delay; doubles each attempt (200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// Gemini-backed evaluator.
#[derive(Debug, Clone)]
pub struct GeminiEvaluator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiEvaluator {
    /// Create a client for the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body(req: &EvalRequest) -> serde_json::Value {
        let mut parts = vec![json!({"text": req.user_prompt})];
        for image in &req.images {
            if image.data.is_empty() {
                continue;
            }
            parts.push(json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": BASE64.encode(&image.data),
                }
            }));
        }
        json!({
            "system_instruction": {"parts": [{"text": req.system_prompt}]},
            "contents": [{"role": "user", "parts": parts}],
            "generationConfig": {
                "temperature": req.temperature,
                "maxOutputTokens": req.max_output_tokens,
                "responseMimeType": "application/json",
                "responseJsonSchema": req.response_schema,
            },
        })
    }
}

#[async_trait]
impl Evaluator for GeminiEvaluator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn evaluate(&self, req: EvalRequest) -> Result<EvalResponse, NoemaError> {
        if self.api_key.is_empty() {
            return Err(NoemaError::ExternalEvaluator(
                "GEMINI_API_KEY not set".to_string(),
            ));
        }
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = Self::request_body(&req);

        let response = retry_send(|| {
            self.client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .timeout(req.deadline)
                .json(&body)
                .send()
        })
        .await
        .map_err(|e| NoemaError::ExternalEvaluator(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "gemini request failed: {detail}");
            return Err(NoemaError::ExternalEvaluator(format!(
                "gemini returned {status}"
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| NoemaError::ExternalEvaluator(e.to_string()))?;

        let text = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Err(NoemaError::ExternalEvaluator(
                "gemini returned no text candidates".to_string(),
            ));
        }

        Ok(EvalResponse {
            text,
            model: parsed
                .model_version
                .unwrap_or_else(|| self.model.clone()),
            usage: parsed.usage_metadata.map(Usage::from),
        })
    }
}

/// Retry transient transport failures with exponential backoff, then one
/// final attempt. Non-2xx responses are the caller's concern.
async fn retry_send<F, Fut>(f: F) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..MAX_RETRIES {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) => {
                let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt));
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = MAX_RETRIES,
                    "gemini HTTP request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    f().await
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
    #[serde(rename = "modelVersion")]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: i32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: i32,
    #[serde(rename = "totalTokenCount", default)]
    total_token_count: i32,
    #[serde(rename = "cachedContentTokenCount", default)]
    cached_content_token_count: i32,
}

impl From<UsageMetadata> for Usage {
    fn from(meta: UsageMetadata) -> Self {
        Self {
            prompt_tokens: meta.prompt_token_count,
            candidate_tokens: meta.candidates_token_count,
            total_tokens: meta.total_token_count,
            cached_token_count: meta.cached_content_token_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> EvalRequest {
        EvalRequest {
            system_prompt: "be strict".to_string(),
            user_prompt: "evaluate this".to_string(),
            response_schema: json!({"type": "object"}),
            images: vec![],
            temperature: 0.0,
            max_output_tokens: 2048,
            deadline: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn successful_call_extracts_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-3-pro:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "{\"ok\":true}"}]}}],
                "usageMetadata": {
                    "promptTokenCount": 10,
                    "candidatesTokenCount": 5,
                    "totalTokenCount": 15
                },
                "modelVersion": "gemini-3-pro-001"
            })))
            .mount(&server)
            .await;

        let evaluator =
            GeminiEvaluator::new("test-key", "gemini-3-pro").with_base_url(server.uri());
        let resp = evaluator.evaluate(request()).await.unwrap();
        assert_eq!(resp.text, "{\"ok\":true}");
        assert_eq!(resp.model, "gemini-3-pro-001");
        let usage = resp.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 10);
        assert_eq!(usage.candidate_tokens, 5);
        assert_eq!(usage.total_tokens, 15);
        assert_eq!(usage.cached_token_count, 0);
    }

    #[tokio::test]
    async fn non_success_status_is_external_evaluator_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let evaluator = GeminiEvaluator::new("k", "gemini-3-pro").with_base_url(server.uri());
        let err = evaluator.evaluate(request()).await.unwrap_err();
        assert!(matches!(err, NoemaError::ExternalEvaluator(_)));
    }

    #[tokio::test]
    async fn empty_candidates_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let evaluator = GeminiEvaluator::new("k", "gemini-3-pro").with_base_url(server.uri());
        let err = evaluator.evaluate(request()).await.unwrap_err();
        assert!(matches!(err, NoemaError::ExternalEvaluator(_)));
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let evaluator = GeminiEvaluator::new("", "gemini-3-pro");
        let err = evaluator.evaluate(request()).await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn request_body_includes_images_and_schema() {
        let mut req = request();
        req.images.push(crate::evaluator::ImageInput {
            filename: "a.png".to_string(),
            mime_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        });
        let body = GeminiEvaluator::request_body(&req);
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }
}
