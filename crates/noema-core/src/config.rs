//! # Service Configuration
//!
//! Environment-backed configuration, resolved once at startup and shared
//! read-only. Upload size ceilings live in [`limits`] as compile-time
//! constants.

use std::path::PathBuf;

/// Upload and request-body size limits.
pub mod limits {
    /// Maximum dataset upload size: 50 MB.
    pub const MAX_DATASET_BYTES: usize = 50 * 1024 * 1024;
    /// Maximum size of each uploaded image: 5 MB.
    pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
    /// Maximum number of images per evaluation.
    pub const MAX_IMAGES: usize = 10;
    /// Maximum body size for `POST /api/verify`: 5 MB.
    pub const MAX_VERIFY_BYTES: usize = 5 * 1024 * 1024;
    /// Slack for multipart boundaries and form fields.
    pub const MULTIPART_OVERHEAD: usize = 2 << 20;
}

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct NoemaConfig {
    /// Judge key gating protected routes. Empty means every gated request
    /// is rejected (the server logs a warning at startup).
    pub judge_key: String,
    /// Google Gemini API key; empty disables the evaluator.
    pub gemini_api_key: String,
    /// Gemini model name.
    pub gemini_model: String,
    /// Directory for ad-hoc uploads (readiness probe only).
    pub uploads_dir: PathBuf,
    /// Directory holding run artifacts, the run index, and the cache.
    pub runs_dir: PathBuf,
    /// Maximum dataset items forwarded to the evaluator. 0 disables sampling.
    pub sample_items: usize,
    /// Maximum entries retained in `index.json`.
    pub runs_index_limit: usize,
    /// Maximum run directories retained on disk. 0 disables pruning.
    pub runs_max: usize,
    /// TCP port to listen on.
    pub port: u16,
}

impl NoemaConfig {
    /// Resolve configuration from the environment, applying defaults.
    pub fn from_env() -> Self {
        Self {
            judge_key: env_string("JUDGE_KEY", ""),
            gemini_api_key: env_string("GEMINI_API_KEY", ""),
            gemini_model: env_trimmed("GEMINI_MODEL", "gemini-3-pro"),
            uploads_dir: PathBuf::from(env_string("NOEMA_UPLOADS_DIR", "data/uploads")),
            runs_dir: PathBuf::from(env_string("NOEMA_RUNS_DIR", "data/runs")),
            sample_items: env_usize("NOEMA_SAMPLE_ITEMS", 100),
            runs_index_limit: env_usize("NOEMA_RUNS_INDEX_LIMIT", 50),
            runs_max: env_usize("NOEMA_RUNS_MAX", 50),
            port: env_usize("PORT", 8080) as u16,
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_trimmed(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_unset_vars() {
        // Use names no other test touches to avoid env races.
        assert_eq!(env_usize("NOEMA_TEST_UNSET_USIZE", 50), 50);
        assert_eq!(env_string("NOEMA_TEST_UNSET_STRING", "dflt"), "dflt");
        assert_eq!(env_trimmed("NOEMA_TEST_UNSET_TRIMMED", "gemini-3-pro"), "gemini-3-pro");
    }
}
