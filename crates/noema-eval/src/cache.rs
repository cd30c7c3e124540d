//! # Evaluation-Result Cache
//!
//! Content-addressed cache of structured evaluator outputs, keyed by
//! `SHA-256(dataset ‖ policy ‖ model ‖ prompt-version ‖ sample limit)`.
//! Entries are immutable once written; writers go through a temp file and
//! an atomic rename, so readers only ever observe completed writes. A
//! missing entry is not an error, and the orchestrator re-validates stored
//! output against the current policy before trusting it.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use noema_core::{EvaluationResult, NoemaError};

use crate::evaluator::Usage;
use crate::prompt::PROMPT_VERSION;
use crate::store::save_json;

/// One cached evaluator output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEvaluatorOutput {
    /// Model that produced the output.
    pub model: String,
    /// Prompt contract version at write time.
    pub prompt_version: String,
    /// The validated structured result.
    pub output: EvaluationResult,
    /// Raw response text, kept for auditing.
    pub raw_text: String,
    /// Token usage, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// RFC 3339 write timestamp.
    pub cached_at: String,
}

/// Cache key over everything that determines the evaluator output.
pub fn cache_key(dataset: &[u8], policy_json: &[u8], model: &str, sample_limit: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(dataset);
    hasher.update(policy_json);
    hasher.update(model.as_bytes());
    hasher.update(PROMPT_VERSION.as_bytes());
    hasher.update(format!("sample:{sample_limit}").as_bytes());
    hex::encode(hasher.finalize())
}

/// Path of a cache entry: `<runs_dir>/cache/<key>/gemini_output.json`.
pub fn cache_path(runs_dir: &Path, key: &str) -> PathBuf {
    runs_dir.join("cache").join(key).join("gemini_output.json")
}

/// Load a cache entry. Errors cover both a missing entry and a broken one;
/// callers distinguish by checking [`std::io::ErrorKind::NotFound`].
pub fn load_cache(runs_dir: &Path, key: &str) -> std::io::Result<CachedEvaluatorOutput> {
    let raw = std::fs::read(cache_path(runs_dir, key))?;
    serde_json::from_slice(&raw)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Write a cache entry atomically, stamping `cached_at` when unset.
pub fn save_cache(
    runs_dir: &Path,
    key: &str,
    mut out: CachedEvaluatorOutput,
) -> Result<(), NoemaError> {
    let path = cache_path(runs_dir, key);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if out.cached_at.is_empty() {
        out.cached_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    save_json(&path, &out)
}

/// Drop a cache entry; missing files are fine.
pub fn remove_cache_entry(runs_dir: &Path, key: &str) {
    let _ = std::fs::remove_file(cache_path(runs_dir, key));
}
