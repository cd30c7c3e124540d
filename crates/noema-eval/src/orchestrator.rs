//! # Evaluate Pipeline
//!
//! One request, strict order: validate → evaluate → commit → prove →
//! verify → persist → index. Proof work runs on the blocking pool; the
//! evaluator call is the only long-latency await and is bounded by the
//! caller's deadline (45 s when none is supplied).
//!
//! ## Failure policy
//!
//! Validation failures surface before anything touches disk. The run
//! directory is created only after the proof self-verifies; if persisting
//! fails the directory is removed before the index ever sees it. Evaluator
//! trouble of any kind degrades to the deterministic stub result: the
//! evaluator is optional, the proof is not.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use noema_core::{
    limits, parse_dataset, sample_dataset, stub_evaluation_result, validate_evaluation_result,
    validate_policy_config, DatasetDigest, EvaluationResult, NoemaConfig, NoemaError,
    PolicyConfig,
};
use noema_zkp::{
    commitment_poseidon, generate_proof, verify_proof, PolicyProof, PublicInputs, ZkError,
};

use crate::cache::{
    cache_key, load_cache, remove_cache_entry, save_cache, CachedEvaluatorOutput,
};
use crate::evaluator::{EvalRequest, Evaluator, ImageInput, DEFAULT_EVAL_TIMEOUT};
use crate::prompt::{build_system_prompt, build_user_prompt, eval_response_schema, PROMPT_VERSION};
use crate::store;
use crate::witness::build_policy_witness;

/// One evaluation request bundle. Created per request, consumed once.
#[derive(Debug, Clone)]
pub struct PolicyEvaluation {
    /// The policy to audit against.
    pub policy: PolicyConfig,
    /// Raw dataset bytes, exactly as uploaded.
    pub dataset: Vec<u8>,
    /// Uploaded images, 0..=10.
    pub images: Vec<ImageInput>,
    /// Caller-supplied evaluation result; when absent the evaluator (or
    /// the stub) produces one.
    pub evaluation_result: Option<EvaluationResult>,
    /// Caller deadline for the evaluator call.
    pub deadline: Option<Duration>,
}

/// The public face of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicOutput {
    pub overall_pass: bool,
    pub max_severity: u8,
    pub policy_threshold: u8,
    pub commitment: String,
}

/// Everything a completed run hands back to the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationArtifact {
    pub run_id: String,
    /// `PASS` or `FAIL`.
    pub status: String,
    pub public_output: PublicOutput,
    pub proof: PolicyProof,
    /// Result of the prover-side self-verification; always true for a
    /// returned artifact.
    pub verified: bool,
}

/// The policy evaluator orchestrator.
pub struct Orchestrator {
    config: NoemaConfig,
    evaluator: Option<Arc<dyn Evaluator>>,
}

impl Orchestrator {
    /// Build an orchestrator. `evaluator` is `None` when no API key is
    /// configured; every evaluation then uses caller results or the stub.
    pub fn new(config: NoemaConfig, evaluator: Option<Arc<dyn Evaluator>>) -> Self {
        Self { config, evaluator }
    }

    /// Run one evaluation end to end.
    pub async fn evaluate(&self, request: PolicyEvaluation) -> Result<EvaluationArtifact, NoemaError> {
        validate_policy_config(&request.policy)?;
        if request.images.len() > limits::MAX_IMAGES {
            return Err(NoemaError::bad_request(format!(
                "maximum {} images allowed",
                limits::MAX_IMAGES
            )));
        }
        let image_names: Vec<String> =
            request.images.iter().map(|i| i.filename.clone()).collect();
        let dataset = parse_dataset(&request.dataset, &image_names)?;

        let evaluation = match &request.evaluation_result {
            Some(result) => {
                validate_evaluation_result(result, &request.policy)?;
                result.clone()
            }
            None => self.resolve_evaluation(&request, &dataset).await,
        };

        let (overall_pass, max_severity, policy_threshold) =
            compute_policy_result(&evaluation, &request.policy);
        let status = if overall_pass { "PASS" } else { "FAIL" };

        let digest = DatasetDigest::of(&request.dataset);
        let witness = build_policy_witness(&request.policy, &evaluation, &digest)?;
        let commitment = commitment_poseidon(
            &witness.dataset_digest_hex,
            &witness.enabled,
            &witness.max_allowed,
            &witness.severity,
        )
        .map_err(zk_error)?;

        let public_inputs = PublicInputs {
            policy_threshold,
            max_severity,
            overall_pass,
            commitment: commitment.clone(),
        };

        let proof = {
            let pi = public_inputs.clone();
            let w = witness.clone();
            tokio::task::spawn_blocking(move || generate_proof(&pi, &w))
                .await
                .map_err(|e| NoemaError::ProofFailure(e.to_string()))?
                .map_err(zk_error)?
        };

        let verification = {
            let proof_b64 = proof.proof_b64.clone();
            let inputs_b64 = proof.public_inputs_b64.clone();
            tokio::task::spawn_blocking(move || verify_proof(&proof_b64, &inputs_b64))
                .await
                .map_err(|e| NoemaError::ProofFailure(e.to_string()))?
                .map_err(zk_error)?
        };
        if !verification.verified {
            tracing::error!(reason = %verification.message, "proof self-verification failed");
            return Err(NoemaError::ProofFailure(
                "proof verification failed".to_string(),
            ));
        }

        let run_id = self.persist_run(&request, &evaluation, &proof)?;
        tracing::info!(run_id = %run_id, status, commitment = %commitment, "evaluation complete");

        if let Err(e) = store::update_runs_index(
            &self.config.runs_dir,
            self.config.runs_index_limit,
            store::RunIndexEntry {
                run_id: run_id.clone(),
                status: status.to_string(),
                timestamp: Utc::now().timestamp(),
                evaluation_name: None,
            },
        ) {
            tracing::warn!("runs index update: {e}");
        }
        if let Err(e) = store::prune_runs(&self.config.runs_dir, self.config.runs_max) {
            tracing::warn!("prune runs: {e}");
        }

        Ok(EvaluationArtifact {
            run_id,
            status: status.to_string(),
            public_output: PublicOutput {
                overall_pass,
                max_severity,
                policy_threshold,
                commitment,
            },
            proof,
            verified: true,
        })
    }

    /// Obtain an evaluation result from the cache or the evaluator,
    /// degrading to the stub on any trouble.
    async fn resolve_evaluation(
        &self,
        request: &PolicyEvaluation,
        dataset: &noema_core::Dataset,
    ) -> EvaluationResult {
        let Some(evaluator) = &self.evaluator else {
            tracing::warn!("evaluator disabled: missing GEMINI_API_KEY");
            return stub_evaluation_result(&request.policy);
        };

        let policy_json = match serde_json::to_vec(&request.policy) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("evaluator fallback: marshal policy_config failed: {e}");
                return stub_evaluation_result(&request.policy);
            }
        };
        let sample_limit = self.config.sample_items;
        let model = evaluator.model().to_string();
        let key = cache_key(&request.dataset, &policy_json, &model, sample_limit);

        match load_cache(&self.config.runs_dir, &key) {
            Ok(cached) => {
                if validate_evaluation_result(&cached.output, &request.policy).is_ok() {
                    tracing::info!(key = %key, "evaluator cache hit");
                    return cached.output;
                }
                remove_cache_entry(&self.config.runs_dir, &key);
            }
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                remove_cache_entry(&self.config.runs_dir, &key);
            }
            Err(_) => {}
        }

        let sampled = sample_dataset(dataset, sample_limit);
        let sampled_json = match serde_json::to_vec_pretty(&sampled) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("evaluator fallback: marshal dataset failed: {e}");
                return stub_evaluation_result(&request.policy);
            }
        };

        let deadline = request.deadline.unwrap_or(DEFAULT_EVAL_TIMEOUT);
        let eval_request = EvalRequest {
            system_prompt: build_system_prompt(),
            user_prompt: build_user_prompt(&request.policy, &sampled_json, &request.images),
            response_schema: eval_response_schema(),
            images: request.images.clone(),
            temperature: 0.0,
            max_output_tokens: 2048,
            deadline,
        };

        tracing::info!(model = %model, sample_limit, "evaluator request");
        let response =
            match tokio::time::timeout(deadline, evaluator.evaluate(eval_request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    tracing::warn!("evaluator fallback: evaluate failed: {e}");
                    return stub_evaluation_result(&request.policy);
                }
                Err(_) => {
                    tracing::warn!("evaluator fallback: deadline exceeded");
                    return stub_evaluation_result(&request.policy);
                }
            };

        let output = match noema_core::parse_evaluation_result(&response.text) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("evaluator fallback: parse output failed: {e}");
                return stub_evaluation_result(&request.policy);
            }
        };
        if let Err(e) = validate_evaluation_result(&output, &request.policy) {
            tracing::warn!("evaluator fallback: validate output failed: {e}");
            return stub_evaluation_result(&request.policy);
        }

        if let Err(e) = save_cache(
            &self.config.runs_dir,
            &key,
            CachedEvaluatorOutput {
                model: response.model,
                prompt_version: PROMPT_VERSION.to_string(),
                output: output.clone(),
                raw_text: response.text,
                usage: response.usage,
                cached_at: String::new(),
            },
        ) {
            tracing::warn!("evaluator cache save: {e}");
        }

        output
    }

    /// Persist the run directory. Any failure removes the directory before
    /// the index ever references it.
    fn persist_run(
        &self,
        request: &PolicyEvaluation,
        evaluation: &EvaluationResult,
        proof: &PolicyProof,
    ) -> Result<String, NoemaError> {
        let (run_id, run_path) = store::create_run_dir(&self.config.runs_dir)?;
        let result = (|| -> Result<(), NoemaError> {
            store::save_file(&run_path.join("dataset.json"), &request.dataset)?;
            for (i, image) in request.images.iter().enumerate() {
                let ext = std::path::Path::new(&image.filename)
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| ".bin".to_string());
                store::save_file(&run_path.join(format!("image_{i}{ext}")), &image.data)?;
            }
            store::save_json(&run_path.join("policy_config.json"), &request.policy)?;
            store::save_json(&run_path.join("evaluation_result.json"), evaluation)?;

            let public_inputs = BASE64
                .decode(&proof.public_inputs_b64)
                .map_err(|e| NoemaError::ProofFailure(e.to_string()))?;
            store::save_file(&run_path.join("public_inputs.txt"), &public_inputs)?;
            let proof_bytes = BASE64
                .decode(&proof.proof_b64)
                .map_err(|e| NoemaError::ProofFailure(e.to_string()))?;
            store::save_file(&run_path.join("proof.bin"), &proof_bytes)?;
            Ok(())
        })();

        if let Err(e) = result {
            let _ = std::fs::remove_dir_all(&run_path);
            tracing::error!(run_id = %run_id, "failed to persist run: {e}");
            return Err(e);
        }
        Ok(run_id)
    }
}

/// Deterministic policy aggregation over enabled constraints:
/// `(overall_pass, max_severity, policy_threshold)`. With no enabled
/// constraints the check passes vacuously and both aggregates are 0.
pub fn compute_policy_result(
    out: &EvaluationResult,
    cfg: &PolicyConfig,
) -> (bool, u8, u8) {
    let enabled: Vec<_> = cfg.constraints.iter().filter(|c| c.enabled).collect();
    if enabled.is_empty() {
        return (true, 0, 0);
    }
    let mut overall_pass = true;
    let mut max_severity = 0u8;
    let mut policy_threshold = 2u8;
    for constraint in enabled {
        policy_threshold = policy_threshold.min(constraint.max_allowed);
        let severity = out
            .result_for(&constraint.id)
            .map(|r| r.severity)
            .unwrap_or(0);
        max_severity = max_severity.max(severity);
        if severity > constraint.max_allowed {
            overall_pass = false;
        }
    }
    (overall_pass, max_severity, policy_threshold)
}

fn zk_error(err: ZkError) -> NoemaError {
    match err {
        ZkError::CommitmentMismatch => NoemaError::CommitmentMismatch,
        ZkError::Setup(msg) => NoemaError::VerifierInit(msg),
        other => NoemaError::ProofFailure(other.to_string()),
    }
}
