//! # noema-eval — Policy Evaluator Orchestration
//!
//! Drives one evaluation end to end: validate the request, obtain an
//! evaluation result (caller-supplied, cached, or from the external
//! evaluator with stub fallback), aggregate the policy decision, assemble
//! the witness, compute the commitment, generate and self-verify the
//! proof, and persist the run.
//!
//! ## Ordering
//!
//! Within one request the order is strict: validate → evaluate → commit →
//! prove → verify → persist → index. Requests are independent; the cache
//! and run store coordinate purely through atomic renames.

pub mod cache;
pub mod evaluator;
pub mod gemini;
pub mod orchestrator;
pub mod prompt;
pub mod store;
pub mod witness;

pub use evaluator::{EvalRequest, EvalResponse, Evaluator, ImageInput, Usage};
pub use gemini::GeminiEvaluator;
pub use orchestrator::{
    compute_policy_result, EvaluationArtifact, Orchestrator, PolicyEvaluation, PublicOutput,
};
pub use witness::build_policy_witness;
