//! # Error Kinds — Shared Failure Taxonomy
//!
//! One enum per failure *kind*, not per failing call site. The HTTP layer
//! maps kinds to status codes; everything below it propagates with `?`.
//!
//! ## Policy
//!
//! - Validation failures carry precise human messages and leave no
//!   artifacts on disk.
//! - `ProofFailure` is fatal and logged; it is never masked as success.
//! - `ExternalEvaluator` is transient and triggers the stub fallback.

use thiserror::Error;

/// Top-level error type for the Noema service.
#[derive(Error, Debug)]
pub enum NoemaError {
    /// Request-level validation failure (malformed config, dataset, or
    /// evaluation result).
    #[error("{0}")]
    BadRequest(String),

    /// A policy constraint id outside the canonical ordering.
    #[error("unsupported constraint id: {0}")]
    UnsupportedConstraint(String),

    /// An enabled constraint has no evaluation result.
    #[error("missing evaluation result for {0}")]
    MissingResult(String),

    /// The claimed commitment does not match the witness recomputation.
    #[error("commitment does not match witness inputs")]
    CommitmentMismatch,

    /// Proof generation or the prover-side self-verification failed.
    #[error("proof generation failed: {0}")]
    ProofFailure(String),

    /// The one-shot circuit compilation / trusted setup failed.
    #[error("verifier init failed: {0}")]
    VerifierInit(String),

    /// A request body or upload exceeded its size limit.
    #[error("{0}")]
    Oversized(String),

    /// The external evaluator was unreachable, timed out, or returned
    /// output that failed schema validation. Transient; callers fall back
    /// to the stub result.
    #[error("evaluator unavailable: {0}")]
    ExternalEvaluator(String),

    /// Filesystem failure in the run store or cache.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl NoemaError {
    /// Shorthand for a validation failure.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
}
