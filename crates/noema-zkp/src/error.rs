//! # Proof-Subsystem Errors
//!
//! Error kinds for proving and verification. The human-readable messages
//! are part of the verify API surface: benign rejections (a proof that
//! simply does not verify, a malformed public-input payload) are *not*
//! errors and surface through [`crate::proof::Verification`]. Errors here
//! mean the caller handed us something unusable or the prover itself
//! failed.

use thiserror::Error;

use noema_crypto::PoseidonError;

/// Errors from the policy-gate proof subsystem.
#[derive(Error, Debug)]
pub enum ZkError {
    /// Proof or public inputs were absent.
    #[error("missing proof or public inputs")]
    MissingInput,

    /// The proof bytes were not valid base64 or did not deserialize.
    #[error("invalid proof encoding")]
    InvalidProofEncoding,

    /// The public-input payload was not valid base64.
    #[error("invalid public inputs encoding")]
    InvalidPublicInputsEncoding,

    /// Encode-side public-input validation failure.
    #[error("{0}")]
    InvalidPublicInputs(String),

    /// Commitment string failed to parse (missing `0x`, bad hex, empty).
    #[error("{0}")]
    InvalidCommitment(String),

    /// Witness-side input failure (dataset digest malformed, arity drift).
    #[error("{0}")]
    InvalidWitness(String),

    /// The claimed commitment does not match the witness recomputation.
    #[error("commitment does not match witness inputs")]
    CommitmentMismatch,

    /// One-shot circuit compilation or trusted setup failed.
    #[error("verifier init failed: {0}")]
    Setup(String),

    /// The proving backend failed.
    #[error("proving failed: {0}")]
    Prover(String),
}

impl From<PoseidonError> for ZkError {
    fn from(err: PoseidonError) -> Self {
        Self::InvalidWitness(err.to_string())
    }
}
