//! # Witness Inputs
//!
//! Private inputs for the policy-gate circuit: the dataset digest and the
//! fixed-length `(enabled, max_allowed, severity)` slot arrays in canonical
//! constraint order. The orchestrator owns the transient witness and
//! disposes of it after proof generation.

use ark_bn254::Fr;

use noema_crypto::fr_from_be_bytes;

use crate::circuit::CONSTRAINT_SLOTS;
use crate::error::ZkError;

/// Private witness for one evaluation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessInputs {
    /// SHA-256 of the raw dataset bytes, 64 lowercase hex characters.
    pub dataset_digest_hex: String,
    /// Per-slot enabled flags (0 or 1).
    pub enabled: [u64; CONSTRAINT_SLOTS],
    /// Per-slot maximum tolerated severities (0..=2).
    pub max_allowed: [u64; CONSTRAINT_SLOTS],
    /// Per-slot observed severities (0..=2).
    pub severity: [u64; CONSTRAINT_SLOTS],
}

/// Split a 32-byte digest into `(lo, hi)` field limbs: `hi` is the first
/// 16 bytes big-endian, `lo` the last 16.
pub(crate) fn dataset_digest_limbs(digest_hex: &str) -> Result<(Fr, Fr), ZkError> {
    let bytes = hex::decode(digest_hex)
        .map_err(|_| ZkError::InvalidWitness("dataset digest must be hex".to_string()))?;
    if bytes.len() != 32 {
        return Err(ZkError::InvalidWitness(
            "dataset digest must be 32 bytes".to_string(),
        ));
    }
    let hi = fr_from_be_bytes(&bytes[..16]);
    let lo = fr_from_be_bytes(&bytes[16..]);
    Ok((lo, hi))
}
