//! # Native Commitment Engine
//!
//! Recomputes the policy-gate commitment outside the circuit, over the same
//! preimage with the same two-level chunking. The contract is byte-exact
//! agreement with the in-circuit hash for every input; the prover checks
//! itself against this before spending any proving time.

use ark_bn254::Fr;

use noema_crypto::{fr_from_be_bytes, fr_to_commitment_hex, poseidon_hash_chunked};

use crate::circuit::{CONSTRAINT_SLOTS, DOMAIN_SEPARATOR};
use crate::error::ZkError;
use crate::witness::dataset_digest_limbs;

/// Compute the commitment for a witness: `0x` + even-length lowercase hex
/// of `poseidon_chunked([D, lo, hi, enabled…, max_allowed…, severity…])`.
pub fn commitment_poseidon(
    dataset_digest_hex: &str,
    enabled: &[u64; CONSTRAINT_SLOTS],
    max_allowed: &[u64; CONSTRAINT_SLOTS],
    severity: &[u64; CONSTRAINT_SLOTS],
) -> Result<String, ZkError> {
    let (lo, hi) = dataset_digest_limbs(dataset_digest_hex)?;

    let mut inputs = Vec::with_capacity(3 + 3 * CONSTRAINT_SLOTS);
    inputs.push(Fr::from(DOMAIN_SEPARATOR));
    inputs.push(lo);
    inputs.push(hi);
    inputs.extend(enabled.iter().map(|&v| Fr::from(v)));
    inputs.extend(max_allowed.iter().map(|&v| Fr::from(v)));
    inputs.extend(severity.iter().map(|&v| Fr::from(v)));

    let hash = poseidon_hash_chunked(&inputs)?;
    Ok(fr_to_commitment_hex(&hash))
}

/// Parse a `0x`-prefixed hex commitment into a field element.
pub(crate) fn parse_commitment_hex(commitment: &str) -> Result<Fr, ZkError> {
    let hex_str = commitment
        .strip_prefix("0x")
        .ok_or_else(|| ZkError::InvalidCommitment("commitment must have 0x prefix".to_string()))?;
    if hex_str.is_empty() {
        return Err(ZkError::InvalidCommitment("commitment required".to_string()));
    }
    let bytes = hex::decode(hex_str)
        .map_err(|_| ZkError::InvalidCommitment("commitment must be hex".to_string()))?;
    Ok(fr_from_be_bytes(&bytes))
}
