//! # BN254 Scalar-Field Helpers
//!
//! Thin conversions around `ark_bn254::Fr`: reduction of arbitrary
//! big-endian byte strings into the field, fixed-width rendering, and the
//! commitment hex form.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};

/// Reduce an arbitrary big-endian byte string into the scalar field.
pub fn fr_from_be_bytes(bytes: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

/// Fixed-width (32-byte) big-endian rendering of a field element.
pub fn fr_to_be_bytes(x: &Fr) -> [u8; 32] {
    let bytes = x.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Commitment rendering: `0x` + minimal even-length lowercase hex.
///
/// Leading zero bytes are stripped (not zero nibbles), so the result always
/// has even length; the zero element renders as `0x00`.
pub fn fr_to_commitment_hex(x: &Fr) -> String {
    let bytes = fr_to_be_bytes(x);
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(31);
    format!("0x{}", hex::encode(&bytes[first..]))
}
