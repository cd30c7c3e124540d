//! # Public-Input Codec
//!
//! The stable, versioned wire format for the circuit's public wires:
//!
//! ```text
//! noema_public_inputs_v1|pt=<0..2>|ms=<0..2>|op=<0|1>|c=0x<hex>
//! ```
//!
//! Encoding is canonical (field order fixed); decoding is strict: missing
//! prefix, missing or duplicate fields, unknown field names, out-of-range
//! values, and malformed commitments are all rejected. Decoding then
//! re-encoding any valid payload is the byte identity.

use serde::{Deserialize, Serialize};

use crate::error::ZkError;

/// Version prefix of the public-input payload.
pub const PUBLIC_INPUTS_PREFIX: &str = "noema_public_inputs_v1|";

/// The circuit's public wires plus the policy threshold the verifier
/// displays alongside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    /// Minimum `max_allowed` across enabled constraints (0 if none).
    pub policy_threshold: u8,
    /// Maximum observed severity among enabled constraints.
    pub max_severity: u8,
    /// The claimed pass bit.
    pub overall_pass: bool,
    /// Poseidon commitment, `0x`-prefixed lowercase hex.
    pub commitment: String,
}

/// Encode public inputs as UTF-8 payload bytes.
pub fn encode_public_inputs(pi: &PublicInputs) -> Result<Vec<u8>, ZkError> {
    if pi.policy_threshold > 2 {
        return Err(ZkError::InvalidPublicInputs(
            "policy threshold must be 0..2".to_string(),
        ));
    }
    if pi.max_severity > 2 {
        return Err(ZkError::InvalidPublicInputs(
            "max severity must be 0..2".to_string(),
        ));
    }
    if pi.commitment.is_empty() {
        return Err(ZkError::InvalidPublicInputs(
            "commitment required".to_string(),
        ));
    }
    let payload = format!(
        "{PUBLIC_INPUTS_PREFIX}pt={}|ms={}|op={}|c={}",
        pi.policy_threshold,
        pi.max_severity,
        u8::from(pi.overall_pass),
        pi.commitment
    );
    Ok(payload.into_bytes())
}

/// Decode a payload, strictly.
pub fn decode_public_inputs(raw: &[u8]) -> Result<PublicInputs, ZkError> {
    let s = std::str::from_utf8(raw)
        .map_err(|_| ZkError::InvalidPublicInputs("payload must be UTF-8".to_string()))?;
    let rest = s.strip_prefix(PUBLIC_INPUTS_PREFIX).ok_or_else(|| {
        ZkError::InvalidPublicInputs("invalid public inputs prefix".to_string())
    })?;

    let mut policy_threshold = None;
    let mut max_severity = None;
    let mut overall_pass = None;
    let mut commitment = None;

    for field in rest.split('|') {
        let (key, value) = field.split_once('=').ok_or_else(|| {
            ZkError::InvalidPublicInputs("invalid public inputs field".to_string())
        })?;
        match key {
            "pt" => {
                if policy_threshold.is_some() {
                    return Err(ZkError::InvalidPublicInputs(
                        "duplicate policy threshold".to_string(),
                    ));
                }
                policy_threshold = Some(parse_ranged(value, 2, "policy threshold")?);
            }
            "ms" => {
                if max_severity.is_some() {
                    return Err(ZkError::InvalidPublicInputs(
                        "duplicate max severity".to_string(),
                    ));
                }
                max_severity = Some(parse_ranged(value, 2, "max severity")?);
            }
            "op" => {
                if overall_pass.is_some() {
                    return Err(ZkError::InvalidPublicInputs(
                        "duplicate overall pass".to_string(),
                    ));
                }
                overall_pass = Some(parse_ranged(value, 1, "overall pass")? == 1);
            }
            "c" => {
                if commitment.is_some() {
                    return Err(ZkError::InvalidPublicInputs(
                        "duplicate commitment".to_string(),
                    ));
                }
                if value.is_empty() {
                    return Err(ZkError::InvalidPublicInputs(
                        "commitment required".to_string(),
                    ));
                }
                let hex_str = value.strip_prefix("0x").ok_or_else(|| {
                    ZkError::InvalidPublicInputs("commitment must have 0x prefix".to_string())
                })?;
                if hex::decode(hex_str).is_err() {
                    return Err(ZkError::InvalidPublicInputs(
                        "commitment must be hex".to_string(),
                    ));
                }
                commitment = Some(value.to_string());
            }
            _ => {
                return Err(ZkError::InvalidPublicInputs(
                    "unknown public inputs field".to_string(),
                ));
            }
        }
    }

    match (policy_threshold, max_severity, overall_pass, commitment) {
        (Some(policy_threshold), Some(max_severity), Some(overall_pass), Some(commitment)) => {
            Ok(PublicInputs {
                policy_threshold,
                max_severity,
                overall_pass,
                commitment,
            })
        }
        _ => Err(ZkError::InvalidPublicInputs(
            "missing public inputs field".to_string(),
        )),
    }
}

fn parse_ranged(value: &str, max: u8, what: &str) -> Result<u8, ZkError> {
    let parsed: u8 = value
        .parse()
        .map_err(|_| ZkError::InvalidPublicInputs(format!("invalid {what}")))?;
    if parsed > max {
        return Err(ZkError::InvalidPublicInputs(format!(
            "{what} must be 0..{max}"
        )));
    }
    Ok(parsed)
}
