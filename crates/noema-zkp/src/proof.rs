//! # Proof Lifecycle
//!
//! Groth16 over BN254: one-shot setup cached for the process lifetime,
//! proof generation from a full witness, and verification from base64
//! inputs. All provers and verifiers share the cached keys read-only.
//!
//! The in-process trusted setup draws fresh randomness at first use, which
//! is acceptable for local dev and demos only. Production deployments load
//! a pre-generated key pair and pin the verifying-key fingerprint exposed
//! by `GET /about`.

use std::sync::OnceLock;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::circuit::PolicyGateCircuit;
use crate::commitment::{commitment_poseidon, parse_commitment_hex};
use crate::error::ZkError;
use crate::public_inputs::{decode_public_inputs, encode_public_inputs, PublicInputs};
use crate::witness::{dataset_digest_limbs, WitnessInputs};

/// Proof-system identifier reported in artifacts.
pub const PROOF_SYSTEM: &str = "groth16";

/// Curve identifier reported in artifacts.
pub const PROOF_CURVE: &str = "bn254";

/// A generated proof bundle: base64 proof bytes plus the encoded public
/// inputs they verify against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyProof {
    /// Always [`PROOF_SYSTEM`].
    pub system: String,
    /// Always [`PROOF_CURVE`].
    pub curve: String,
    /// Base64 (standard alphabet) of the compressed Groth16 proof.
    pub proof_b64: String,
    /// Base64 of the `noema_public_inputs_v1` payload.
    pub public_inputs_b64: String,
}

/// Verification outcome with its human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// Whether the proof verified against the decoded public inputs.
    pub verified: bool,
    /// `"verified"`, or the rejection reason.
    pub message: String,
}

struct Groth16Context {
    pk: ProvingKey<Bn254>,
    vk: VerifyingKey<Bn254>,
    pvk: PreparedVerifyingKey<Bn254>,
}

/// Compile the circuit and run the trusted setup, once per process.
fn groth16_context() -> Result<&'static Groth16Context, ZkError> {
    static CONTEXT: OnceLock<Result<Groth16Context, String>> = OnceLock::new();
    let slot = CONTEXT.get_or_init(|| {
        tracing::info!("compiling policy-gate circuit and running groth16 setup");
        let mut rng = rand::thread_rng();
        let (pk, vk) =
            Groth16::<Bn254>::circuit_specific_setup(PolicyGateCircuit::default(), &mut rng)
                .map_err(|e| e.to_string())?;
        let pvk = Groth16::<Bn254>::process_vk(&vk).map_err(|e| e.to_string())?;
        Ok(Groth16Context { pk, vk, pvk })
    });
    slot.as_ref().map_err(|e| ZkError::Setup(e.clone()))
}

/// Generate a proof for the claimed public inputs over the given witness.
///
/// The commitment is recomputed from the witness first; a mismatch with the
/// claimed commitment fails before any proving work starts.
pub fn generate_proof(pi: &PublicInputs, witness: &WitnessInputs) -> Result<PolicyProof, ZkError> {
    let encoded_public = encode_public_inputs(pi)?;
    let ctx = groth16_context()?;

    let commitment = parse_commitment_hex(&pi.commitment)?;
    let computed = commitment_poseidon(
        &witness.dataset_digest_hex,
        &witness.enabled,
        &witness.max_allowed,
        &witness.severity,
    )?;
    if !computed.eq_ignore_ascii_case(&pi.commitment) {
        return Err(ZkError::CommitmentMismatch);
    }

    let (lo, hi) = dataset_digest_limbs(&witness.dataset_digest_hex)?;
    let circuit = PolicyGateCircuit {
        dataset_digest_lo: Some(lo),
        dataset_digest_hi: Some(hi),
        enabled: witness.enabled.map(|v| Some(Fr::from(v))),
        max_allowed: witness.max_allowed.map(|v| Some(Fr::from(v))),
        severity: witness.severity.map(|v| Some(Fr::from(v))),
        commitment: Some(commitment),
        overall_pass: Some(Fr::from(u64::from(pi.overall_pass))),
        max_severity: Some(Fr::from(u64::from(pi.max_severity))),
    };

    let mut rng = rand::thread_rng();
    let proof = Groth16::<Bn254>::prove(&ctx.pk, circuit, &mut rng)
        .map_err(|e| ZkError::Prover(e.to_string()))?;

    let mut proof_bytes = Vec::new();
    proof
        .serialize_compressed(&mut proof_bytes)
        .map_err(|e| ZkError::Prover(e.to_string()))?;

    Ok(PolicyProof {
        system: PROOF_SYSTEM.to_string(),
        curve: PROOF_CURVE.to_string(),
        proof_b64: BASE64.encode(&proof_bytes),
        public_inputs_b64: BASE64.encode(&encoded_public),
    })
}

/// Verify a base64 proof against base64 public inputs.
///
/// Malformed *inputs* are errors; a well-formed proof that simply fails to
/// verify (or a payload that decodes but violates the wire grammar) is a
/// benign `verified: false` outcome with a reason.
pub fn verify_proof(proof_b64: &str, public_inputs_b64: &str) -> Result<Verification, ZkError> {
    if proof_b64.is_empty() || public_inputs_b64.is_empty() {
        return Err(ZkError::MissingInput);
    }
    let proof_raw = BASE64
        .decode(proof_b64)
        .map_err(|_| ZkError::InvalidProofEncoding)?;
    let public_raw = BASE64
        .decode(public_inputs_b64)
        .map_err(|_| ZkError::InvalidPublicInputsEncoding)?;

    let pi = match decode_public_inputs(&public_raw) {
        Ok(pi) => pi,
        Err(_) => {
            return Ok(Verification {
                verified: false,
                message: "invalid public inputs format".to_string(),
            });
        }
    };

    let ctx = groth16_context()?;
    let commitment = parse_commitment_hex(&pi.commitment)?;
    let proof = Proof::<Bn254>::deserialize_compressed(proof_raw.as_slice())
        .map_err(|_| ZkError::InvalidProofEncoding)?;

    let public_wires = [
        commitment,
        Fr::from(u64::from(pi.overall_pass)),
        Fr::from(u64::from(pi.max_severity)),
    ];
    let ok = Groth16::<Bn254>::verify_with_processed_vk(&ctx.pvk, &public_wires, &proof)
        .map_err(|e| ZkError::Prover(e.to_string()))?;

    if ok {
        Ok(Verification {
            verified: true,
            message: "verified".to_string(),
        })
    } else {
        Ok(Verification {
            verified: false,
            message: "invalid proof".to_string(),
        })
    }
}

/// SHA-256 fingerprint of the compressed verifying key, lowercase hex.
pub fn verifying_key_fingerprint() -> Result<String, ZkError> {
    let ctx = groth16_context()?;
    let mut bytes = Vec::new();
    ctx.vk
        .serialize_compressed(&mut bytes)
        .map_err(|e| ZkError::Setup(e.to_string()))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::CONSTRAINT_SLOTS;

    const DIGEST: &str = "00112233445566778899aabbccddeeffffeeddccbbaa99887766554433221100";

    fn witness(
        enabled: [u64; CONSTRAINT_SLOTS],
        max_allowed: [u64; CONSTRAINT_SLOTS],
        severity: [u64; CONSTRAINT_SLOTS],
    ) -> WitnessInputs {
        WitnessInputs {
            dataset_digest_hex: DIGEST.to_string(),
            enabled,
            max_allowed,
            severity,
        }
    }

    fn public_inputs(
        w: &WitnessInputs,
        policy_threshold: u8,
        max_severity: u8,
        overall_pass: bool,
    ) -> PublicInputs {
        let commitment =
            commitment_poseidon(&w.dataset_digest_hex, &w.enabled, &w.max_allowed, &w.severity)
                .unwrap();
        PublicInputs {
            policy_threshold,
            max_severity,
            overall_pass,
            commitment,
        }
    }

    #[test]
    fn pass_run_proves_and_verifies() {
        let w = witness([1, 1, 1, 0, 1, 0], [1, 2, 0, 1, 2, 0], [1, 2, 0, 2, 1, 2]);
        let pi = public_inputs(&w, 0, 2, true);
        let proof = generate_proof(&pi, &w).unwrap();
        assert_eq!(proof.system, "groth16");
        assert_eq!(proof.curve, "bn254");

        let outcome = verify_proof(&proof.proof_b64, &proof.public_inputs_b64).unwrap();
        assert!(outcome.verified, "reason: {}", outcome.message);
        assert_eq!(outcome.message, "verified");
    }

    #[test]
    fn fail_run_is_also_provable() {
        let w = witness([1, 1, 0, 0, 0, 0], [1, 2, 0, 0, 0, 0], [2, 2, 0, 0, 0, 0]);
        let pi = public_inputs(&w, 1, 2, false);
        let proof = generate_proof(&pi, &w).unwrap();
        let outcome = verify_proof(&proof.proof_b64, &proof.public_inputs_b64).unwrap();
        assert!(outcome.verified);
    }

    #[test]
    fn commitment_mismatch_rejected_before_proving() {
        let w = witness([1, 0, 0, 0, 0, 0], [2, 0, 0, 0, 0, 0], [1, 0, 0, 0, 0, 0]);
        let mut pi = public_inputs(&w, 2, 1, true);
        pi.commitment = "0xdeadbeef".to_string();
        match generate_proof(&pi, &w) {
            Err(ZkError::CommitmentMismatch) => {}
            other => panic!("expected CommitmentMismatch, got {other:?}"),
        }
    }

    #[test]
    fn tampered_commitment_nibble_fails_verification() {
        let w = witness([1, 1, 0, 0, 0, 0], [1, 2, 0, 0, 0, 0], [1, 2, 0, 0, 0, 0]);
        let pi = public_inputs(&w, 1, 2, true);
        let proof = generate_proof(&pi, &w).unwrap();

        let payload = BASE64.decode(&proof.public_inputs_b64).unwrap();
        let mut text = String::from_utf8(payload).unwrap();
        // Flip the last nibble of the commitment hex.
        let last = text.pop().unwrap();
        text.push(if last == '0' { '1' } else { '0' });
        let tampered = BASE64.encode(text.as_bytes());

        let outcome = verify_proof(&proof.proof_b64, &tampered).unwrap();
        assert!(!outcome.verified);
        assert_eq!(outcome.message, "invalid proof");
    }

    #[test]
    fn tampered_pass_bit_fails_verification() {
        let w = witness([1, 0, 0, 0, 0, 0], [1, 0, 0, 0, 0, 0], [2, 0, 0, 0, 0, 0]);
        let pi = public_inputs(&w, 1, 2, false);
        let proof = generate_proof(&pi, &w).unwrap();

        let payload = BASE64.decode(&proof.public_inputs_b64).unwrap();
        let text = String::from_utf8(payload).unwrap().replace("op=0", "op=1");
        let tampered = BASE64.encode(text.as_bytes());

        let outcome = verify_proof(&proof.proof_b64, &tampered).unwrap();
        assert!(!outcome.verified);
    }

    #[test]
    fn missing_inputs_are_errors() {
        assert!(matches!(verify_proof("", ""), Err(ZkError::MissingInput)));
        assert!(matches!(
            verify_proof("abc", ""),
            Err(ZkError::MissingInput)
        ));
    }

    #[test]
    fn invalid_base64_is_an_error() {
        assert!(matches!(
            verify_proof("!!!not-base64!!!", "YWJj"),
            Err(ZkError::InvalidProofEncoding)
        ));
        assert!(matches!(
            verify_proof("YWJj", "!!!not-base64!!!"),
            Err(ZkError::InvalidPublicInputsEncoding)
        ));
    }

    #[test]
    fn undecodable_payload_is_benign_rejection() {
        // Valid base64 of a payload violating the wire grammar.
        let bogus = BASE64.encode(b"noema_public_inputs_v1|pt=9|ms=1|op=1|c=0xabc");
        let outcome = verify_proof(&BASE64.encode(b"junk"), &bogus).unwrap();
        assert!(!outcome.verified);
        assert_eq!(outcome.message, "invalid public inputs format");
    }

    #[test]
    fn garbage_proof_bytes_are_an_encoding_error() {
        let w = witness([1, 0, 0, 0, 0, 0], [2, 0, 0, 0, 0, 0], [0, 0, 0, 0, 0, 0]);
        let pi = public_inputs(&w, 2, 0, true);
        let encoded = BASE64.encode(encode_public_inputs(&pi).unwrap());
        let garbage = BASE64.encode([0u8; 16]);
        assert!(matches!(
            verify_proof(&garbage, &encoded),
            Err(ZkError::InvalidProofEncoding)
        ));
    }

    #[test]
    fn fingerprint_is_stable_within_process() {
        let a = verifying_key_fingerprint().unwrap();
        let b = verifying_key_fingerprint().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
