//! # noema-zkp — Policy-Gate Proof Subsystem
//!
//! Proves that a deterministic policy check was computed honestly over a
//! dataset and an evaluation result whose contents stay private. A verifier
//! holding only the public outputs (overall pass/fail, max observed
//! severity, and a Poseidon commitment) validates the proof without seeing
//! the dataset, the policy configuration, or the per-constraint severities.
//!
//! ## Pieces
//!
//! - [`circuit`] — the fixed-arity Groth16 circuit over BN254 enforcing
//!   range tags, the per-constraint gate, the aggregates, and the
//!   commitment binding.
//! - [`commitment`] — the native Poseidon commitment, byte-identical to
//!   the in-circuit computation.
//! - [`proof`] — one-shot setup cached for the process lifetime, proof
//!   generation, and verification from base64 inputs.
//! - [`public_inputs`] — the stable `noema_public_inputs_v1` wire format.
//!
//! ## Soundness note
//!
//! The circuit never requires `overall_pass = 1`; it proves the prover
//! knows a witness consistent with the *claimed* public outputs. Both PASS
//! and FAIL runs are provable.

pub mod circuit;
pub mod commitment;
pub mod error;
pub mod gadget;
pub mod proof;
pub mod public_inputs;
pub mod witness;

pub use circuit::{PolicyGateCircuit, CONSTRAINT_SLOTS, DOMAIN_SEPARATOR};
pub use commitment::commitment_poseidon;
pub use error::ZkError;
pub use proof::{
    generate_proof, verify_proof, verifying_key_fingerprint, PolicyProof, Verification,
    PROOF_CURVE, PROOF_SYSTEM,
};
pub use public_inputs::{decode_public_inputs, encode_public_inputs, PublicInputs};
pub use witness::WitnessInputs;
