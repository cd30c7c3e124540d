//! # noema-crypto — Field & Poseidon Primitives
//!
//! Arithmetic over the BN254 scalar field and the Poseidon-π hash used for
//! the policy-gate commitment. The same parameter source feeds both the
//! native hasher here and the in-circuit gadget in `noema-zkp`, so the two
//! computations agree byte for byte.
//!
//! ## Parameter provenance
//!
//! Round constants and MDS matrices are derived at first use by the
//! published Grain-LFSR procedure of the Poseidon reference implementation
//! (the same generator that produced the circomlib tables), rather than
//! embedded. See [`grain`] for the derivation and [`poseidon`] for the
//! permutation and the two-level chunking rule.

pub mod field;
pub mod grain;
pub mod poseidon;

pub use field::{fr_from_be_bytes, fr_to_be_bytes, fr_to_commitment_hex};
pub use poseidon::{
    params_for_width, poseidon_hash, poseidon_hash_chunked, PoseidonError, PoseidonParams,
    FULL_ROUNDS, MAX_ARITY,
};
