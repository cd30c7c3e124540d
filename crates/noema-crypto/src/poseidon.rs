//! # Poseidon-π over BN254
//!
//! Width-`t` Poseidon permutation (`t = arity + 1`, S-box `x^5`, 8 full
//! rounds, per-width partial rounds from a fixed table) and the single-call
//! hash: absorb into `[0, x₁, …, xₖ]`, permute once, output lane 0.
//!
//! ## Chunking rule
//!
//! Input sequences longer than 16 elements are hashed in exactly two
//! levels: the first 16 elements are hashed to `h`, then `(h, x₁₇, …)` is
//! hashed. The circuit enforces the same pattern, so this rule is protocol,
//! not implementation detail.

use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_ff::{Field, Zero};
use thiserror::Error;

use crate::grain;

/// Largest supported arity for a single permutation.
pub const MAX_ARITY: usize = 16;

/// Full rounds for every supported width.
pub const FULL_ROUNDS: usize = 8;

/// Partial-round counts for widths t = 2..=17.
const PARTIAL_ROUNDS: [usize; 16] = [56, 57, 56, 60, 60, 63, 64, 63, 60, 66, 60, 65, 70, 60, 64, 68];

/// Poseidon hashing errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PoseidonError {
    /// The input sequence length has no supported permutation width.
    #[error("unsupported poseidon arity: {0}")]
    UnsupportedArity(usize),
}

/// Derived parameters for one permutation width.
#[derive(Debug, Clone)]
pub struct PoseidonParams {
    /// State width `t`.
    pub width: usize,
    /// Number of full rounds.
    pub full_rounds: usize,
    /// Number of partial rounds.
    pub partial_rounds: usize,
    /// Round constants, round-major: `constants[round * width + lane]`.
    pub round_constants: Vec<Fr>,
    /// MDS matrix, `mds[row][col]`.
    pub mds: Vec<Vec<Fr>>,
}

impl PoseidonParams {
    fn derive(width: usize) -> Self {
        let partial_rounds = PARTIAL_ROUNDS[width - 2];
        Self {
            width,
            full_rounds: FULL_ROUNDS,
            partial_rounds,
            round_constants: grain::round_constants(width, FULL_ROUNDS, partial_rounds),
            mds: grain::mds_matrix(width),
        }
    }
}

/// Parameters for width `t`, derived on first use and cached for the
/// process lifetime. Panics for widths outside 2..=17.
pub fn params_for_width(t: usize) -> &'static PoseidonParams {
    static CELLS: [OnceLock<PoseidonParams>; 16] = [const { OnceLock::new() }; 16];
    assert!(
        (2..=MAX_ARITY + 1).contains(&t),
        "poseidon width {t} outside 2..=17"
    );
    CELLS[t - 2].get_or_init(|| PoseidonParams::derive(t))
}

fn sbox(x: Fr) -> Fr {
    let x2 = x.square();
    let x4 = x2.square();
    x4 * x
}

/// Apply the full permutation in place. `state.len()` must equal the
/// parameter width.
pub fn permute(state: &mut [Fr], params: &PoseidonParams) {
    let t = params.width;
    debug_assert_eq!(state.len(), t);
    let half = params.full_rounds / 2;
    let rounds = params.full_rounds + params.partial_rounds;

    let mut mixed = vec![Fr::zero(); t];
    for round in 0..rounds {
        for (lane, value) in state.iter_mut().enumerate() {
            *value += params.round_constants[round * t + lane];
        }
        let full = round < half || round >= half + params.partial_rounds;
        if full {
            for value in state.iter_mut() {
                *value = sbox(*value);
            }
        } else {
            state[0] = sbox(state[0]);
        }
        for (row, out) in mixed.iter_mut().enumerate() {
            let mut acc = Fr::zero();
            for (col, value) in state.iter().enumerate() {
                acc += params.mds[row][col] * value;
            }
            *out = acc;
        }
        state.copy_from_slice(&mixed);
    }
}

/// Single-call hash of 1..=16 field elements.
pub fn poseidon_hash(inputs: &[Fr]) -> Result<Fr, PoseidonError> {
    if inputs.is_empty() || inputs.len() > MAX_ARITY {
        return Err(PoseidonError::UnsupportedArity(inputs.len()));
    }
    let params = params_for_width(inputs.len() + 1);
    let mut state = vec![Fr::zero(); params.width];
    state[1..].copy_from_slice(inputs);
    permute(&mut state, params);
    Ok(state[0])
}

/// Two-level chunked hash for sequences longer than 16 elements.
///
/// Sequences of at most 16 elements hash directly; longer sequences hash
/// the first 16 to `h` and then hash `(h, x₁₇, …)`. The tail plus `h` must
/// itself fit in one permutation, bounding the input length at 31.
pub fn poseidon_hash_chunked(inputs: &[Fr]) -> Result<Fr, PoseidonError> {
    if inputs.len() <= MAX_ARITY {
        return poseidon_hash(inputs);
    }
    let head = poseidon_hash(&inputs[..MAX_ARITY])?;
    let mut rest = Vec::with_capacity(1 + inputs.len() - MAX_ARITY);
    rest.push(head);
    rest.extend_from_slice(&inputs[MAX_ARITY..]);
    poseidon_hash(&rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::MontFp;

    // Reference outputs of the circomlib-compatible Poseidon instance the
    // derivation must reproduce.
    const POSEIDON_1: Fr =
        MontFp!("18586133768512220936620570745912940619677854269274689475585506675881198879027");
    const POSEIDON_1_2: Fr =
        MontFp!("7853200120776062878684798364095072458815029376092732009249414926327459813530");

    #[test]
    fn known_answer_single_input() {
        assert_eq!(poseidon_hash(&[Fr::from(1u64)]).unwrap(), POSEIDON_1);
    }

    #[test]
    fn known_answer_two_inputs() {
        let out = poseidon_hash(&[Fr::from(1u64), Fr::from(2u64)]).unwrap();
        assert_eq!(out, POSEIDON_1_2);
    }

    #[test]
    fn hash_is_deterministic() {
        let inputs: Vec<Fr> = (1..=6).map(Fr::from).collect();
        assert_eq!(poseidon_hash(&inputs).unwrap(), poseidon_hash(&inputs).unwrap());
    }

    #[test]
    fn hash_depends_on_every_input() {
        let a: Vec<Fr> = (1..=5).map(Fr::from).collect();
        let mut b = a.clone();
        b[4] = Fr::from(99u64);
        assert_ne!(poseidon_hash(&a).unwrap(), poseidon_hash(&b).unwrap());
    }

    #[test]
    fn arity_bounds_enforced() {
        assert_eq!(poseidon_hash(&[]), Err(PoseidonError::UnsupportedArity(0)));
        let too_many: Vec<Fr> = (0..17).map(Fr::from).collect();
        assert_eq!(
            poseidon_hash(&too_many),
            Err(PoseidonError::UnsupportedArity(17))
        );
    }

    #[test]
    fn chunked_matches_manual_two_level() {
        let inputs: Vec<Fr> = (1..=21).map(Fr::from).collect();
        let head = poseidon_hash(&inputs[..16]).unwrap();
        let mut rest = vec![head];
        rest.extend_from_slice(&inputs[16..]);
        let expected = poseidon_hash(&rest).unwrap();
        assert_eq!(poseidon_hash_chunked(&inputs).unwrap(), expected);
    }

    #[test]
    fn chunked_short_input_is_direct_hash() {
        let inputs: Vec<Fr> = (1..=7).map(Fr::from).collect();
        assert_eq!(
            poseidon_hash_chunked(&inputs).unwrap(),
            poseidon_hash(&inputs).unwrap()
        );
    }

    #[test]
    fn chunked_rejects_over_31_inputs() {
        let inputs: Vec<Fr> = (0..32).map(Fr::from).collect();
        assert!(poseidon_hash_chunked(&inputs).is_err());
    }
}
