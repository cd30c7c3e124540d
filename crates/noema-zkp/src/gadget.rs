//! # In-Circuit Poseidon
//!
//! The Poseidon permutation over `FpVar` wires, driven by the same derived
//! parameters as the native hasher in `noema-crypto`. Round constants and
//! MDS rows enter as circuit constants, so only the S-boxes cost
//! constraints (three multiplications per `x^5`).

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::SynthesisError;

use noema_crypto::{params_for_width, PoseidonParams, MAX_ARITY};

fn sbox_var(x: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let x2 = x.square()?;
    let x4 = x2.square()?;
    Ok(&x4 * x)
}

fn permute_var(state: &mut Vec<FpVar<Fr>>, params: &PoseidonParams) -> Result<(), SynthesisError> {
    let t = params.width;
    debug_assert_eq!(state.len(), t);
    let half = params.full_rounds / 2;
    let rounds = params.full_rounds + params.partial_rounds;

    for round in 0..rounds {
        for lane in 0..t {
            state[lane] =
                &state[lane] + &FpVar::constant(params.round_constants[round * t + lane]);
        }
        let full = round < half || round >= half + params.partial_rounds;
        if full {
            for lane in 0..t {
                state[lane] = sbox_var(&state[lane])?;
            }
        } else {
            state[0] = sbox_var(&state[0])?;
        }
        let mut mixed = Vec::with_capacity(t);
        for row in 0..t {
            let mut acc = FpVar::<Fr>::zero();
            for (col, value) in state.iter().enumerate() {
                acc += value * &FpVar::constant(params.mds[row][col]);
            }
            mixed.push(acc);
        }
        *state = mixed;
    }
    Ok(())
}

/// Single-permutation hash of 1..=16 wires. Panics on arity violations;
/// callers hash fixed-shape preimages.
pub fn poseidon_hash_var(inputs: &[FpVar<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    assert!(
        !inputs.is_empty() && inputs.len() <= MAX_ARITY,
        "poseidon gadget arity {} outside 1..=16",
        inputs.len()
    );
    let params = params_for_width(inputs.len() + 1);
    let mut state = Vec::with_capacity(params.width);
    state.push(FpVar::zero());
    state.extend_from_slice(inputs);
    permute_var(&mut state, params)?;
    Ok(state[0].clone())
}

/// Two-level chunked hash, mirroring the native rule exactly: at most 16
/// wires hash directly, longer sequences hash the first 16 to `h` and then
/// hash `(h, tail…)`.
pub fn poseidon_hash_chunked_var(inputs: &[FpVar<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    if inputs.len() <= MAX_ARITY {
        return poseidon_hash_var(inputs);
    }
    let head = poseidon_hash_var(&inputs[..MAX_ARITY])?;
    let mut rest = Vec::with_capacity(1 + inputs.len() - MAX_ARITY);
    rest.push(head);
    rest.extend_from_slice(&inputs[MAX_ARITY..]);
    poseidon_hash_var(&rest)
}
