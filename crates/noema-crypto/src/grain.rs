//! # Grain-LFSR Parameter Derivation
//!
//! Derives Poseidon round constants and the MDS matrix by the procedure of
//! the Poseidon reference implementation (`generate_params_poseidon.sage`),
//! which is the generator behind the circomlib constant tables: an
//! 80-bit Grain LFSR seeded from the instance description, 160 warm-up
//! clocks, a shrinking-generator bit filter, and rejection sampling of
//! 254-bit big-endian integers against the field modulus. The MDS matrix is
//! the Cauchy matrix `M[i][j] = 1 / (i + t + j)`.
//!
//! The derivation is deterministic in `(t, R_F, R_P)`; reproducing the
//! reference tables bit-exactly is what keeps the native commitment and
//! the in-circuit hash in agreement with other circomlib-compatible
//! implementations.

use ark_bn254::Fr;
use ark_ff::{BigInt, Field, PrimeField};

/// 80-bit Grain LFSR over the instance description.
pub(crate) struct GrainLfsr {
    /// `state[0]` is the oldest bit.
    state: [bool; 80],
}

impl GrainLfsr {
    /// Seed from the instance description and run the 160 warm-up clocks.
    ///
    /// Seed layout (big-endian bit segments): field tag `0b01` (prime, 2
    /// bits), S-box tag `0b0000` (`x^alpha`, 4 bits), field size 254
    /// (12 bits), width `t` (12 bits), `R_F` (10 bits), `R_P` (10 bits),
    /// then 30 one bits.
    pub(crate) fn new(t: usize, full_rounds: usize, partial_rounds: usize) -> Self {
        let mut bits = Vec::with_capacity(80);
        push_bits(&mut bits, 1, 2);
        push_bits(&mut bits, 0, 4);
        push_bits(&mut bits, 254, 12);
        push_bits(&mut bits, t as u64, 12);
        push_bits(&mut bits, full_rounds as u64, 10);
        push_bits(&mut bits, partial_rounds as u64, 10);
        bits.extend(std::iter::repeat(true).take(30));
        debug_assert_eq!(bits.len(), 80);

        let mut state = [false; 80];
        state.copy_from_slice(&bits);
        let mut lfsr = Self { state };
        for _ in 0..160 {
            lfsr.clock();
        }
        lfsr
    }

    /// One raw clock: feedback taps 62, 51, 38, 23, 13, 0.
    fn clock(&mut self) -> bool {
        let s = &self.state;
        let new = s[62] ^ s[51] ^ s[38] ^ s[23] ^ s[13] ^ s[0];
        self.state.copy_within(1.., 0);
        self.state[79] = new;
        new
    }

    /// One filtered bit: evaluate raw bits in pairs, emitting the second
    /// of a pair only when the first is set (shrinking generator).
    fn next_bit(&mut self) -> bool {
        loop {
            let gate = self.clock();
            let candidate = self.clock();
            if gate {
                return candidate;
            }
        }
    }

    /// Sample a field element: 254 filtered bits, big-endian, rejecting
    /// values at or above the modulus.
    pub(crate) fn next_field_element(&mut self) -> Fr {
        loop {
            let mut limbs = [0u64; 4];
            for i in 0..254 {
                if self.next_bit() {
                    let pos = 253 - i;
                    limbs[pos / 64] |= 1u64 << (pos % 64);
                }
            }
            if let Some(element) = Fr::from_bigint(BigInt::new(limbs)) {
                return element;
            }
        }
    }
}

fn push_bits(bits: &mut Vec<bool>, value: u64, width: usize) {
    for i in (0..width).rev() {
        bits.push((value >> i) & 1 == 1);
    }
}

/// Derive the `t * (R_F + R_P)` round constants, in round-major order.
pub(crate) fn round_constants(t: usize, full_rounds: usize, partial_rounds: usize) -> Vec<Fr> {
    let mut lfsr = GrainLfsr::new(t, full_rounds, partial_rounds);
    (0..t * (full_rounds + partial_rounds))
        .map(|_| lfsr.next_field_element())
        .collect()
}

/// The Cauchy MDS matrix `M[i][j] = 1 / (x_i + y_j)` with `x_i = i` and
/// `y_j = t + j`. Symmetric, so row/column orientation is immaterial.
pub(crate) fn mds_matrix(t: usize) -> Vec<Vec<Fr>> {
    (0..t)
        .map(|i| {
            (0..t)
                .map(|j| {
                    (Fr::from((i + t + j) as u64))
                        .inverse()
                        .expect("i + t + j is nonzero")
                })
                .collect()
        })
        .collect()
}
