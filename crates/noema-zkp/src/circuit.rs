//! # Policy-Gate Circuit
//!
//! The fixed-arity arithmetic circuit behind every Noema proof. It shows
//! that the prover knows a dataset digest, a policy config, and a severity
//! vector that (a) hash to the public commitment and (b) aggregate to the
//! claimed `overall_pass` and `max_severity` under the deterministic policy
//! check: for each slot, if enabled then severity must not exceed the
//! allowed maximum.
//!
//! ## Wires
//!
//! Public, in allocation order: `commitment`, `overall_pass`,
//! `max_severity`. Private: the two 128-bit digest limbs and the three
//! length-[`CONSTRAINT_SLOTS`] slot arrays.
//!
//! ## Versioning
//!
//! [`DOMAIN_SEPARATOR`] is versioned together with the canonical
//! constraint ordering. Changing the slot count, the ordering, or the
//! preimage layout requires a new separator; never mutate these in place.

use ark_bn254::Fr;
use ark_ff::Field;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::gadget::poseidon_hash_chunked_var;

/// Fixed number of constraint slots (N).
pub const CONSTRAINT_SLOTS: usize = 6;

/// Domain separator bound into the commitment preimage. Stable forever
/// after first deploy.
pub const DOMAIN_SEPARATOR: u64 = 20260208;

/// Circuit assignment. `None` values synthesize the constraint shape for
/// setup; proving requires every field populated.
#[derive(Clone, Debug, Default)]
pub struct PolicyGateCircuit {
    /// Low 128 bits of the dataset digest (last 16 bytes, big-endian).
    pub dataset_digest_lo: Option<Fr>,
    /// High 128 bits of the dataset digest (first 16 bytes, big-endian).
    pub dataset_digest_hi: Option<Fr>,
    /// Per-slot enabled flags.
    pub enabled: [Option<Fr>; CONSTRAINT_SLOTS],
    /// Per-slot maximum tolerated severities.
    pub max_allowed: [Option<Fr>; CONSTRAINT_SLOTS],
    /// Per-slot observed severities.
    pub severity: [Option<Fr>; CONSTRAINT_SLOTS],
    /// Public: Poseidon commitment over the full preimage.
    pub commitment: Option<Fr>,
    /// Public: claimed pass bit.
    pub overall_pass: Option<Fr>,
    /// Public: claimed max severity among enabled slots.
    pub max_severity: Option<Fr>,
}

/// `x · (x − 1) = 0` pins x to {0, 1}.
fn enforce_boolean(x: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let shifted = x - &FpVar::one();
    (x * &shifted).enforce_equal(&FpVar::zero())
}

/// `x · (x − 1) · (x − 2) = 0` pins x to {0, 1, 2}.
fn enforce_ternary(x: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let m1 = x - &FpVar::one();
    let m2 = x - &FpVar::constant(Fr::from(2u64));
    (&(x * &m1) * &m2).enforce_equal(&FpVar::zero())
}

/// Lagrange indicators `(eq0, eq1, eq2)` for x already pinned to {0, 1, 2}:
/// exact 0/1 values in the field, each constrained boolean, summing to 1.
fn indicators012(
    x: &FpVar<Fr>,
) -> Result<(FpVar<Fr>, FpVar<Fr>, FpVar<Fr>), SynthesisError> {
    let inv2 = FpVar::constant(Fr::from(2u64).inverse().expect("2 is invertible"));
    let m1 = x - &FpVar::one();
    let m2 = x - &FpVar::constant(Fr::from(2u64));

    // eq0 = (x-1)(x-2)/2, eq1 = -x(x-2), eq2 = x(x-1)/2
    let eq0 = &inv2 * &(&m1 * &m2);
    let eq1 = (x * &m2).negate()?;
    let eq2 = &inv2 * &(x * &m1);

    enforce_boolean(&eq0)?;
    enforce_boolean(&eq1)?;
    enforce_boolean(&eq2)?;
    (&eq0 + &eq1 + &eq2).enforce_equal(&FpVar::one())?;

    Ok((eq0, eq1, eq2))
}

/// Boolean OR: `a + b − a·b`. Operands must already be boolean.
fn or_bool(a: &FpVar<Fr>, b: &FpVar<Fr>) -> FpVar<Fr> {
    a + b - &(a * b)
}

impl ConstraintSynthesizer<Fr> for PolicyGateCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // Public wires first; the verifier rebuilds exactly this order.
        let commitment = FpVar::new_input(cs.clone(), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let overall_pass = FpVar::new_input(cs.clone(), || {
            self.overall_pass.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let max_severity = FpVar::new_input(cs.clone(), || {
            self.max_severity.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let digest_lo = FpVar::new_witness(cs.clone(), || {
            self.dataset_digest_lo
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        let digest_hi = FpVar::new_witness(cs.clone(), || {
            self.dataset_digest_hi
                .ok_or(SynthesisError::AssignmentMissing)
        })?;

        let slot_witnesses = |values: &[Option<Fr>; CONSTRAINT_SLOTS]| {
            values
                .iter()
                .map(|v| {
                    FpVar::new_witness(cs.clone(), || v.ok_or(SynthesisError::AssignmentMissing))
                })
                .collect::<Result<Vec<_>, _>>()
        };
        let enabled = slot_witnesses(&self.enabled)?;
        let max_allowed = slot_witnesses(&self.max_allowed)?;
        let severity = slot_witnesses(&self.severity)?;

        enforce_boolean(&overall_pass)?;
        enforce_ternary(&max_severity)?;

        let mut any_fail = FpVar::<Fr>::zero();
        let mut any_sev2 = FpVar::<Fr>::zero();
        let mut any_sev1 = FpVar::<Fr>::zero();

        for i in 0..CONSTRAINT_SLOTS {
            enforce_boolean(&enabled[i])?;
            enforce_ternary(&max_allowed[i])?;
            enforce_ternary(&severity[i])?;

            let (_s0, s1, s2) = indicators012(&severity[i])?;
            let (m0, m1, _m2) = indicators012(&max_allowed[i])?;

            // gt = (severity > max_allowed) over {0,1,2}: the only cases
            // are (1>0), (2>0), (2>1). Mutually exclusive, hence boolean,
            // but pinned anyway.
            let gt = &(&s1 * &m0) + &(&s2 * &m0) + &(&s2 * &m1);
            enforce_boolean(&gt)?;

            let fail = &enabled[i] * &gt;
            any_fail = or_bool(&any_fail, &fail);

            let sev2_enabled = &enabled[i] * &s2;
            let sev1_enabled = &enabled[i] * &s1;
            any_sev2 = or_bool(&any_sev2, &sev2_enabled);
            any_sev1 = or_bool(&any_sev1, &sev1_enabled);
        }

        // overall_pass = 1 - any_fail
        overall_pass.enforce_equal(&(FpVar::one() - &any_fail))?;

        // max_severity = 2·any_sev2 + (1 − any_sev2)·any_sev1
        let two = FpVar::constant(Fr::from(2u64));
        let computed_max =
            &(&two * &any_sev2) + &(&(FpVar::one() - &any_sev2) * &any_sev1);
        max_severity.enforce_equal(&computed_max)?;

        // Commitment binding over the versioned preimage
        // [D, lo, hi, enabled[0..N], max_allowed[0..N], severity[0..N]].
        let mut preimage = Vec::with_capacity(3 + 3 * CONSTRAINT_SLOTS);
        preimage.push(FpVar::constant(Fr::from(DOMAIN_SEPARATOR)));
        preimage.push(digest_lo);
        preimage.push(digest_hi);
        preimage.extend(enabled.iter().cloned());
        preimage.extend(max_allowed.iter().cloned());
        preimage.extend(severity.iter().cloned());

        let computed_commitment = poseidon_hash_chunked_var(&preimage)?;
        commitment.enforce_equal(&computed_commitment)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;

    use crate::commitment::{commitment_poseidon, parse_commitment_hex};
    use crate::witness::dataset_digest_limbs;

    const DIGEST: &str = "00112233445566778899aabbccddeeffffeeddccbbaa99887766554433221100";

    fn assignment(
        enabled: [u64; CONSTRAINT_SLOTS],
        max_allowed: [u64; CONSTRAINT_SLOTS],
        severity: [u64; CONSTRAINT_SLOTS],
        overall_pass: u64,
        max_severity: u64,
    ) -> PolicyGateCircuit {
        let commitment_hex =
            commitment_poseidon(DIGEST, &enabled, &max_allowed, &severity).unwrap();
        let commitment = parse_commitment_hex(&commitment_hex).unwrap();
        let (lo, hi) = dataset_digest_limbs(DIGEST).unwrap();
        PolicyGateCircuit {
            dataset_digest_lo: Some(lo),
            dataset_digest_hi: Some(hi),
            enabled: enabled.map(|v| Some(Fr::from(v))),
            max_allowed: max_allowed.map(|v| Some(Fr::from(v))),
            severity: severity.map(|v| Some(Fr::from(v))),
            commitment: Some(commitment),
            overall_pass: Some(Fr::from(overall_pass)),
            max_severity: Some(Fr::from(max_severity)),
        }
    }

    fn satisfied(circuit: PolicyGateCircuit) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    #[test]
    fn passing_assignment_satisfies() {
        let circuit = assignment(
            [1, 1, 1, 0, 1, 0],
            [1, 2, 0, 1, 2, 0],
            [1, 2, 0, 2, 1, 2],
            1,
            2,
        );
        assert!(satisfied(circuit));
    }

    #[test]
    fn failing_assignment_satisfies_with_pass_zero() {
        // A FAIL run is itself provable: overall_pass = 0 is consistent.
        let circuit = assignment(
            [1, 1, 1, 0, 1, 0],
            [1, 2, 0, 1, 2, 0],
            [1, 2, 1, 2, 1, 2],
            0,
            2,
        );
        assert!(satisfied(circuit));
    }

    #[test]
    fn wrong_overall_pass_unsatisfiable() {
        let circuit = assignment(
            [1, 1, 1, 0, 1, 0],
            [1, 2, 0, 1, 2, 0],
            [1, 2, 1, 2, 1, 2],
            1, // claims PASS over a failing severity vector
            2,
        );
        assert!(!satisfied(circuit));
    }

    #[test]
    fn wrong_max_severity_unsatisfiable() {
        let circuit = assignment(
            [1, 0, 0, 0, 0, 0],
            [2, 0, 0, 0, 0, 0],
            [1, 0, 0, 0, 0, 0],
            1,
            2, // actual max among enabled is 1
        );
        assert!(!satisfied(circuit));
    }

    #[test]
    fn disabled_slots_do_not_affect_aggregates() {
        // Slot 5 disabled with severity 2: pass holds, max severity stays 1.
        let circuit = assignment(
            [1, 0, 0, 0, 0, 0],
            [2, 0, 0, 0, 0, 0],
            [1, 0, 0, 0, 0, 2],
            1,
            1,
        );
        assert!(satisfied(circuit));
    }

    #[test]
    fn no_enabled_slots_pass_with_zero_severity() {
        let circuit = assignment([0; 6], [0; 6], [2, 1, 0, 2, 1, 0], 1, 0);
        assert!(satisfied(circuit));
    }

    #[test]
    fn tampered_severity_breaks_commitment_binding() {
        // Keep the claimed publics but flip one severity: the Poseidon
        // binding must reject the assignment.
        let mut circuit = assignment(
            [1, 1, 0, 0, 0, 0],
            [1, 2, 0, 0, 0, 0],
            [1, 2, 0, 0, 0, 0],
            1,
            2,
        );
        circuit.severity[2] = Some(Fr::from(1u64));
        assert!(!satisfied(circuit));
    }

    #[test]
    fn out_of_range_severity_unsatisfiable() {
        let mut circuit = assignment(
            [1, 0, 0, 0, 0, 0],
            [2, 0, 0, 0, 0, 0],
            [1, 0, 0, 0, 0, 0],
            1,
            1,
        );
        circuit.severity[0] = Some(Fr::from(3u64));
        assert!(!satisfied(circuit));
    }

    #[test]
    fn non_boolean_enabled_unsatisfiable() {
        let mut circuit = assignment(
            [1, 0, 0, 0, 0, 0],
            [2, 0, 0, 0, 0, 0],
            [1, 0, 0, 0, 0, 0],
            1,
            1,
        );
        circuit.enabled[1] = Some(Fr::from(2u64));
        assert!(!satisfied(circuit));
    }

    #[test]
    fn setup_mode_synthesizes_blank_circuit() {
        // Keygen walks the circuit with no assignment; the shape must
        // synthesize without values.
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_mode(ark_relations::r1cs::SynthesisMode::Setup);
        PolicyGateCircuit::default()
            .generate_constraints(cs.clone())
            .unwrap();
        assert_eq!(cs.num_instance_variables(), 4); // one + three publics
        assert!(cs.num_constraints() > 0);
    }
}
