//! # Canonical Constraint Ordering
//!
//! The fixed, versioned permutation of constraint ids used both in the
//! witness layout and in the Poseidon commitment preimage. The ordering is
//! versioned together with the circuit's domain separator: extending the
//! constraint universe requires a new domain separator and a new circuit,
//! never an append to this list.

/// Number of constraint slots in the policy-gate circuit.
pub const CONSTRAINT_SLOTS: usize = 6;

/// Canonical constraint ids, in slot order.
///
/// Any id outside this set is rejected. Absent slots are filled with
/// `(enabled = 0, max_allowed = 0, severity = 0)`.
pub const CANONICAL_CONSTRAINTS: [&str; CONSTRAINT_SLOTS] = [
    "pii_exposure_risk",
    "regulated_sensitive_data_presence",
    "data_provenance_or_consent_violation_risk",
    "safety_critical_advisory_presence",
    "harm_enabling_content_risk",
    "dataset_intended_use_mismatch",
];

/// Slot index for a constraint id, or `None` for ids outside the canon.
pub fn canonical_slot(id: &str) -> Option<usize> {
    CANONICAL_CONSTRAINTS.iter().position(|&c| c == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_match_ordering() {
        for (i, id) in CANONICAL_CONSTRAINTS.iter().enumerate() {
            assert_eq!(canonical_slot(id), Some(i));
        }
    }

    #[test]
    fn unknown_id_has_no_slot() {
        assert_eq!(canonical_slot("made_up_constraint"), None);
        assert_eq!(canonical_slot(""), None);
    }

    #[test]
    fn ids_are_unique() {
        for (i, a) in CANONICAL_CONSTRAINTS.iter().enumerate() {
            for b in CANONICAL_CONSTRAINTS.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
