//! # Witness Assembly
//!
//! Maps a validated `(PolicyConfig, EvaluationResult)` pair onto the fixed
//! circuit slots in canonical constraint order. Config ids outside the
//! canonical set are rejected; absent slots are committed as
//! `(0, 0, 0)`.

use noema_core::{canonical_slot, DatasetDigest, NoemaError, PolicyConfig, EvaluationResult,
    CANONICAL_CONSTRAINTS};
use noema_zkp::{WitnessInputs, CONSTRAINT_SLOTS};

// The canonical ordering and the circuit slot count version together.
const _: () = assert!(CANONICAL_CONSTRAINTS.len() == CONSTRAINT_SLOTS);

/// Build the circuit witness for one evaluation run.
///
/// Severity for an enabled slot must come from the evaluation result
/// (`MissingResult` otherwise); a disabled configured slot commits its
/// claimed severity when one was supplied and 0 when not.
pub fn build_policy_witness(
    cfg: &PolicyConfig,
    out: &EvaluationResult,
    digest: &DatasetDigest,
) -> Result<WitnessInputs, NoemaError> {
    for c in &cfg.constraints {
        if canonical_slot(&c.id).is_none() {
            return Err(NoemaError::UnsupportedConstraint(c.id.clone()));
        }
    }

    let mut enabled = [0u64; CONSTRAINT_SLOTS];
    let mut max_allowed = [0u64; CONSTRAINT_SLOTS];
    let mut severity = [0u64; CONSTRAINT_SLOTS];

    for (slot, id) in CANONICAL_CONSTRAINTS.iter().enumerate() {
        let Some(constraint) = cfg.constraints.iter().find(|c| c.id == *id) else {
            continue;
        };
        enabled[slot] = u64::from(constraint.enabled);
        max_allowed[slot] = u64::from(constraint.max_allowed);
        severity[slot] = match out.result_for(id) {
            Some(result) => u64::from(result.severity),
            None if constraint.enabled => {
                return Err(NoemaError::MissingResult((*id).to_string()));
            }
            None => 0,
        };
    }

    Ok(WitnessInputs {
        dataset_digest_hex: digest.to_hex(),
        enabled,
        max_allowed,
        severity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use noema_core::{EvalResultItem, PolicyConstraint, EVAL_VERSION, POLICY_VERSION};

    fn config(constraints: &[(&str, bool, u8)]) -> PolicyConfig {
        PolicyConfig {
            policy_version: POLICY_VERSION.to_string(),
            constraints: constraints
                .iter()
                .map(|&(id, enabled, max_allowed)| PolicyConstraint {
                    id: id.to_string(),
                    enabled,
                    max_allowed,
                })
                .collect(),
        }
    }

    fn result(items: &[(&str, u8)]) -> EvaluationResult {
        EvaluationResult {
            eval_version: EVAL_VERSION.to_string(),
            results: items
                .iter()
                .map(|&(id, severity)| EvalResultItem {
                    id: id.to_string(),
                    severity,
                    confidence: None,
                    rationale: None,
                })
                .collect(),
        }
    }

    fn digest() -> DatasetDigest {
        DatasetDigest::of(b"{\"items\":[{\"id\":\"a\",\"text\":\"t\"}]}")
    }

    #[test]
    fn slots_follow_canonical_order() {
        let cfg = config(&[
            ("safety_critical_advisory_presence", true, 2),
            ("pii_exposure_risk", true, 1),
        ]);
        let out = result(&[
            ("pii_exposure_risk", 1),
            ("safety_critical_advisory_presence", 2),
        ]);
        let w = build_policy_witness(&cfg, &out, &digest()).unwrap();
        assert_eq!(w.enabled, [1, 0, 0, 1, 0, 0]);
        assert_eq!(w.max_allowed, [1, 0, 0, 2, 0, 0]);
        assert_eq!(w.severity, [1, 0, 0, 2, 0, 0]);
        assert_eq!(w.dataset_digest_hex.len(), 64);
    }

    #[test]
    fn unknown_constraint_id_rejected() {
        let cfg = config(&[("pii_exposure_risk", true, 1), ("novel_constraint", true, 1)]);
        let out = result(&[("pii_exposure_risk", 0), ("novel_constraint", 0)]);
        match build_policy_witness(&cfg, &out, &digest()) {
            Err(NoemaError::UnsupportedConstraint(id)) => assert_eq!(id, "novel_constraint"),
            other => panic!("expected UnsupportedConstraint, got {other:?}"),
        }
    }

    #[test]
    fn missing_result_for_enabled_slot_rejected() {
        let cfg = config(&[
            ("pii_exposure_risk", true, 1),
            ("harm_enabling_content_risk", true, 2),
        ]);
        let out = result(&[("pii_exposure_risk", 0)]);
        match build_policy_witness(&cfg, &out, &digest()) {
            Err(NoemaError::MissingResult(id)) => assert_eq!(id, "harm_enabling_content_risk"),
            other => panic!("expected MissingResult, got {other:?}"),
        }
    }

    #[test]
    fn disabled_slot_without_result_commits_zero() {
        let cfg = config(&[
            ("pii_exposure_risk", true, 1),
            ("harm_enabling_content_risk", false, 2),
        ]);
        let out = result(&[("pii_exposure_risk", 1)]);
        let w = build_policy_witness(&cfg, &out, &digest()).unwrap();
        assert_eq!(w.enabled[4], 0);
        assert_eq!(w.severity[4], 0);
    }

    #[test]
    fn disabled_slot_with_result_commits_claimed_severity() {
        let cfg = config(&[
            ("pii_exposure_risk", true, 1),
            ("harm_enabling_content_risk", false, 0),
        ]);
        let out = result(&[("pii_exposure_risk", 0), ("harm_enabling_content_risk", 2)]);
        let w = build_policy_witness(&cfg, &out, &digest()).unwrap();
        assert_eq!(w.severity[4], 2);
    }

    #[test]
    fn unconfigured_slots_are_zero() {
        let cfg = config(&[("dataset_intended_use_mismatch", true, 0)]);
        let out = result(&[("dataset_intended_use_mismatch", 0)]);
        let w = build_policy_witness(&cfg, &out, &digest()).unwrap();
        assert_eq!(w.enabled, [0, 0, 0, 0, 0, 1]);
        assert_eq!(w.max_allowed, [0; 6]);
        assert_eq!(w.severity, [0; 6]);
    }
}
