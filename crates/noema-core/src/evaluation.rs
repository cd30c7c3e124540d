//! # Evaluation Results
//!
//! Structured output of the dataset evaluator: one severity tag per
//! constraint, optionally with a confidence score and a short rationale.
//! Results are validated against the companion policy config before any
//! commitment or proof work touches them.
//!
//! ## Invariant
//!
//! For every *enabled* constraint id in the companion config, exactly one
//! result item with that id exists; no result carries an id outside the
//! config; ids are unique.

use serde::{Deserialize, Serialize};

use crate::error::NoemaError;
use crate::policy::PolicyConfig;

/// Pinned evaluation schema version literal.
pub const EVAL_VERSION: &str = "noema_eval_v1";

/// Severity verdict for a single constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalResultItem {
    /// Constraint id this verdict applies to.
    pub id: String,
    /// Observed severity, 0..=2.
    pub severity: u8,
    /// Evaluator confidence in [0, 1], when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Short human-readable justification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// A complete evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationResult {
    /// Must equal [`EVAL_VERSION`].
    pub eval_version: String,
    /// Non-empty list of per-constraint verdicts.
    pub results: Vec<EvalResultItem>,
}

impl EvaluationResult {
    /// Look up the result for a constraint id.
    pub fn result_for(&self, id: &str) -> Option<&EvalResultItem> {
        self.results.iter().find(|r| r.id == id)
    }
}

/// Parse an evaluation result from a raw JSON string, strictly.
pub fn parse_evaluation_result(raw: &str) -> Result<EvaluationResult, NoemaError> {
    serde_json::from_str(raw)
        .map_err(|_| NoemaError::bad_request("invalid evaluation_result JSON"))
}

/// Validate an evaluation result against its companion policy config.
pub fn validate_evaluation_result(
    out: &EvaluationResult,
    cfg: &PolicyConfig,
) -> Result<(), NoemaError> {
    if out.eval_version != EVAL_VERSION {
        return Err(NoemaError::bad_request(format!(
            "eval_version must be {EVAL_VERSION}"
        )));
    }
    if out.results.is_empty() {
        return Err(NoemaError::bad_request("results must be non-empty"));
    }

    let config_ids: std::collections::HashSet<&str> =
        cfg.constraints.iter().map(|c| c.id.as_str()).collect();
    let mut seen = std::collections::HashSet::with_capacity(out.results.len());
    for r in &out.results {
        if r.id.is_empty() {
            return Err(NoemaError::bad_request("result id must be non-empty"));
        }
        if !config_ids.contains(r.id.as_str()) {
            return Err(NoemaError::bad_request(format!(
                "result id not in policy config: {}",
                r.id
            )));
        }
        if !seen.insert(r.id.as_str()) {
            return Err(NoemaError::bad_request(format!(
                "duplicate result id: {}",
                r.id
            )));
        }
        if r.severity > 2 {
            return Err(NoemaError::bad_request("result severity must be 0, 1, or 2"));
        }
        if let Some(conf) = r.confidence {
            if !(0.0..=1.0).contains(&conf) {
                return Err(NoemaError::bad_request(
                    "result confidence must be within [0, 1]",
                ));
            }
        }
    }

    for c in cfg.constraints.iter().filter(|c| c.enabled) {
        if !seen.contains(c.id.as_str()) {
            return Err(NoemaError::bad_request(format!(
                "missing result for enabled constraint: {}",
                c.id
            )));
        }
    }
    Ok(())
}

/// Deterministic fallback result: every configured constraint reported at
/// severity 0 with a stub rationale, sorted by id.
pub fn stub_evaluation_result(cfg: &PolicyConfig) -> EvaluationResult {
    let mut results: Vec<EvalResultItem> = cfg
        .constraints
        .iter()
        .map(|c| EvalResultItem {
            id: c.id.clone(),
            severity: 0,
            confidence: None,
            rationale: Some("stub".to_string()),
        })
        .collect();
    results.sort_by(|a, b| a.id.cmp(&b.id));
    EvaluationResult {
        eval_version: EVAL_VERSION.to_string(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PolicyConstraint, POLICY_VERSION};

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

    #[test]
    fn valid_result_passes() {
        let cfg = config(&[("pii_exposure_risk", true, 1)]);
        let out = result(&[("pii_exposure_risk", 1)]);
        assert!(validate_evaluation_result(&out, &cfg).is_ok());
    }

    #[test]
    fn missing_enabled_result_rejected() {
        let cfg = config(&[("pii_exposure_risk", true, 1), ("harm_enabling_content_risk", true, 2)]);
        let out = result(&[("pii_exposure_risk", 1)]);
        let err = validate_evaluation_result(&out, &cfg).unwrap_err();
        assert!(err.to_string().contains("harm_enabling_content_risk"));
    }

    #[test]
    fn result_outside_config_rejected() {
        let cfg = config(&[("pii_exposure_risk", true, 1)]);
        let out = result(&[("pii_exposure_risk", 1), ("dataset_intended_use_mismatch", 0)]);
        assert!(validate_evaluation_result(&out, &cfg).is_err());
    }

    #[test]
    fn duplicate_result_rejected() {
        let cfg = config(&[("pii_exposure_risk", true, 1)]);
        let out = result(&[("pii_exposure_risk", 1), ("pii_exposure_risk", 0)]);
        assert!(validate_evaluation_result(&out, &cfg).is_err());
    }

    #[test]
    fn severity_out_of_range_rejected() {
        let cfg = config(&[("pii_exposure_risk", true, 1)]);
        let out = result(&[("pii_exposure_risk", 3)]);
        assert!(validate_evaluation_result(&out, &cfg).is_err());
    }

    #[test]
    fn confidence_out_of_range_rejected() {
        let cfg = config(&[("pii_exposure_risk", true, 1)]);
        let mut out = result(&[("pii_exposure_risk", 1)]);
        out.results[0].confidence = Some(1.5);
        assert!(validate_evaluation_result(&out, &cfg).is_err());
    }

    #[test]
    fn disabled_constraint_result_allowed() {
        let cfg = config(&[("pii_exposure_risk", true, 1), ("harm_enabling_content_risk", false, 0)]);
        let out = result(&[("pii_exposure_risk", 0), ("harm_enabling_content_risk", 2)]);
        assert!(validate_evaluation_result(&out, &cfg).is_ok());
    }

    #[test]
    fn stub_covers_all_constraints_sorted() {
        let cfg = config(&[("harm_enabling_content_risk", true, 1), ("pii_exposure_risk", false, 0)]);
        let stub = stub_evaluation_result(&cfg);
        assert_eq!(stub.results.len(), 2);
        assert!(stub.results.windows(2).all(|w| w[0].id <= w[1].id));
        assert!(stub.results.iter().all(|r| r.severity == 0));
        assert!(stub.results.iter().all(|r| r.rationale.as_deref() == Some("stub")));
        assert!(validate_evaluation_result(&stub, &cfg).is_ok());
    }

    #[test]
    fn unknown_json_fields_rejected() {
        let raw = r#"{"eval_version":"noema_eval_v1","results":[],"extra":true}"#;
        assert!(parse_evaluation_result(raw).is_err());
    }
}
