//! # Policy Configuration
//!
//! The `PolicyConfig` a judge submits with each evaluation: an ordered list
//! of constraints, each with an on/off switch and a maximum tolerated
//! severity. Parsing is strict (unknown fields rejected, single JSON value)
//! and validation messages are returned to clients verbatim.

use serde::{Deserialize, Serialize};

use crate::error::NoemaError;

/// Pinned policy schema version literal.
pub const POLICY_VERSION: &str = "noema_policy_v1";

/// One policy constraint: an id from the canonical set, whether it is
/// enforced, and the maximum severity tolerated when it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConstraint {
    /// Constraint identifier. Non-empty, no surrounding whitespace, unique
    /// within a config.
    pub id: String,
    /// Whether this constraint participates in the pass/fail decision.
    pub enabled: bool,
    /// Maximum tolerated severity, 0..=2.
    pub max_allowed: u8,
}

/// A complete policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Must equal [`POLICY_VERSION`].
    pub policy_version: String,
    /// Ordered, non-empty list of constraints.
    pub constraints: Vec<PolicyConstraint>,
}

/// Parse a policy config from a raw JSON string, strictly.
pub fn parse_policy_config(raw: &str) -> Result<PolicyConfig, NoemaError> {
    serde_json::from_str(raw).map_err(|_| NoemaError::bad_request("invalid policy_config JSON"))
}

/// Validate the structural invariants of a parsed policy config.
pub fn validate_policy_config(cfg: &PolicyConfig) -> Result<(), NoemaError> {
    if cfg.policy_version != POLICY_VERSION {
        return Err(NoemaError::bad_request(format!(
            "policy_version must be {POLICY_VERSION}"
        )));
    }
    if cfg.constraints.is_empty() {
        return Err(NoemaError::bad_request("constraints must be non-empty"));
    }
    let mut seen = std::collections::HashSet::with_capacity(cfg.constraints.len());
    for c in &cfg.constraints {
        let trimmed = c.id.trim();
        if trimmed.is_empty() {
            return Err(NoemaError::bad_request("constraint id must be non-empty"));
        }
        if trimmed != c.id {
            return Err(NoemaError::bad_request(
                "constraint id must not include leading/trailing whitespace",
            ));
        }
        if !seen.insert(c.id.as_str()) {
            return Err(NoemaError::bad_request(format!(
                "duplicate constraint id: {}",
                c.id
            )));
        }
        if c.max_allowed > 2 {
            return Err(NoemaError::bad_request(
                "constraint max_allowed must be 0, 1, or 2",
            ));
        }
    }
    Ok(())
}

/// Enabled constraints of a config, in config order.
pub fn enabled_constraints(cfg: &PolicyConfig) -> Vec<&PolicyConstraint> {
    cfg.constraints.iter().filter(|c| c.enabled).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn valid_config_passes() {
        let cfg = config(&[("pii_exposure_risk", true, 1), ("harm_enabling_content_risk", false, 0)]);
        assert!(validate_policy_config(&cfg).is_ok());
        assert_eq!(enabled_constraints(&cfg).len(), 1);
    }

    #[test]
    fn wrong_version_rejected() {
        let mut cfg = config(&[("pii_exposure_risk", true, 1)]);
        cfg.policy_version = "noema_policy_v2".to_string();
        assert!(validate_policy_config(&cfg).is_err());
    }

    #[test]
    fn empty_constraints_rejected() {
        let cfg = config(&[]);
        assert!(validate_policy_config(&cfg).is_err());
    }

    #[test]
    fn whitespace_id_rejected() {
        let cfg = config(&[(" pii_exposure_risk", true, 1)]);
        let err = validate_policy_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("whitespace"));
    }

    #[test]
    fn duplicate_id_rejected() {
        let cfg = config(&[("pii_exposure_risk", true, 1), ("pii_exposure_risk", false, 2)]);
        let err = validate_policy_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn out_of_range_max_allowed_rejected() {
        let cfg = config(&[("pii_exposure_risk", true, 3)]);
        assert!(validate_policy_config(&cfg).is_err());
    }

    #[test]
    fn unknown_json_fields_rejected() {
        let raw = r#"{"policy_version":"noema_policy_v1","constraints":[],"extra":1}"#;
        assert!(parse_policy_config(raw).is_err());
    }

    #[test]
    fn parse_round_trip() {
        let cfg = config(&[("pii_exposure_risk", true, 2)]);
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed = parse_policy_config(&json).unwrap();
        assert_eq!(parsed, cfg);
    }
}
