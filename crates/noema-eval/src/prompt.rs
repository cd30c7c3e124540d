//! # Evaluator Prompt Assembly
//!
//! Builds the system instruction, the per-constraint user prompt, and the
//! structured-response schema for the evaluator. The preset descriptions
//! and severity rubrics below are part of the evaluation contract and are
//! versioned by [`PROMPT_VERSION`], which also participates in the cache
//! key.

use std::collections::BTreeMap;

use serde_json::json;

use noema_core::PolicyConfig;

use crate::evaluator::ImageInput;

/// Prompt contract version; bump when the prompt or schema changes shape.
pub const PROMPT_VERSION: &str = "noema-eval-v1";

struct PromptConstraint {
    id: String,
    description: String,
    severity_levels: BTreeMap<&'static str, &'static str>,
    allowed_max_severity: u8,
}

fn preset(id: &str) -> Option<(&'static str, BTreeMap<&'static str, &'static str>)> {
    let (description, levels): (&str, [(&str, &str); 3]) = match id {
        "pii_exposure_risk" => (
            "Assess whether the dataset contains personally identifiable information that could identify individuals directly or indirectly, including contextual linkage of names, addresses, contact details, or identifiable imagery.",
            [
                ("0", "No identifiable personal data detected"),
                ("1", "Limited or partially redacted personal identifiers present"),
                ("2", "Clear personally identifiable information or identity-linkable data present"),
            ],
        ),
        "regulated_sensitive_data_presence" => (
            "Determine whether the dataset contains regulated sensitive information such as medical records, financial account information, biometric identifiers, or government-issued identifiers.",
            [
                ("0", "No regulated sensitive data detected"),
                ("1", "Possible indirect references to sensitive regulated data"),
                ("2", "Explicit regulated sensitive information present"),
            ],
        ),
        "data_provenance_or_consent_violation_risk" => (
            "Evaluate whether the dataset appears to contain content that may have been collected without proper user consent or originates from private communications or restricted sources.",
            [
                ("0", "No evidence of consent or provenance concerns"),
                ("1", "Ambiguous or uncertain provenance indicators"),
                ("2", "Strong indicators of private or non-consensual data collection"),
            ],
        ),
        "safety_critical_advisory_presence" => (
            "Assess whether the dataset contains safety-critical guidance such as medical, legal, engineering, or operational instructions that could cause harm if followed incorrectly.",
            [
                ("0", "No safety-critical instructions present"),
                ("1", "General informational references without actionable steps"),
                ("2", "Actionable safety-critical procedural instructions present"),
            ],
        ),
        "harm_enabling_content_risk" => (
            "Evaluate whether the dataset includes content that could enable harmful real-world actions if generated or amplified by AI systems, including operational misuse or harmful procedural knowledge.",
            [
                ("0", "No harm-enabling content detected"),
                ("1", "Contextual discussion of potentially harmful topics"),
                ("2", "Operational or actionable harm-enabling information present"),
            ],
        ),
        "dataset_intended_use_mismatch" => (
            "Determine whether the dataset content appears inconsistent with its stated intended use or declared labeling context, indicating potential governance or deployment risk.",
            [
                ("0", "Dataset appears aligned with intended use"),
                ("1", "Minor inconsistencies or ambiguous alignment"),
                ("2", "Clear mismatch between dataset content and intended use"),
            ],
        ),
        _ => return None,
    };
    Some((description, levels.into_iter().collect()))
}

/// System instruction: JSON-only, schema-conformant, terse rationales.
pub fn build_system_prompt() -> String {
    "You are a strict dataset policy evaluator for Noema.\n\
     Return ONLY valid JSON that conforms to the provided schema.\n\
     Be concise: each rationale should be a short phrase or sentence (<= 25 words).\n\
     Do not include any extra keys, markdown, or explanations outside JSON."
        .to_string()
}

/// User prompt: enabled constraints with rubrics, attached image inventory,
/// and the (possibly sampled) dataset JSON.
pub fn build_user_prompt(cfg: &PolicyConfig, dataset_json: &[u8], images: &[ImageInput]) -> String {
    let constraints = resolve_prompt_constraints(cfg);
    let mut out = String::new();
    out.push_str("Evaluate the dataset against the following constraints.\n");
    out.push_str("Constraints:\n");
    for c in &constraints {
        out.push_str(&format!("- id: {}\n", c.id));
        out.push_str(&format!("  description: {}\n", c.description));
        if !c.severity_levels.is_empty() {
            out.push_str("  severity_levels:\n");
            for (level, meaning) in &c.severity_levels {
                out.push_str(&format!("    {level}: {meaning}\n"));
            }
        }
        out.push_str(&format!(
            "  allowed_max_severity: {}\n",
            c.allowed_max_severity
        ));
    }
    if !images.is_empty() {
        out.push_str("Images attached (matched by items[].image_ref to filename):\n");
        for img in images {
            out.push_str(&format!("- {} ({})\n", img.filename, img.mime_type));
        }
    }
    out.push_str("Dataset JSON (possibly sampled):\n");
    out.push_str(&String::from_utf8_lossy(dataset_json));
    out
}

fn resolve_prompt_constraints(cfg: &PolicyConfig) -> Vec<PromptConstraint> {
    let mut out: Vec<PromptConstraint> = cfg
        .constraints
        .iter()
        .filter(|c| c.enabled)
        .map(|c| match preset(&c.id) {
            Some((description, severity_levels)) => PromptConstraint {
                id: c.id.clone(),
                description: description.to_string(),
                severity_levels,
                allowed_max_severity: c.max_allowed,
            },
            None => PromptConstraint {
                id: c.id.clone(),
                description: "No description provided for this constraint.".to_string(),
                severity_levels: BTreeMap::new(),
                allowed_max_severity: c.max_allowed,
            },
        })
        .collect();
    out.sort_by(|a, b| a.id.cmp(&b.id));
    out
}

/// JSON schema for the structured `noema_eval_v1` response.
pub fn eval_response_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["eval_version", "results"],
        "properties": {
            "eval_version": {"type": "string", "enum": ["noema_eval_v1"]},
            "results": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["id", "severity"],
                    "properties": {
                        "id": {"type": "string"},
                        "severity": {"type": "integer", "minimum": 0, "maximum": 2},
                        "rationale": {"type": "string"},
                        "confidence": {"type": "number", "minimum": 0, "maximum": 1}
                    },
                    "additionalProperties": false
                }
            }
        },
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use noema_core::{PolicyConstraint, POLICY_VERSION};

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
    fn prompt_lists_only_enabled_constraints_sorted() {
        let cfg = config(&[
            ("safety_critical_advisory_presence", true, 2),
            ("pii_exposure_risk", true, 1),
            ("harm_enabling_content_risk", false, 0),
        ]);
        let prompt = build_user_prompt(&cfg, b"{}", &[]);
        assert!(prompt.contains("- id: pii_exposure_risk"));
        assert!(prompt.contains("- id: safety_critical_advisory_presence"));
        assert!(!prompt.contains("harm_enabling_content_risk"));
        let pii = prompt.find("pii_exposure_risk").unwrap();
        let safety = prompt.find("safety_critical_advisory_presence").unwrap();
        assert!(pii < safety);
    }

    #[test]
    fn preset_rubrics_appear_with_allowed_max() {
        let cfg = config(&[("pii_exposure_risk", true, 1)]);
        let prompt = build_user_prompt(&cfg, b"{}", &[]);
        assert!(prompt.contains("severity_levels:"));
        assert!(prompt.contains("No identifiable personal data detected"));
        assert!(prompt.contains("allowed_max_severity: 1"));
    }

    #[test]
    fn image_inventory_listed_when_present() {
        let cfg = config(&[("pii_exposure_risk", true, 1)]);
        let images = vec![ImageInput {
            filename: "scan.png".to_string(),
            mime_type: "image/png".to_string(),
            data: vec![0],
        }];
        let prompt = build_user_prompt(&cfg, b"{}", &images);
        assert!(prompt.contains("- scan.png (image/png)"));
    }

    #[test]
    fn dataset_json_is_appended() {
        let cfg = config(&[("pii_exposure_risk", true, 1)]);
        let prompt = build_user_prompt(&cfg, br#"{"items":[]}"#, &[]);
        assert!(prompt.ends_with(r#"{"items":[]}"#));
    }

    #[test]
    fn schema_pins_version_and_ranges() {
        let schema = eval_response_schema();
        assert_eq!(schema["properties"]["eval_version"]["enum"][0], "noema_eval_v1");
        let severity = &schema["properties"]["results"]["items"]["properties"]["severity"];
        assert_eq!(severity["maximum"], 2);
    }
}
