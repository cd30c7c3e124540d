//! # noema-core — Domain Model for the Noema Policy-Audit Service
//!
//! Noema audits whether an AI training/evaluation dataset satisfies a set of
//! policy constraints and proves, in zero knowledge, that the deterministic
//! policy check was computed honestly. This crate holds everything the rest
//! of the workspace agrees on: the policy and evaluation data model, strict
//! parsing and validation, the canonical constraint ordering, dataset
//! digests, environment configuration, and the shared error kinds.
//!
//! ## Design
//!
//! - Parsing is strict: unknown JSON fields are rejected, version literals
//!   are pinned, and validation messages are precise enough to return to a
//!   client verbatim.
//! - The canonical constraint ordering is versioned together with the
//!   proof circuit's domain separator. It never changes in place.
//! - No I/O happens here beyond reading environment variables at startup.

pub mod config;
pub mod constraints;
pub mod dataset;
pub mod digest;
pub mod error;
pub mod evaluation;
pub mod policy;

pub use config::{limits, NoemaConfig};
pub use constraints::{canonical_slot, CANONICAL_CONSTRAINTS, CONSTRAINT_SLOTS};
pub use dataset::{parse_dataset, sample_dataset, Dataset, DatasetItem};
pub use digest::DatasetDigest;
pub use error::NoemaError;
pub use evaluation::{
    parse_evaluation_result, stub_evaluation_result, validate_evaluation_result, EvalResultItem,
    EvaluationResult, EVAL_VERSION,
};
pub use policy::{
    enabled_constraints, parse_policy_config, validate_policy_config, PolicyConfig,
    PolicyConstraint, POLICY_VERSION,
};
