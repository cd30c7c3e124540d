//! # Dataset Upload Schema
//!
//! The dataset file is JSON: `{"items": [{id, text, metadata?, image_ref?}]}`.
//! Validation runs against the raw upload bytes before anything else touches
//! them; the dataset digest (and therefore the commitment) is computed over
//! those same bytes, byte for byte.

use serde::{Deserialize, Serialize};

use crate::error::NoemaError;

/// One dataset record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetItem {
    /// Record identifier, unique within the dataset.
    pub id: String,
    /// Record text content.
    pub text: String,
    /// Free-form metadata, passed through to the evaluator prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    /// Filename of an uploaded image this record refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

/// A parsed dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    /// Non-empty list of records.
    pub items: Vec<DatasetItem>,
}

/// Parse and validate a dataset upload against the set of uploaded image
/// filenames.
///
/// Image cross-checks: when no images were uploaded, no record may carry an
/// `image_ref`; when images were uploaded, every `image_ref` must match one
/// of their filenames exactly.
pub fn parse_dataset(raw: &[u8], image_names: &[String]) -> Result<Dataset, NoemaError> {
    if raw.is_empty() {
        return Err(NoemaError::bad_request("dataset file is empty"));
    }
    let ds: Dataset = serde_json::from_slice(raw)
        .map_err(|_| NoemaError::bad_request("dataset must match schema"))?;
    if ds.items.is_empty() {
        return Err(NoemaError::bad_request(
            "dataset.items must be a non-empty array",
        ));
    }

    let mut seen = std::collections::HashSet::with_capacity(ds.items.len());
    for (i, item) in ds.items.iter().enumerate() {
        let trimmed = item.id.trim();
        if trimmed.is_empty() {
            return Err(NoemaError::bad_request(format!(
                "dataset.items[{i}].id is required"
            )));
        }
        if trimmed != item.id {
            return Err(NoemaError::bad_request(format!(
                "dataset.items[{i}].id must not include leading/trailing whitespace"
            )));
        }
        if item.text.trim().is_empty() {
            return Err(NoemaError::bad_request(format!(
                "dataset.items[{i}].text is required"
            )));
        }
        if let Some(image_ref) = &item.image_ref {
            let trimmed_ref = image_ref.trim();
            if trimmed_ref.is_empty() {
                return Err(NoemaError::bad_request(format!(
                    "dataset.items[{i}].image_ref must be non-empty"
                )));
            }
            if trimmed_ref != image_ref {
                return Err(NoemaError::bad_request(format!(
                    "dataset.items[{i}].image_ref must not include leading/trailing whitespace"
                )));
            }
            if image_ref.contains('/') || image_ref.contains('\\') {
                return Err(NoemaError::bad_request(format!(
                    "dataset.items[{i}].image_ref must not include path separators"
                )));
            }
            if image_names.is_empty() {
                return Err(NoemaError::bad_request(format!(
                    "dataset.items[{i}].image_ref provided but no images uploaded"
                )));
            }
            if !image_names.iter().any(|n| n == image_ref) {
                return Err(NoemaError::bad_request(format!(
                    "dataset.items[{i}].image_ref must match an uploaded filename"
                )));
            }
        }
        if !seen.insert(item.id.as_str()) {
            return Err(NoemaError::bad_request(format!(
                "dataset.items[{i}].id must be unique"
            )));
        }
    }
    Ok(ds)
}

/// Truncate a dataset to at most `limit` items for the evaluator prompt.
/// A limit of 0 disables sampling.
pub fn sample_dataset(ds: &Dataset, limit: usize) -> Dataset {
    if limit == 0 || ds.items.len() <= limit {
        return ds.clone();
    }
    Dataset {
        items: ds.items[..limit].to_vec(),
    }
}
