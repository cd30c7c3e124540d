//! # Dataset Digest
//!
//! SHA-256 over the raw dataset bytes as received, before any parsing. The
//! digest is the only piece of the dataset that enters the proof circuit,
//! split into two 128-bit limbs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::NoemaError;

/// A 256-bit dataset digest. Canonical rendering is lowercase hex of
/// exactly 64 characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetDigest(pub [u8; 32]);

impl DatasetDigest {
    /// Digest raw dataset bytes, byte for byte.
    pub fn of(dataset: &[u8]) -> Self {
        let hash = Sha256::digest(dataset);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }

    /// Parse the canonical 64-character lowercase hex form.
    pub fn from_hex(s: &str) -> Result<Self, NoemaError> {
        let raw = hex::decode(s)
            .map_err(|_| NoemaError::bad_request("dataset digest must be hex"))?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| NoemaError::bad_request("dataset digest must be 32 bytes"))?;
        Ok(Self(bytes))
    }

    /// Canonical lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// High limb: first 16 bytes, big-endian.
    pub fn hi_limb(&self) -> [u8; 16] {
        self.0[..16].try_into().unwrap()
    }

    /// Low limb: last 16 bytes, big-endian.
    pub fn lo_limb(&self) -> [u8; 16] {
        self.0[16..].try_into().unwrap()
    }
}

impl std::fmt::Display for DatasetDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
