//! Versioned storage format for ratchet state.
//!
//! Ratchet state outlives the process, so its encoding is explicit and
//! versioned: an unknown version is a typed error, and a future format
//! change bumps [`RATCHET_RECORD_VERSION`] and migrates deterministically
//! instead of guessing at field layouts.

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Schema version this build reads and writes.
pub const RATCHET_RECORD_VERSION: u8 = 1;

/// A message key derived but not yet consumed, retained for late arrivals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedKeyRecord {
    /// Chain index the key was derived at.
    pub key_index: u64,
    /// The 32-byte message key.
    #[serde(with = "serde_bytes")]
    pub key: Vec<u8>,
}

/// Stored form of one (group, sender) ratchet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatchetRecord {
    /// Schema version; see [`RATCHET_RECORD_VERSION`].
    pub version: u8,
    /// Current 32-byte chain key.
    #[serde(with = "serde_bytes")]
    pub chain_key: Vec<u8>,
    /// Number of steps taken from genesis.
    pub key_index: u64,
    /// Retained skipped keys, oldest first.
    pub skipped_keys: Vec<SkippedKeyRecord>,
}

impl RatchetRecord {
    /// Build a current-version record from raw state fields.
    pub fn new(chain_key: [u8; 32], key_index: u64, skipped_keys: Vec<(u64, [u8; 32])>) -> Self {
        Self {
            version: RATCHET_RECORD_VERSION,
            chain_key: chain_key.to_vec(),
            key_index,
            skipped_keys: skipped_keys
                .into_iter()
                .map(|(key_index, key)| SkippedKeyRecord { key_index, key: key.to_vec() })
                .collect(),
        }
    }

    /// Serialize to CBOR bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        ciborium::into_writer(self, &mut out)
            .map_err(|e| ProtocolError::Encode(e.to_string()))?;
        Ok(out)
    }

    /// Parse from CBOR bytes, rejecting unknown schema versions and
    /// malformed key widths.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let record: Self =
            ciborium::from_reader(bytes).map_err(|e: ciborium::de::Error<std::io::Error>| {
                ProtocolError::Decode(e.to_string())
            })?;

        if record.version != RATCHET_RECORD_VERSION {
            return Err(ProtocolError::UnsupportedRecordVersion {
                found: record.version,
                expected: RATCHET_RECORD_VERSION,
            });
        }
        if record.chain_key.len() != 32 {
            return Err(ProtocolError::InvalidField {
                field: "chain_key",
                reason: format!("expected 32 bytes, got {}", record.chain_key.len()),
            });
        }
        for skipped in &record.skipped_keys {
            if skipped.key.len() != 32 {
                return Err(ProtocolError::InvalidField {
                    field: "skipped_keys",
                    reason: format!("expected 32-byte key, got {}", skipped.key.len()),
                });
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let record = RatchetRecord::new([7u8; 32], 42, vec![(40, [1u8; 32]), (41, [2u8; 32])]);
        let decoded = RatchetRecord::decode(&record.encode().unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn future_version_is_rejected() {
        let mut record = RatchetRecord::new([0u8; 32], 0, vec![]);
        record.version = 2;
        let result = RatchetRecord::decode(&record.encode().unwrap());
        assert!(matches!(
            result,
            Err(ProtocolError::UnsupportedRecordVersion { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn short_chain_key_is_rejected() {
        let mut record = RatchetRecord::new([0u8; 32], 0, vec![]);
        record.chain_key = vec![0u8; 16];
        let result = RatchetRecord::decode(&record.encode().unwrap());
        assert!(matches!(result, Err(ProtocolError::InvalidField { field: "chain_key", .. })));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(RatchetRecord::decode(b"junk"), Err(ProtocolError::Decode(_))));
    }
}
