//! The outer protocol container.
//!
//! An [`Envelope`] is what actually travels through the swarm: who (or which
//! group) it concerns, when it was sent, which codec protects the content,
//! and the opaque ciphertext itself. The swarm transmits it unmodified; the
//! receiver's pipeline consumes it exactly once.
//!
//! Envelopes are CBOR-encoded. Decoding arbitrary bytes must never panic —
//! this is the first structure touched by untrusted network input (and is
//! fuzzed for exactly that reason).

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Which codec protects the envelope content.
///
/// Tag values match the original wire protocol's ciphertext-kind enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EnvelopeKind {
    /// Pairwise 1:1 ciphertext (ephemeral ECDH, no ratchet layer).
    SessionMessage,
    /// Closed-group ciphertext (shared sender keys, double layer).
    ClosedGroupMessage,
}

impl From<EnvelopeKind> for u8 {
    fn from(kind: EnvelopeKind) -> Self {
        match kind {
            EnvelopeKind::SessionMessage => 6,
            EnvelopeKind::ClosedGroupMessage => 7,
        }
    }
}

impl TryFrom<u8> for EnvelopeKind {
    type Error = ProtocolError;

    fn try_from(kind: u8) -> Result<Self> {
        match kind {
            6 => Ok(Self::SessionMessage),
            7 => Ok(Self::ClosedGroupMessage),
            other => Err(ProtocolError::UnknownEnvelopeKind { kind: other }),
        }
    }
}

/// Outer container for one message in the swarm.
///
/// # Invariants
///
/// - `source` is a hex-encoded public key: the sender's for pairwise
///   messages, the group's for closed-group messages (the inner record
///   carries the actual sender).
/// - `content` is ciphertext for both kinds; it is never parsed as plaintext
///   structure before the matching codec has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Hex-encoded source public key (sender or group, by kind).
    pub source: String,
    /// Sender-claimed timestamp, milliseconds since the Unix epoch.
    pub timestamp_millis: u64,
    /// Which codec protects `content`.
    pub kind: EnvelopeKind,
    /// Opaque ciphertext bytes.
    #[serde(with = "serde_bytes")]
    pub content: Vec<u8>,
}

impl Envelope {
    /// Serialize to canonical CBOR bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        ciborium::into_writer(self, &mut out)
            .map_err(|e| ProtocolError::Encode(e.to_string()))?;
        Ok(out)
    }

    /// Parse from CBOR bytes. Any structural problem is a typed error.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e: ciborium::de::Error<std::io::Error>| {
            ProtocolError::Decode(e.to_string())
        })
    }
}
