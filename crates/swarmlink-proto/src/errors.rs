//! Error types for wire encoding and decoding.
//!
//! Decode errors are expected in normal operation: the swarm hands the
//! pipeline whatever bytes peers submitted, including garbage. Every decode
//! path returns a typed error; none may panic.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors from encoding or decoding wire structures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// CBOR serialization failed. Practically unreachable for our types but
    /// surfaced rather than swallowed.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Input bytes are not a valid encoding of the expected structure.
    #[error("decode failed: {0}")]
    Decode(String),

    /// Envelope carried a ciphertext kind this implementation doesn't know.
    #[error("unknown envelope kind {kind}")]
    UnknownEnvelopeKind {
        /// Raw kind tag from the wire.
        kind: u8,
    },

    /// Stored record was written by a newer schema than this build supports.
    #[error("unsupported record version {found}, expected {expected}")]
    UnsupportedRecordVersion {
        /// Version byte found in the record.
        found: u8,
        /// Version this build reads and writes.
        expected: u8,
    },

    /// A field held a value outside its documented range.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Which field was out of range.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
