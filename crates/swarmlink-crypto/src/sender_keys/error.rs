//! Error types for shared sender keys.

use thiserror::Error;

/// Errors from the hash ratchet and the closed-group codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClosedGroupError {
    /// A message claimed a key index earlier than the chain position and the
    /// key for that index is no longer retained. Ratchets never move
    /// backward; this is either a stale duplicate or an attack.
    #[error("ratchet regression: chain is at index {current}, message claims {requested}")]
    RatchetRegression {
        /// Current chain position.
        current: u64,
        /// Index the message was encrypted under.
        requested: u64,
    },

    /// A message claimed a key index too far ahead of the chain position.
    /// Bounds the work a malicious sender can force on receivers.
    #[error("excessive ratchet skip: chain is at index {current}, message claims {requested}")]
    ExcessiveSkip {
        /// Current chain position.
        current: u64,
        /// Index the message was encrypted under.
        requested: u64,
    },

    /// The chain cannot advance past `u64::MAX`.
    #[error("key index overflow at {current}")]
    KeyIndexOverflow {
        /// Current chain position.
        current: u64,
    },

    /// AEAD authentication failed. Fatal for this message only; ratchet
    /// state is untouched.
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// What stage of unwrapping failed.
        reason: String,
    },

    /// The inner sender is the local user. A member must never
    /// decrypt-and-accept its own outgoing message.
    #[error("rejected own message reflected back from the swarm")]
    SelfSendRejected,

    /// Wire bytes are too short to contain the declared structure.
    #[error("malformed ciphertext: need at least {needed} bytes, got {actual}")]
    MalformedCiphertext {
        /// Minimum length the structure requires.
        needed: usize,
        /// Length actually received.
        actual: usize,
    },
}
