//! Error types for the send and receive pipelines.
//!
//! The two paths have opposite propagation policies. Outbound failures are
//! surfaced as typed results so a job/retry layer above can decide what to
//! do. Inbound failures are recovered locally: malformed or hostile network
//! data is logged and dropped, and must never crash the process or abort
//! other in-flight work.

use thiserror::Error;

use swarmlink_crypto::ClosedGroupError;
use swarmlink_proto::ProtocolError;

/// Failures on the send path, surfaced to the caller for retry decisions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The message failed its variant's structural validity check.
    #[error("message is not valid for sending")]
    InvalidMessage,

    /// Content or envelope encoding failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] ProtocolError),

    /// The destination string is not a usable public key.
    #[error("invalid destination: {reason}")]
    InvalidDestination {
        /// Why the destination was rejected.
        reason: String,
    },

    /// No sender chain is installed for this group; the genesis chain key
    /// has not been distributed to us (or the group key pair rotated).
    #[error("missing sender chain for group {group}")]
    MissingGroupKey {
        /// Hex-encoded group public key.
        group: String,
    },

    /// Ratchet or encryption failure while wrapping.
    #[error("encryption failed: {0}")]
    EncryptionFailed(#[from] ClosedGroupError),

    /// The caller's cancellation flag fired during the proof-of-work search.
    #[error("proof-of-work failed: cancelled by caller")]
    ProofOfWorkFailed,

    /// The swarm client rejected the submission. No retry at this layer.
    #[error("delivery failed: {reason}")]
    DeliveryFailed {
        /// Transport-reported reason.
        reason: String,
    },
}

/// Failures on the receive path.
///
/// These are internal: the public [`receive`](crate::MessagePipeline::receive)
/// entry point logs them and returns `None` instead of propagating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReceiveError {
    /// Outer envelope bytes were not a valid encoding.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(ProtocolError),

    /// Envelope names a group we hold no private key for.
    #[error("missing private key for group {group}")]
    MissingGroupPrivateKey {
        /// Hex-encoded group public key.
        group: String,
    },

    /// The envelope source field is not a usable public key.
    #[error("invalid envelope source: {reason}")]
    InvalidSource {
        /// Why the source was rejected.
        reason: String,
    },

    /// Codec failure: authentication, self-send, or ratchet regression.
    /// All are drop-with-log conditions, not crashes; a misbehaving peer
    /// must not be able to disrupt local state.
    #[error(transparent)]
    Decryption(#[from] ClosedGroupError),

    /// Decrypted plaintext was not a valid content record.
    #[error("proto conversion failed: {0}")]
    ProtoConversionFailed(ProtocolError),

    /// Content record had no populated section we recognize.
    #[error("content matches no known message variant")]
    UnrecognizedContent,
}
