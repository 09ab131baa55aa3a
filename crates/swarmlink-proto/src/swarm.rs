//! The submission record handed to the storage network.

use serde::{Deserialize, Serialize};

/// One message as submitted to (and replicated by) the swarm.
///
/// All binary fields are transport-encoded: `data` is the base64 envelope,
/// `nonce` the base64 proof-of-work nonce. Storage nodes verify the nonce
/// against `(timestamp, ttl, recipient, data)` before accepting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwarmMessage {
    /// Hex-encoded recipient public key (contact or group).
    pub recipient_public_key: String,
    /// Base64-encoded envelope bytes.
    pub data: String,
    /// Requested retention, milliseconds.
    pub ttl_millis: u64,
    /// Submission timestamp, milliseconds since the Unix epoch.
    pub timestamp_millis: u64,
    /// Base64-encoded 8-byte proof-of-work nonce.
    pub nonce: String,
}
