//! Closed-group message codec ("shared sender keys").
//!
//! Two encryption layers, both AES-256-GCM:
//!
//! - an outer ephemeral-ECDH layer addressed to the group key pair, giving
//!   transport confidentiality against non-members, and
//! - an inner hash-ratchet layer under the sender's one-time message key,
//!   proving group membership and fixing message order within the chain.
//!
//! Both layers are preserved for wire compatibility with deployed peers; no
//! security properties beyond the above should be assumed of the combination
//! without further analysis.
//!
//! Wire layout:
//!
//! ```text
//! outer: [32 bytes: ephemeral public key] [12: IV] [N + 16: ciphertext + tag]
//! inner: [32 bytes: sender public key] [8: key index, BE] [12: IV] [N + 16: ct + tag]
//! ```

use crate::aead;
use crate::agreement::{self, PUBLIC_KEY_SIZE};

use super::error::ClosedGroupError;
use super::ratchet::HashRatchet;

/// Key-index field width in the inner record.
const KEY_INDEX_SIZE: usize = 8;

/// A closed-group message as it travels inside the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedGroupCiphertext {
    /// Sender's ephemeral X25519 public key for the outer layer.
    pub ephemeral_public_key: [u8; PUBLIC_KEY_SIZE],
    /// Outer `iv || ciphertext` wrapping the inner record.
    pub payload: Vec<u8>,
}

impl ClosedGroupCiphertext {
    /// Serialize to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PUBLIC_KEY_SIZE + self.payload.len());
        out.extend_from_slice(&self.ephemeral_public_key);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse from wire bytes. Rejects anything too short to hold the
    /// ephemeral key and one AEAD blob.
    pub fn decode(bytes: &[u8]) -> Result<Self, ClosedGroupError> {
        let needed = PUBLIC_KEY_SIZE + aead::IV_SIZE + aead::TAG_SIZE;
        if bytes.len() < needed {
            return Err(ClosedGroupError::MalformedCiphertext { needed, actual: bytes.len() });
        }
        let mut ephemeral_public_key = [0u8; PUBLIC_KEY_SIZE];
        ephemeral_public_key.copy_from_slice(&bytes[..PUBLIC_KEY_SIZE]);
        Ok(Self { ephemeral_public_key, payload: bytes[PUBLIC_KEY_SIZE..].to_vec() })
    }
}

/// Decrypted inner record: who sent it, at which chain position.
///
/// Produced by [`open_outer`]; the pipeline uses the sender identity here to
/// pick which (group, sender) chain to lock before finishing the unwrap.
pub struct InnerRecord {
    /// Inner sender identity (X25519 public key).
    pub sender_public_key: [u8; PUBLIC_KEY_SIZE],
    /// Chain index the sender encrypted under.
    pub key_index: u64,
    /// Ratchet-layer `iv || ciphertext`.
    pub iv_and_ciphertext: Vec<u8>,
}

impl InnerRecord {
    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            PUBLIC_KEY_SIZE + KEY_INDEX_SIZE + self.iv_and_ciphertext.len(),
        );
        out.extend_from_slice(&self.sender_public_key);
        out.extend_from_slice(&self.key_index.to_be_bytes());
        out.extend_from_slice(&self.iv_and_ciphertext);
        out
    }

    fn decode(bytes: &[u8]) -> Result<Self, ClosedGroupError> {
        let needed = PUBLIC_KEY_SIZE + KEY_INDEX_SIZE + aead::IV_SIZE + aead::TAG_SIZE;
        if bytes.len() < needed {
            return Err(ClosedGroupError::MalformedCiphertext { needed, actual: bytes.len() });
        }

        let mut sender_public_key = [0u8; PUBLIC_KEY_SIZE];
        sender_public_key.copy_from_slice(&bytes[..PUBLIC_KEY_SIZE]);

        let mut index = [0u8; KEY_INDEX_SIZE];
        index.copy_from_slice(&bytes[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + KEY_INDEX_SIZE]);

        Ok(Self {
            sender_public_key,
            key_index: u64::from_be_bytes(index),
            iv_and_ciphertext: bytes[PUBLIC_KEY_SIZE + KEY_INDEX_SIZE..].to_vec(),
        })
    }
}

/// Result of unwrapping a closed-group message.
pub struct UnwrappedMessage {
    /// Recovered plaintext.
    pub plaintext: Vec<u8>,
    /// Inner sender identity (X25519 public key).
    pub sender_public_key: [u8; PUBLIC_KEY_SIZE],
    /// Chain index the sender encrypted under.
    pub key_index: u64,
}

/// Encrypt a plaintext for a closed group, advancing the sender's ratchet.
///
/// The ratchet step and the use of the resulting key are a single logical
/// operation; callers persisting ratchet state must do so atomically with
/// this call under their per-(group, sender) lock.
pub fn wrap(
    plaintext: &[u8],
    group_public_key: &[u8; PUBLIC_KEY_SIZE],
    sender_public_key: &[u8; PUBLIC_KEY_SIZE],
    sender_ratchet: &mut HashRatchet,
) -> Result<ClosedGroupCiphertext, ClosedGroupError> {
    let message_key = sender_ratchet.step()?;
    let inner = InnerRecord {
        sender_public_key: *sender_public_key,
        key_index: message_key.key_index(),
        iv_and_ciphertext: aead::encrypt(message_key.key(), plaintext),
    };

    let (ephemeral_public_key, symmetric_key) = agreement::ephemeral_agreement(group_public_key);
    let payload = aead::encrypt(&symmetric_key, &inner.encode());

    Ok(ClosedGroupCiphertext { ephemeral_public_key, payload })
}

/// Remove the outer ephemeral-ECDH layer and parse the inner record.
///
/// The outer layer is removed first; only then is the inner record parsed,
/// so ciphertext is never interpreted as structure. Authentication failure
/// here touches no ratchet state. The returned record names the sender,
/// letting the caller lock the right (group, sender) chain before calling
/// [`finish_unwrap`].
pub fn open_outer(
    message: &ClosedGroupCiphertext,
    group_private_key: &[u8; 32],
) -> Result<InnerRecord, ClosedGroupError> {
    let symmetric_key =
        agreement::respond_agreement(group_private_key, &message.ephemeral_public_key);
    let inner_bytes = aead::decrypt(&symmetric_key, &message.payload)?;
    InnerRecord::decode(&inner_bytes)
}

/// Remove the inner ratchet layer of an opened record.
///
/// Rejects the message before any ratchet work if its sender is the local
/// user; otherwise advances the ratchet to the claimed index and decrypts.
/// Callers persisting ratchet state must do so atomically with this call
/// under their per-(group, sender) lock.
pub fn finish_unwrap(
    inner: &InnerRecord,
    user_public_key: &[u8; PUBLIC_KEY_SIZE],
    ratchet: &mut HashRatchet,
) -> Result<UnwrappedMessage, ClosedGroupError> {
    if inner.sender_public_key == *user_public_key {
        return Err(ClosedGroupError::SelfSendRejected);
    }

    let message_key = ratchet.message_key_at(inner.key_index)?;
    let plaintext = aead::decrypt(message_key.key(), &inner.iv_and_ciphertext)?;

    Ok(UnwrappedMessage {
        plaintext,
        sender_public_key: inner.sender_public_key,
        key_index: inner.key_index,
    })
}

/// Decrypt a closed-group message using the group private key and the
/// sender's ratchet: [`open_outer`] followed by [`finish_unwrap`].
pub fn unwrap(
    message: &ClosedGroupCiphertext,
    group_private_key: &[u8; 32],
    user_public_key: &[u8; PUBLIC_KEY_SIZE],
    ratchet: &mut HashRatchet,
) -> Result<UnwrappedMessage, ClosedGroupError> {
    let inner = open_outer(message, group_private_key)?;
    finish_unwrap(&inner, user_public_key, ratchet)
}
