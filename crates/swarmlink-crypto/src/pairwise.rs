//! Pairwise (1:1) message codec.
//!
//! Same ephemeral-ECDH + AES-GCM construction as the outer closed-group
//! layer, without the ratchet: one-to-one conversations have no shared
//! sender chains, each message stands alone under a fresh ephemeral key.
//!
//! Wire layout: `[32 bytes: ephemeral public key] [12: IV] [N + 16: ct + tag]`

use crate::aead;
use crate::agreement::{self, PUBLIC_KEY_SIZE};
use crate::sender_keys::ClosedGroupError;

/// Encrypt a plaintext for one recipient.
///
/// Returns `ephemeral_public_key || iv || ciphertext`.
pub fn seal(plaintext: &[u8], recipient_public_key: &[u8; PUBLIC_KEY_SIZE]) -> Vec<u8> {
    let (ephemeral_public_key, symmetric_key) =
        agreement::ephemeral_agreement(recipient_public_key);
    let sealed = aead::encrypt(&symmetric_key, plaintext);

    let mut out = Vec::with_capacity(PUBLIC_KEY_SIZE + sealed.len());
    out.extend_from_slice(&ephemeral_public_key);
    out.extend_from_slice(&sealed);
    out
}

/// Decrypt a blob produced by [`seal`] with our long-term private key.
pub fn open(wire: &[u8], our_private_key: &[u8; 32]) -> Result<Vec<u8>, ClosedGroupError> {
    let needed = PUBLIC_KEY_SIZE + aead::IV_SIZE + aead::TAG_SIZE;
    if wire.len() < needed {
        return Err(ClosedGroupError::MalformedCiphertext { needed, actual: wire.len() });
    }

    let mut ephemeral_public_key = [0u8; PUBLIC_KEY_SIZE];
    ephemeral_public_key.copy_from_slice(&wire[..PUBLIC_KEY_SIZE]);

    let symmetric_key = agreement::respond_agreement(our_private_key, &ephemeral_public_key);
    aead::decrypt(&symmetric_key, &wire[PUBLIC_KEY_SIZE..])
}

#[cfg(test)]
mod tests {
    use crate::agreement::generate_key_pair;

    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let recipient = generate_key_pair();
        let wire = seal(b"direct message", &recipient.public_key);
        assert_eq!(open(&wire, &recipient.private_key).unwrap(), b"direct message");
    }

    #[test]
    fn wrong_recipient_cannot_open() {
        let recipient = generate_key_pair();
        let other = generate_key_pair();
        let wire = seal(b"not for you", &recipient.public_key);
        assert!(matches!(
            open(&wire, &other.private_key),
            Err(ClosedGroupError::DecryptionFailed { .. })
        ));
    }

    #[test]
    fn truncated_wire_is_malformed() {
        let recipient = generate_key_pair();
        assert!(matches!(
            open(&[0u8; 20], &recipient.private_key),
            Err(ClosedGroupError::MalformedCiphertext { .. })
        ));
    }
}
