//! AES-256-GCM helpers using the `iv || ciphertext` wire layout.
//!
//! Both encryption layers of the closed-group codec and the pairwise codec
//! use the same construction: a fresh random 12-byte IV prepended to the
//! ciphertext, which itself ends in the 16-byte GCM tag.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::sender_keys::ClosedGroupError;

/// AES-GCM IV width in bytes.
pub const IV_SIZE: usize = 12;

/// GCM authentication tag width in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under `key` with a fresh random IV.
///
/// Returns `iv || ciphertext` where the ciphertext includes the GCM tag.
pub fn encrypt(key: &[u8; 32], plaintext: &[u8]) -> Vec<u8> {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256Gcm::new(key.into());
    let Ok(ciphertext) = cipher.encrypt(Nonce::from_slice(&iv), plaintext) else {
        unreachable!("AES-GCM encryption cannot fail with valid inputs");
    };

    let mut out = Vec::with_capacity(IV_SIZE + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    out
}

/// Decrypt an `iv || ciphertext` blob produced by [`encrypt`].
///
/// Authentication failure is fatal for the message only; callers must not
/// mutate any ratchet state in response.
pub fn decrypt(key: &[u8; 32], iv_and_ciphertext: &[u8]) -> Result<Vec<u8>, ClosedGroupError> {
    if iv_and_ciphertext.len() < IV_SIZE + TAG_SIZE {
        return Err(ClosedGroupError::MalformedCiphertext {
            needed: IV_SIZE + TAG_SIZE,
            actual: iv_and_ciphertext.len(),
        });
    }

    let (iv, ciphertext) = iv_and_ciphertext.split_at(IV_SIZE);
    let cipher = Aes256Gcm::new(key.into());
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| ClosedGroupError::DecryptionFailed { reason: "authentication failed".into() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(fill: u8) -> [u8; 32] {
        [fill; 32]
    }

    #[test]
    fn roundtrip() {
        let sealed = encrypt(&key(1), b"hello swarm");
        assert_eq!(decrypt(&key(1), &sealed).unwrap(), b"hello swarm");
    }

    #[test]
    fn roundtrip_empty_plaintext() {
        let sealed = encrypt(&key(1), b"");
        assert_eq!(sealed.len(), IV_SIZE + TAG_SIZE);
        assert_eq!(decrypt(&key(1), &sealed).unwrap(), b"");
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let sealed = encrypt(&key(1), b"secret");
        let result = decrypt(&key(2), &sealed);
        assert!(matches!(result, Err(ClosedGroupError::DecryptionFailed { .. })));
    }

    #[test]
    fn tampering_fails_authentication() {
        let mut sealed = encrypt(&key(1), b"secret");
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;
        assert!(decrypt(&key(1), &sealed).is_err());
    }

    #[test]
    fn truncated_blob_is_malformed() {
        let result = decrypt(&key(1), &[0u8; IV_SIZE + TAG_SIZE - 1]);
        assert!(matches!(result, Err(ClosedGroupError::MalformedCiphertext { .. })));
    }

    #[test]
    fn fresh_iv_per_encryption() {
        let a = encrypt(&key(1), b"same plaintext");
        let b = encrypt(&key(1), b"same plaintext");
        assert_ne!(a[..IV_SIZE], b[..IV_SIZE]);
        assert_ne!(a, b);
    }
}
