//! X25519 key agreement and symmetric-key derivation.
//!
//! Both the pairwise codec and the outer layer of the closed-group codec
//! derive their AEAD key the same way: an ephemeral ECDH agreement against
//! the recipient's long-term key, run through HMAC-SHA256 under the fixed
//! `"LOKI"` label. The label is part of the wire protocol; changing it breaks
//! interoperability with every deployed peer.

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

type HmacSha256 = Hmac<Sha256>;

/// Domain-separation key for deriving AEAD keys from ECDH agreements.
const DERIVATION_KEY: &[u8] = b"LOKI";

/// X25519 public key width in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// A freshly generated X25519 key pair.
///
/// Group key pairs are created with this when a closed group is formed; the
/// public half doubles as the group identifier.
#[derive(Clone)]
pub struct KeyPair {
    /// Public half, safe to share.
    pub public_key: [u8; PUBLIC_KEY_SIZE],
    /// Private half; hand to the key store, never to the wire.
    pub private_key: [u8; 32],
}

/// Generate a new X25519 key pair from the system RNG.
pub fn generate_key_pair() -> KeyPair {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    KeyPair { public_key: public.to_bytes(), private_key: secret.to_bytes() }
}

/// Sender-side agreement: generate an ephemeral key pair, agree against the
/// recipient's public key, and derive the AEAD key.
///
/// Returns `(ephemeral_public_key, symmetric_key)`. The ephemeral secret
/// never leaves this function.
pub fn ephemeral_agreement(recipient_public_key: &[u8; PUBLIC_KEY_SIZE]) -> ([u8; 32], [u8; 32]) {
    let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral_secret);

    let shared = ephemeral_secret.diffie_hellman(&PublicKey::from(*recipient_public_key));
    (ephemeral_public.to_bytes(), derive_symmetric_key(shared.as_bytes()))
}

/// Recipient-side agreement: agree our long-term private key against the
/// sender's ephemeral public key and derive the same AEAD key.
pub fn respond_agreement(
    our_private_key: &[u8; 32],
    ephemeral_public_key: &[u8; PUBLIC_KEY_SIZE],
) -> [u8; 32] {
    let secret = StaticSecret::from(*our_private_key);
    let shared = secret.diffie_hellman(&PublicKey::from(*ephemeral_public_key));
    derive_symmetric_key(shared.as_bytes())
}

/// `HMAC-SHA256(key = "LOKI", message = shared_secret)`.
fn derive_symmetric_key(shared_secret: &[u8; 32]) -> [u8; 32] {
    let Ok(mut mac) = HmacSha256::new_from_slice(DERIVATION_KEY) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(shared_secret);
    let result = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    key.copy_from_slice(&result);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_sides_derive_the_same_key() {
        let recipient = generate_key_pair();
        let (ephemeral_public, sender_key) = ephemeral_agreement(&recipient.public_key);
        let recipient_key = respond_agreement(&recipient.private_key, &ephemeral_public);
        assert_eq!(sender_key, recipient_key);
    }

    #[test]
    fn wrong_private_key_derives_a_different_key() {
        let recipient = generate_key_pair();
        let other = generate_key_pair();

        let (ephemeral_public, sender_key) = ephemeral_agreement(&recipient.public_key);
        let wrong_key = respond_agreement(&other.private_key, &ephemeral_public);
        assert_ne!(sender_key, wrong_key);
    }

    #[test]
    fn each_agreement_uses_a_fresh_ephemeral() {
        let recipient = generate_key_pair();
        let (eph_a, key_a) = ephemeral_agreement(&recipient.public_key);
        let (eph_b, key_b) = ephemeral_agreement(&recipient.public_key);
        assert_ne!(eph_a, eph_b);
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn generated_key_pairs_are_distinct() {
        let a = generate_key_pair();
        let b = generate_key_pair();
        assert_ne!(a.public_key, b.public_key);
    }
}
