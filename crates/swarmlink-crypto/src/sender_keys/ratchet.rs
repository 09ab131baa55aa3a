//! Hash ratchet producing one-time message keys for one (group, sender) pair.
//!
//! Every group member runs an independent chain per sender. Advancing the
//! chain on each message gives forward secrecy within a sender's chain, and
//! because derivation is deterministic, every member derives bit-identical
//! message keys for the same genesis chain key and index.
//!
//! # Security Properties
//!
//! - Forward Secrecy: old chain keys are zeroized when advancing
//! - One-way: a chain key cannot be recovered from its successor
//! - Determinism: same genesis always produces the same key sequence

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use super::error::ClosedGroupError;

type HmacSha256 = Hmac<Sha256>;

/// Label for deriving a message key from the chain key.
const MESSAGE_KEY_LABEL: &[u8] = b"message_key";

/// Label for deriving the next chain key.
const CHAIN_KEY_LABEL: &[u8] = b"chain_key";

/// Maximum number of steps one call may advance the chain. A replicated
/// swarm delivers out of order, but a sender claiming an index this far
/// ahead is forcing work, not lagging.
const MAX_SKIP: u64 = 5000;

/// Maximum number of skipped message keys retained for late arrivals.
/// Oldest entries are evicted first.
const MAX_SKIPPED_KEYS: usize = 1000;

/// A message key derived from the ratchet.
///
/// Used for exactly one encryption or decryption, then discarded.
#[derive(Clone)]
pub struct MessageKey {
    key: [u8; 32],
    key_index: u64,
}

impl MessageKey {
    /// 32-byte symmetric key for AES-256-GCM.
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    /// Chain index this key was derived at.
    pub fn key_index(&self) -> u64 {
        self.key_index
    }
}

impl Drop for MessageKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Portable snapshot of ratchet state for persistence.
///
/// The key store owns durable storage; this struct is the exchange format
/// between the ratchet and whatever serialization the store applies.
#[derive(Clone)]
pub struct RatchetState {
    /// Current 32-byte chain key.
    pub chain_key: [u8; 32],
    /// Number of steps taken from genesis.
    pub key_index: u64,
    /// Message keys derived but not yet consumed, by index.
    pub skipped_keys: Vec<(u64, [u8; 32])>,
}

impl Drop for RatchetState {
    fn drop(&mut self) {
        self.chain_key.zeroize();
        for (_, key) in &mut self.skipped_keys {
            key.zeroize();
        }
    }
}

/// Forward-secure hash ratchet with retention of skipped message keys.
///
/// [`step`](Self::step) derives the message key for the current index and
/// advances the chain. [`message_key_at`](Self::message_key_at) serves
/// out-of-order delivery: indices ahead of the chain advance it (caching the
/// keys skipped over), indices behind it are served from the cache exactly
/// once, and anything else is a [`ClosedGroupError::RatchetRegression`].
pub struct HashRatchet {
    chain_key: [u8; 32],
    key_index: u64,
    skipped: BTreeMap<u64, [u8; 32]>,
}

impl HashRatchet {
    /// Install a genesis chain key at index 0.
    ///
    /// The genesis is distributed out-of-band (by the group creator or a
    /// key-sharing message); a group key rotation starts a fresh chain.
    pub fn new(chain_key: [u8; 32]) -> Self {
        Self { chain_key, key_index: 0, skipped: BTreeMap::new() }
    }

    /// Restore a ratchet from persisted state.
    pub fn from_state(state: &RatchetState) -> Self {
        Self {
            chain_key: state.chain_key,
            key_index: state.key_index,
            skipped: state.skipped_keys.iter().copied().collect(),
        }
    }

    /// Snapshot the current state for persistence.
    pub fn to_state(&self) -> RatchetState {
        RatchetState {
            chain_key: self.chain_key,
            key_index: self.key_index,
            skipped_keys: self.skipped.iter().map(|(&index, &key)| (index, key)).collect(),
        }
    }

    /// Number of steps taken from genesis.
    pub fn key_index(&self) -> u64 {
        self.key_index
    }

    /// Derive the message key for the current index and advance the chain.
    ///
    /// The old chain key is zeroized; the returned key carries the
    /// pre-advance index.
    pub fn step(&mut self) -> Result<MessageKey, ClosedGroupError> {
        if self.key_index == u64::MAX {
            return Err(ClosedGroupError::KeyIndexOverflow { current: self.key_index });
        }

        let message_key = derive(&self.chain_key, MESSAGE_KEY_LABEL);
        let next_chain_key = derive(&self.chain_key, CHAIN_KEY_LABEL);

        self.chain_key.zeroize();
        self.chain_key = next_chain_key;

        let key_index = self.key_index;
        self.key_index += 1;

        Ok(MessageKey { key: message_key, key_index })
    }

    /// Advance the chain until `key_index == target`, retaining every message
    /// key skipped over so late arrivals can still be decrypted.
    ///
    /// Fails without touching state if `target` is behind the chain or more
    /// than [`MAX_SKIP`] steps ahead.
    pub fn advance_to(&mut self, target: u64) -> Result<(), ClosedGroupError> {
        if target < self.key_index {
            return Err(ClosedGroupError::RatchetRegression {
                current: self.key_index,
                requested: target,
            });
        }
        if target - self.key_index > MAX_SKIP {
            return Err(ClosedGroupError::ExcessiveSkip {
                current: self.key_index,
                requested: target,
            });
        }

        while self.key_index < target {
            let index = self.key_index;
            let skipped = self.step()?;
            self.skipped.insert(index, *skipped.key());
            if self.skipped.len() > MAX_SKIPPED_KEYS {
                self.skipped.pop_first();
            }
        }
        Ok(())
    }

    /// Message key for exactly `index`.
    ///
    /// Ahead of the chain: advances (caching skipped keys) and leaves the
    /// chain at `index + 1`. Behind the chain: served from the skipped-key
    /// cache and evicted, so a second request for the same index is a
    /// regression error.
    pub fn message_key_at(&mut self, index: u64) -> Result<MessageKey, ClosedGroupError> {
        if index < self.key_index {
            return match self.skipped.remove(&index) {
                Some(key) => Ok(MessageKey { key, key_index: index }),
                None => Err(ClosedGroupError::RatchetRegression {
                    current: self.key_index,
                    requested: index,
                }),
            };
        }
        self.advance_to(index)?;
        self.step()
    }
}

impl Drop for HashRatchet {
    fn drop(&mut self) {
        self.chain_key.zeroize();
        for (_, key) in &mut self.skipped {
            key.zeroize();
        }
    }
}

fn derive(chain_key: &[u8; 32], label: &[u8]) -> [u8; 32] {
    let Ok(mut mac) = HmacSha256::new_from_slice(chain_key) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(label);
    let result = mac.finalize().into_bytes();

    let mut key = [0u8; 32];
    key.copy_from_slice(&result);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis() -> [u8; 32] {
        let mut seed = [0u8; 32];
        for (i, byte) in seed.iter_mut().enumerate() {
            *byte = i as u8;
        }
        seed
    }

    #[test]
    fn new_ratchet_starts_at_index_zero() {
        let ratchet = HashRatchet::new(genesis());
        assert_eq!(ratchet.key_index(), 0);
    }

    #[test]
    fn step_increments_index() {
        let mut ratchet = HashRatchet::new(genesis());

        let key0 = ratchet.step().unwrap();
        assert_eq!(key0.key_index(), 0);
        assert_eq!(ratchet.key_index(), 1);

        let key1 = ratchet.step().unwrap();
        assert_eq!(key1.key_index(), 1);
        assert_eq!(ratchet.key_index(), 2);
    }

    #[test]
    fn step_produces_unique_keys() {
        let mut ratchet = HashRatchet::new(genesis());

        let key0 = ratchet.step().unwrap();
        let key1 = ratchet.step().unwrap();
        let key2 = ratchet.step().unwrap();

        assert_ne!(key0.key(), key1.key(), "keys must be unique");
        assert_ne!(key1.key(), key2.key(), "keys must be unique");
        assert_ne!(key0.key(), key2.key(), "keys must be unique");
    }

    #[test]
    fn key_sequence_is_deterministic() {
        let mut left = HashRatchet::new(genesis());
        let mut right = HashRatchet::new(genesis());

        for _ in 0..1000 {
            let a = left.step().unwrap();
            let b = right.step().unwrap();
            assert_eq!(a.key(), b.key(), "same genesis must produce same keys");
            assert_eq!(a.key_index(), b.key_index());
        }
    }

    #[test]
    fn different_genesis_produces_different_keys() {
        let mut seed_a = [0u8; 32];
        let mut seed_b = [0u8; 32];
        seed_a[0] = 1;
        seed_b[0] = 2;

        let key_a = HashRatchet::new(seed_a).step().unwrap();
        let key_b = HashRatchet::new(seed_b).step().unwrap();

        assert_ne!(key_a.key(), key_b.key());
    }

    #[test]
    fn message_key_at_skips_forward() {
        let mut ratchet = HashRatchet::new(genesis());

        let key = ratchet.message_key_at(5).unwrap();
        assert_eq!(key.key_index(), 5);
        assert_eq!(ratchet.key_index(), 6);
    }

    #[test]
    fn message_key_at_matches_sequential_steps() {
        let mut sequential = HashRatchet::new(genesis());
        for _ in 0..5 {
            sequential.step().unwrap();
        }
        let expected = sequential.step().unwrap();

        let mut skipping = HashRatchet::new(genesis());
        let actual = skipping.message_key_at(5).unwrap();

        assert_eq!(expected.key(), actual.key());
    }

    #[test]
    fn skipped_keys_are_retained_for_late_arrivals() {
        let mut sender = HashRatchet::new(genesis());
        let key0 = sender.step().unwrap();
        let key1 = sender.step().unwrap();
        let key2 = sender.step().unwrap();

        // Receiver sees index 2 first, then 0 and 1 late.
        let mut receiver = HashRatchet::new(genesis());
        assert_eq!(receiver.message_key_at(2).unwrap().key(), key2.key());
        assert_eq!(receiver.key_index(), 3);
        assert_eq!(receiver.message_key_at(0).unwrap().key(), key0.key());
        assert_eq!(receiver.message_key_at(1).unwrap().key(), key1.key());
        assert_eq!(receiver.key_index(), 3);
    }

    #[test]
    fn consumed_index_is_a_regression() {
        let mut ratchet = HashRatchet::new(genesis());
        ratchet.message_key_at(3).unwrap();

        // Index 1 was skipped: available exactly once.
        ratchet.message_key_at(1).unwrap();
        let replay = ratchet.message_key_at(1);
        assert!(matches!(
            replay,
            Err(ClosedGroupError::RatchetRegression { current: 4, requested: 1 })
        ));
    }

    #[test]
    fn advance_to_rejects_regression_without_touching_state() {
        let mut ratchet = HashRatchet::new(genesis());
        ratchet.advance_to(5).unwrap();

        let result = ratchet.advance_to(3);
        assert!(matches!(
            result,
            Err(ClosedGroupError::RatchetRegression { current: 5, requested: 3 })
        ));
        assert_eq!(ratchet.key_index(), 5);
    }

    #[test]
    fn advance_to_rejects_excessive_skip() {
        let mut ratchet = HashRatchet::new(genesis());
        let result = ratchet.advance_to(MAX_SKIP + 100);
        assert!(matches!(result, Err(ClosedGroupError::ExcessiveSkip { .. })));
        assert_eq!(ratchet.key_index(), 0);
    }

    #[test]
    fn state_roundtrip_preserves_chain_and_cache() {
        let mut ratchet = HashRatchet::new(genesis());
        ratchet.message_key_at(4).unwrap();

        let state = ratchet.to_state();
        assert_eq!(state.key_index, 5);
        assert_eq!(state.skipped_keys.len(), 4);

        let mut restored = HashRatchet::from_state(&state);
        let original = ratchet.message_key_at(2).unwrap();
        let recovered = restored.message_key_at(2).unwrap();
        assert_eq!(original.key(), recovered.key());

        let next_a = ratchet.step().unwrap();
        let next_b = restored.step().unwrap();
        assert_eq!(next_a.key(), next_b.key());
    }
}
