//! The key store seam.
//!
//! The pipeline treats persistence as an external collaborator: a key-value
//! store holding the user's identity key pair, group private keys, and
//! per-(group, sender) ratchet records. Records cross this boundary as
//! already-encoded bytes — the pipeline owns the versioned format
//! ([`swarmlink_proto::RatchetRecord`]), the store just keeps bytes durable.

use std::collections::HashMap;
use std::sync::Mutex;

use swarmlink_crypto::{KeyPair, PUBLIC_KEY_SIZE};

/// Storage key for one sender chain.
pub type ChainId = (String, [u8; PUBLIC_KEY_SIZE]);

/// External persistent key storage consumed by the pipeline.
///
/// Implementations must be safe to call from any thread. The pipeline
/// serializes read-modify-write cycles per chain itself; stores only need
/// individual calls to be atomic.
pub trait KeyStore: Send + Sync {
    /// The local user's long-term X25519 key pair.
    fn user_key_pair(&self) -> KeyPair;

    /// Private key for a closed group we are a member of, if any.
    fn group_private_key(&self, group_public_key: &str) -> Option<[u8; 32]>;

    /// Encoded ratchet record for one (group, sender) chain, if any.
    fn ratchet_record(&self, group: &str, sender: &[u8; PUBLIC_KEY_SIZE]) -> Option<Vec<u8>>;

    /// Persist an encoded ratchet record, replacing any previous state for
    /// the chain.
    fn put_ratchet_record(&self, group: &str, sender: &[u8; PUBLIC_KEY_SIZE], record: Vec<u8>);

    /// Install the private half of a group key pair (group creation or a
    /// key-sharing message).
    fn put_group_private_key(&self, group_public_key: &str, private_key: [u8; 32]);
}

/// Hash-map backed [`KeyStore`] for tests and embedders without durable
/// storage.
pub struct InMemoryKeyStore {
    user: KeyPair,
    group_keys: Mutex<HashMap<String, [u8; 32]>>,
    ratchets: Mutex<HashMap<ChainId, Vec<u8>>>,
}

impl InMemoryKeyStore {
    /// Create a store owning the given user identity.
    pub fn new(user: KeyPair) -> Self {
        Self {
            user,
            group_keys: Mutex::new(HashMap::new()),
            ratchets: Mutex::new(HashMap::new()),
        }
    }
}

impl KeyStore for InMemoryKeyStore {
    fn user_key_pair(&self) -> KeyPair {
        self.user.clone()
    }

    fn group_private_key(&self, group_public_key: &str) -> Option<[u8; 32]> {
        match self.group_keys.lock() {
            Ok(keys) => keys.get(group_public_key).copied(),
            Err(poisoned) => poisoned.into_inner().get(group_public_key).copied(),
        }
    }

    fn ratchet_record(&self, group: &str, sender: &[u8; PUBLIC_KEY_SIZE]) -> Option<Vec<u8>> {
        let key = (group.to_string(), *sender);
        match self.ratchets.lock() {
            Ok(records) => records.get(&key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(&key).cloned(),
        }
    }

    fn put_ratchet_record(&self, group: &str, sender: &[u8; PUBLIC_KEY_SIZE], record: Vec<u8>) {
        let key = (group.to_string(), *sender);
        match self.ratchets.lock() {
            Ok(mut records) => {
                records.insert(key, record);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, record);
            }
        }
    }

    fn put_group_private_key(&self, group_public_key: &str, private_key: [u8; 32]) {
        match self.group_keys.lock() {
            Ok(mut keys) => {
                keys.insert(group_public_key.to_string(), private_key);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(group_public_key.to_string(), private_key);
            }
        }
    }
}
