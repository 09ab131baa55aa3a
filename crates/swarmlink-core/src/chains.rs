//! Per-(group, sender) ratchet chain registry.
//!
//! Ratchet state is shared mutable state: two concurrent decrypts for the
//! same chain must not both read one chain key and advance it independently,
//! or they mint divergent message keys. Every read-advance-persist cycle for
//! a chain therefore runs under that chain's own mutex, taken through
//! [`ChainRegistry::with_chain`]. Callers must not await while inside the
//! closure; the send and receive paths do all their chain work
//! synchronously and only suspend afterwards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use swarmlink_crypto::sender_keys::{ClosedGroupError, HashRatchet};
use swarmlink_crypto::{PUBLIC_KEY_SIZE, RatchetState};
use swarmlink_proto::{ProtocolError, RatchetRecord};

use crate::error::ReceiveError;
use crate::keystore::{ChainId, KeyStore};

/// Serializes access to each (group, sender) chain.
///
/// The outer map lock is held only long enough to fetch or create a chain's
/// mutex; the actual ratchet work runs under the per-chain lock, so
/// independent chains never contend.
pub(crate) struct ChainRegistry {
    locks: Mutex<HashMap<ChainId, Arc<Mutex<()>>>>,
}

impl ChainRegistry {
    pub(crate) fn new() -> Self {
        Self { locks: Mutex::new(HashMap::new()) }
    }

    /// Run `operation` on the chain's ratchet with exclusive access,
    /// persisting the advanced state if (and only if) it succeeds.
    ///
    /// A chain with no stored record starts from `genesis` when provided;
    /// otherwise the operation fails with the caller's `missing` error.
    pub(crate) fn with_chain<T>(
        &self,
        store: &dyn KeyStore,
        group: &str,
        sender: &[u8; PUBLIC_KEY_SIZE],
        genesis: Option<[u8; 32]>,
        operation: impl FnOnce(&mut HashRatchet) -> Result<T, ClosedGroupError>,
    ) -> Result<T, ChainError> {
        let chain_lock = self.lock_for(group, sender);
        let _guard = match chain_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut ratchet = match store.ratchet_record(group, sender) {
            Some(bytes) => {
                let record = RatchetRecord::decode(&bytes).map_err(ChainError::CorruptRecord)?;
                HashRatchet::from_state(&record_to_state(&record))
            }
            None => match genesis {
                Some(chain_key) => HashRatchet::new(chain_key),
                None => return Err(ChainError::NoChain),
            },
        };

        let result = operation(&mut ratchet).map_err(ChainError::Ratchet)?;

        // Persist atomically with the successful advance, still under the
        // per-chain lock.
        let state = ratchet.to_state();
        let record = RatchetRecord::new(state.chain_key, state.key_index, state.skipped_keys.clone());
        let bytes = record.encode().map_err(ChainError::CorruptRecord)?;
        store.put_ratchet_record(group, sender, bytes);

        Ok(result)
    }

    /// Install a genesis chain key for a (group, sender) pair, replacing any
    /// existing chain. Used when a group is created or its key pair rotates:
    /// a new key-pair epoch starts every chain over.
    ///
    /// Encoding a fresh record is the only fallible step here.
    pub(crate) fn install_genesis(
        &self,
        store: &dyn KeyStore,
        group: &str,
        sender: &[u8; PUBLIC_KEY_SIZE],
        chain_key: [u8; 32],
    ) -> Result<(), ProtocolError> {
        let chain_lock = self.lock_for(group, sender);
        let _guard = match chain_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let record = RatchetRecord::new(chain_key, 0, Vec::new());
        let bytes = record.encode()?;
        store.put_ratchet_record(group, sender, bytes);
        Ok(())
    }

    fn lock_for(&self, group: &str, sender: &[u8; PUBLIC_KEY_SIZE]) -> Arc<Mutex<()>> {
        let key = (group.to_string(), *sender);
        let mut locks = match self.locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(locks.entry(key).or_default())
    }
}

/// Failures from a chain operation.
pub(crate) enum ChainError {
    /// No stored chain and no genesis to start from.
    NoChain,
    /// Stored record failed to decode (or re-encode).
    CorruptRecord(ProtocolError),
    /// The ratchet itself rejected the operation.
    Ratchet(ClosedGroupError),
}

impl ChainError {
    pub(crate) fn into_receive_error(self, group: &str) -> ReceiveError {
        match self {
            Self::NoChain => ReceiveError::MissingGroupPrivateKey { group: group.to_string() },
            Self::CorruptRecord(e) => ReceiveError::ProtoConversionFailed(e),
            Self::Ratchet(e) => ReceiveError::Decryption(e),
        }
    }
}

fn record_to_state(record: &RatchetRecord) -> RatchetState {
    let mut chain_key = [0u8; 32];
    chain_key.copy_from_slice(&record.chain_key);

    let skipped_keys = record
        .skipped_keys
        .iter()
        .map(|skipped| {
            let mut key = [0u8; 32];
            key.copy_from_slice(&skipped.key);
            (skipped.key_index, key)
        })
        .collect();

    RatchetState { chain_key, key_index: record.key_index, skipped_keys }
}

#[cfg(test)]
mod tests {
    use swarmlink_crypto::generate_key_pair;

    use crate::keystore::InMemoryKeyStore;

    use super::*;

    #[test]
    fn operations_persist_advanced_state() {
        let store = InMemoryKeyStore::new(generate_key_pair());
        let registry = ChainRegistry::new();
        let sender = [3u8; 32];

        registry.install_genesis(&store, "group", &sender, [7u8; 32]).ok();

        let first = registry
            .with_chain(&store, "group", &sender, None, |ratchet| {
                ratchet.step().map(|key| key.key_index())
            })
            .ok();
        let second = registry
            .with_chain(&store, "group", &sender, None, |ratchet| {
                ratchet.step().map(|key| key.key_index())
            })
            .ok();

        assert_eq!(first, Some(0));
        assert_eq!(second, Some(1), "second step must see the persisted advance");
    }

    #[test]
    fn missing_chain_without_genesis_fails() {
        let store = InMemoryKeyStore::new(generate_key_pair());
        let registry = ChainRegistry::new();
        let result = registry.with_chain(&store, "group", &[0u8; 32], None, |ratchet| {
            ratchet.step().map(|_| ())
        });
        assert!(matches!(result, Err(ChainError::NoChain)));
    }

    #[test]
    fn failed_operation_does_not_persist() {
        let store = InMemoryKeyStore::new(generate_key_pair());
        let registry = ChainRegistry::new();
        let sender = [3u8; 32];
        registry.install_genesis(&store, "group", &sender, [7u8; 32]).ok();

        // Advance to 2, then attempt a regression.
        registry
            .with_chain(&store, "group", &sender, None, |ratchet| {
                ratchet.message_key_at(1).map(|_| ())
            })
            .ok();
        let before = store.ratchet_record("group", &sender);

        let result = registry.with_chain(&store, "group", &sender, None, |ratchet| {
            ratchet.advance_to(0).map(|()| ())
        });
        assert!(matches!(result, Err(ChainError::Ratchet(_))));
        assert_eq!(store.ratchet_record("group", &sender), before, "state must be unchanged");
    }

    #[test]
    fn concurrent_steps_on_one_chain_never_mint_duplicate_keys() {
        use std::collections::HashSet;

        const THREADS: u64 = 8;
        const STEPS_PER_THREAD: u64 = 16;

        let store = InMemoryKeyStore::new(generate_key_pair());
        let registry = ChainRegistry::new();
        let sender = [3u8; 32];
        registry.install_genesis(&store, "group", &sender, [7u8; 32]).unwrap();

        // Two racing operations must not both read one chain key and advance
        // it independently; every step gets its own index and key.
        let minted: Mutex<Vec<(u64, [u8; 32])>> = Mutex::new(Vec::new());
        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    for _ in 0..STEPS_PER_THREAD {
                        let result = registry
                            .with_chain(&store, "group", &sender, None, |ratchet| {
                                ratchet.step().map(|key| (key.key_index(), *key.key()))
                            })
                            .ok()
                            .unwrap();
                        minted.lock().unwrap().push(result);
                    }
                });
            }
        });

        let total = THREADS * STEPS_PER_THREAD;
        let minted = minted.into_inner().unwrap();
        assert_eq!(minted.len() as u64, total);

        let indices: HashSet<u64> = minted.iter().map(|(index, _)| *index).collect();
        let keys: HashSet<[u8; 32]> = minted.iter().map(|(_, key)| *key).collect();
        assert_eq!(indices.len() as u64, total, "every step must get its own index");
        assert_eq!(keys.len() as u64, total, "no message key may be minted twice");

        let stored = store.ratchet_record("group", &sender).unwrap();
        let record = RatchetRecord::decode(&stored).unwrap();
        assert_eq!(record.key_index, total, "stored chain must reflect every step");
    }

    #[test]
    fn genesis_reinstall_resets_the_chain() {
        let store = InMemoryKeyStore::new(generate_key_pair());
        let registry = ChainRegistry::new();
        let sender = [3u8; 32];

        registry.install_genesis(&store, "group", &sender, [7u8; 32]).ok();
        registry
            .with_chain(&store, "group", &sender, None, |ratchet| ratchet.step().map(|_| ()))
            .ok();

        // Key rotation: fresh epoch, chain starts over.
        registry.install_genesis(&store, "group", &sender, [8u8; 32]).ok();
        let index = registry
            .with_chain(&store, "group", &sender, None, |ratchet| {
                ratchet.step().map(|key| key.key_index())
            })
            .ok();
        assert_eq!(index, Some(0));
    }
}
