//! Stateful fuzz target for the hash ratchet
//!
//! Drives one ratchet through an arbitrary operation sequence:
//! - Sequential steps
//! - Arbitrary (including regressive and far-future) key index requests
//! - State save/restore mid-sequence
//!
//! # Invariants
//!
//! - No operation panics or loops unboundedly (skip window is capped)
//! - key_index never decreases
//! - A restored state behaves identically to the saved one

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use swarmlink_crypto::HashRatchet;

#[derive(Debug, Clone, Arbitrary)]
enum RatchetOp {
    Step,
    KeyAt { index: u64 },
    SaveRestore,
}

fuzz_target!(|input: ([u8; 32], Vec<RatchetOp>)| {
    let (genesis, ops) = input;
    let mut ratchet = HashRatchet::new(genesis);

    for op in ops.into_iter().take(256) {
        let before = ratchet.key_index();
        match op {
            RatchetOp::Step => {
                let _ = ratchet.step();
            }
            RatchetOp::KeyAt { index } => {
                let _ = ratchet.message_key_at(index);
            }
            RatchetOp::SaveRestore => {
                ratchet = HashRatchet::from_state(&ratchet.to_state());
            }
        }
        assert!(ratchet.key_index() >= before, "key index must never decrease");
    }
});
