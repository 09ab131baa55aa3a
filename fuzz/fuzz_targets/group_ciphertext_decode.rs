//! Fuzz target for the closed-group wire parser and outer layer
//!
//! Feeds arbitrary bytes through ClosedGroupCiphertext::decode and, when
//! parsing succeeds, attempts the outer decryption with a throwaway group
//! key:
//! - Truncated wire bytes
//! - Garbage ephemeral public keys (invalid curve points included)
//! - Corrupt AEAD payloads
//!
//! The fuzzer should NEVER panic and never touch ratchet state.

#![no_main]

use libfuzzer_sys::fuzz_target;
use swarmlink_crypto::ClosedGroupCiphertext;
use swarmlink_crypto::sender_keys::open_outer;

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = ClosedGroupCiphertext::decode(data) {
        // Arbitrary ephemeral keys must fail authentication cleanly.
        let group_private_key = [7u8; 32];
        let _ = open_outer(&message, &group_private_key);
    }
});
