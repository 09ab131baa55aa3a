//! Fuzz target for RatchetRecord::decode
//!
//! Stored ratchet records are re-read on every chain operation, so a
//! corrupt store must surface as a typed error:
//! - Malformed CBOR
//! - Unknown record versions
//! - Wrong-width chain and skipped keys
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use swarmlink_proto::RatchetRecord;

fuzz_target!(|data: &[u8]| {
    // This should never panic, only return Err for invalid data
    let _ = RatchetRecord::decode(data);
});
