//! Fuzz target for Envelope::decode
//!
//! The envelope is the first structure touched by untrusted network input:
//! - Malformed or truncated CBOR
//! - Unknown envelope kind tags
//! - Oversized claimed byte-string lengths
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use swarmlink_proto::Envelope;

fuzz_target!(|data: &[u8]| {
    // This should never panic, only return Err for invalid data
    let _ = Envelope::decode(data);
});
