//! Fuzz target for Content::decode and message resolution
//!
//! Exercises the plaintext content parser with arbitrary bytes, then runs
//! variant resolution on whatever decodes:
//! - Malformed CBOR
//! - Contents with zero or multiple populated sections
//! - Deeply nested or oversized structures
//!
//! The fuzzer should NEVER panic. Unresolvable contents yield None.

#![no_main]

use libfuzzer_sys::fuzz_target;
use swarmlink_proto::{Content, Message};

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = Content::decode(data) {
        // Resolution must be total: any decoded content is either a
        // message or None, never a panic.
        let _ = Message::from_content(content);
    }
});
