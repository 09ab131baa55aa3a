//! Property-based tests for wire encoding.
//!
//! Verifies that envelope and content serialization is correct for ALL
//! inputs, not just specific examples, and that arbitrary bytes never panic
//! the decoders.

use proptest::prelude::*;
use swarmlink_proto::{Content, Envelope, EnvelopeKind, Message, VisibleMessage};

fn arbitrary_kind() -> impl Strategy<Value = EnvelopeKind> {
    prop_oneof![Just(EnvelopeKind::SessionMessage), Just(EnvelopeKind::ClosedGroupMessage)]
}

fn arbitrary_envelope() -> impl Strategy<Value = Envelope> {
    (
        "[0-9a-f]{66}",
        any::<u64>(),
        arbitrary_kind(),
        prop::collection::vec(any::<u8>(), 0..2048),
    )
        .prop_map(|(source, timestamp_millis, kind, content)| Envelope {
            source,
            timestamp_millis,
            kind,
            content,
        })
}

#[test]
fn prop_envelope_roundtrip() {
    proptest!(|(envelope in arbitrary_envelope())| {
        let bytes = envelope.encode().expect("encode should succeed");
        let decoded = Envelope::decode(&bytes).expect("decode should succeed");
        prop_assert_eq!(decoded, envelope);
    });
}

#[test]
fn prop_envelope_decode_never_panics() {
    proptest!(|(bytes in prop::collection::vec(any::<u8>(), 0..512))| {
        // Arbitrary bytes must decode cleanly or fail with a typed error.
        let _ = Envelope::decode(&bytes);
    });
}

#[test]
fn prop_content_decode_never_panics() {
    proptest!(|(bytes in prop::collection::vec(any::<u8>(), 0..512))| {
        let _ = Content::decode(&bytes);
    });
}

#[test]
fn prop_visible_message_roundtrip() {
    proptest!(|(
        text in prop::option::of(".{0,200}"),
        attachment_ids in prop::collection::vec("[a-z0-9-]{1,32}", 0..4),
        quote_timestamp in prop::option::of(any::<u64>()),
    )| {
        let message = Message::Visible(VisibleMessage { text, attachment_ids, quote_timestamp });
        let bytes = message.to_content().encode().expect("encode should succeed");
        let decoded = Message::from_content(
            Content::decode(&bytes).expect("decode should succeed"),
        );
        prop_assert_eq!(decoded, Some(message));
    });
}
