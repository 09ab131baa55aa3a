//! Swarmlink Wire Types
//!
//! Everything that crosses a process boundary in the protocol core: the
//! outer [`Envelope`], the [`Message`] sum type with its CBOR content
//! encoding, the [`SwarmMessage`] submission record, and the versioned
//! [`RatchetRecord`] storage format.
//!
//! Payloads use CBOR for type safety and forward compatibility: it's
//! self-describing (field names embedded), compact, and needs no code
//! generation. Ciphertext stays opaque `Vec<u8>` until the matching codec
//! has run; nothing in this crate interprets encrypted bytes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod envelope;
mod errors;
mod messages;
mod ratchet_record;
mod swarm;

pub use envelope::{Envelope, EnvelopeKind};
pub use errors::{ProtocolError, Result};
pub use messages::{
    CONFIG_MESSAGE_TTL_MILLIS, CONTROL_MESSAGE_TTL_MILLIS, ChainKeyRecord, ClosedGroupUpdate,
    Content, ExpirationTimerUpdate, Message, ReadReceipt, SessionRequest, TypingAction,
    TypingIndicator, VISIBLE_MESSAGE_TTL_MILLIS, VisibleMessage,
};
pub use ratchet_record::{RATCHET_RECORD_VERSION, RatchetRecord, SkippedKeyRecord};
pub use swarm::SwarmMessage;
