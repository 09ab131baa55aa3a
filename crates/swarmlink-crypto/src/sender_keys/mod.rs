//! Shared sender keys: the closed-group encryption scheme.
//!
//! Each member of a closed group keeps one hash ratchet per other member.
//! Ratchets advance independently, so members exchange no per-message key
//! material; a genesis chain key per (group, sender) is enough for everyone
//! to derive the same one-time message keys.

mod codec;
mod error;
mod ratchet;

pub use codec::{
    ClosedGroupCiphertext, InnerRecord, UnwrappedMessage, finish_unwrap, open_outer, unwrap, wrap,
};
pub use error::ClosedGroupError;
pub use ratchet::{HashRatchet, MessageKey, RatchetState};
