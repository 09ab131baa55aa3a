//! The `Message` sum type and its canonical CBOR content encoding.
//!
//! A [`Content`] is the plaintext that lives inside an envelope once the
//! codec has run: a record of optional sections, exactly one of which should
//! be populated. [`Message::from_content`] resolves a content to a variant
//! by probing sections in a fixed priority order — the first populated
//! section wins, and a content with no recognized section is not a message.
//!
//! # Invariants
//!
//! - Round-trip: `Message::from_content(m.to_content())` yields `m` back for
//!   every valid message.
//! - One variant per envelope: the priority order makes resolution
//!   deterministic even if a buggy peer populates several sections.

mod closed_group;
mod control;
mod visible;

use serde::{Deserialize, Serialize};

pub use closed_group::{ChainKeyRecord, ClosedGroupUpdate};
pub use control::{
    ExpirationTimerUpdate, ReadReceipt, SessionRequest, TypingAction, TypingIndicator,
};
pub use visible::VisibleMessage;

use crate::errors::{ProtocolError, Result};

/// TTL for visible messages and receipts: 48 hours.
pub const VISIBLE_MESSAGE_TTL_MILLIS: u64 = 172_800_000;

/// TTL for ephemeral control traffic such as typing indicators: 1 minute.
pub const CONTROL_MESSAGE_TTL_MILLIS: u64 = 60_000;

/// TTL for group-config class messages: 4 days minus 1 hour, so a config
/// message never outlives the retrieval window it configures.
pub const CONFIG_MESSAGE_TTL_MILLIS: u64 = 345_600_000 - 3_600_000;

/// Plaintext content record: optional sections, one populated per message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Content {
    /// Read-receipt section.
    #[serde(default)]
    pub read_receipt: Option<ReadReceipt>,
    /// Session-request section.
    #[serde(default)]
    pub session_request: Option<SessionRequest>,
    /// Typing-indicator section.
    #[serde(default)]
    pub typing_indicator: Option<TypingIndicator>,
    /// Closed-group-update section.
    #[serde(default)]
    pub closed_group_update: Option<ClosedGroupUpdate>,
    /// Expiration-timer-update section.
    #[serde(default)]
    pub expiration_timer_update: Option<ExpirationTimerUpdate>,
    /// Visible-message section.
    #[serde(default)]
    pub visible_message: Option<VisibleMessage>,
}

impl Content {
    /// Serialize to canonical CBOR bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        ciborium::into_writer(self, &mut out)
            .map_err(|e| ProtocolError::Encode(e.to_string()))?;
        Ok(out)
    }

    /// Parse from CBOR bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e: ciborium::de::Error<std::io::Error>| {
            ProtocolError::Decode(e.to_string())
        })
    }
}

/// Everything the pipeline can send or receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A chat message shown in a conversation.
    Visible(VisibleMessage),
    /// Closed-group membership or key change.
    ClosedGroupUpdate(ClosedGroupUpdate),
    /// Disappearing-messages timer change.
    ExpirationTimerUpdate(ExpirationTimerUpdate),
    /// Read confirmation for earlier messages.
    ReadReceipt(ReadReceipt),
    /// Ephemeral typing state.
    TypingIndicator(TypingIndicator),
    /// Pairwise session establishment request.
    SessionRequest(SessionRequest),
}

impl Message {
    /// Resolve a content record to a message variant.
    ///
    /// Sections are probed in fixed priority order: read-receipt,
    /// session-request, typing-indicator, closed-group-update,
    /// expiration-timer-update, visible-message. Returns `None` when no
    /// section is populated.
    pub fn from_content(content: Content) -> Option<Self> {
        if let Some(receipt) = content.read_receipt {
            return Some(Self::ReadReceipt(receipt));
        }
        if let Some(request) = content.session_request {
            return Some(Self::SessionRequest(request));
        }
        if let Some(typing) = content.typing_indicator {
            return Some(Self::TypingIndicator(typing));
        }
        if let Some(update) = content.closed_group_update {
            return Some(Self::ClosedGroupUpdate(update));
        }
        if let Some(timer) = content.expiration_timer_update {
            return Some(Self::ExpirationTimerUpdate(timer));
        }
        if let Some(visible) = content.visible_message {
            return Some(Self::Visible(visible));
        }
        None
    }

    /// Canonical content record for this message.
    pub fn to_content(&self) -> Content {
        let mut content = Content::default();
        match self {
            Self::Visible(m) => content.visible_message = Some(m.clone()),
            Self::ClosedGroupUpdate(m) => content.closed_group_update = Some(m.clone()),
            Self::ExpirationTimerUpdate(m) => content.expiration_timer_update = Some(*m),
            Self::ReadReceipt(m) => content.read_receipt = Some(m.clone()),
            Self::TypingIndicator(m) => content.typing_indicator = Some(*m),
            Self::SessionRequest(m) => content.session_request = Some(m.clone()),
        }
        content
    }

    /// Structural validity check run before any send work.
    pub fn is_valid_for_sending(&self) -> bool {
        match self {
            Self::Visible(m) => m.is_valid_for_sending(),
            Self::ClosedGroupUpdate(m) => m.is_valid_for_sending(),
            Self::ExpirationTimerUpdate(m) => m.is_valid_for_sending(),
            Self::ReadReceipt(m) => m.is_valid_for_sending(),
            Self::TypingIndicator(m) => m.is_valid_for_sending(),
            Self::SessionRequest(m) => m.is_valid_for_sending(),
        }
    }

    /// How long the swarm should retain this message.
    ///
    /// Visible traffic and receipts get the full 48 hours; typing indicators
    /// are worthless after a minute; group-config messages use the long
    /// config window.
    pub fn ttl_millis(&self) -> u64 {
        match self {
            Self::Visible(_) | Self::ReadReceipt(_) | Self::ExpirationTimerUpdate(_) => {
                VISIBLE_MESSAGE_TTL_MILLIS
            }
            Self::TypingIndicator(_) => CONTROL_MESSAGE_TTL_MILLIS,
            Self::ClosedGroupUpdate(_) | Self::SessionRequest(_) => CONFIG_MESSAGE_TTL_MILLIS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_roundtrips_through_content() {
        let messages = vec![
            Message::Visible(VisibleMessage { text: Some("hi".into()), ..Default::default() }),
            Message::ClosedGroupUpdate(ClosedGroupUpdate::MemberLeft),
            Message::ExpirationTimerUpdate(ExpirationTimerUpdate { duration_seconds: 300 }),
            Message::ReadReceipt(ReadReceipt { timestamps: vec![1, 2, 3] }),
            Message::TypingIndicator(TypingIndicator { action: TypingAction::Started }),
            Message::SessionRequest(SessionRequest::default()),
        ];

        for message in messages {
            let bytes = message.to_content().encode().unwrap();
            let decoded = Message::from_content(Content::decode(&bytes).unwrap());
            assert_eq!(decoded, Some(message));
        }
    }

    #[test]
    fn empty_content_is_not_a_message() {
        assert_eq!(Message::from_content(Content::default()), None);
    }

    #[test]
    fn priority_order_resolves_multi_section_content() {
        // A buggy peer populating several sections must resolve
        // deterministically: read-receipt outranks visible-message.
        let content = Content {
            read_receipt: Some(ReadReceipt { timestamps: vec![7] }),
            visible_message: Some(VisibleMessage {
                text: Some("also here".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(Message::from_content(content), Some(Message::ReadReceipt(_))));

        let content = Content {
            typing_indicator: Some(TypingIndicator { action: TypingAction::Stopped }),
            closed_group_update: Some(ClosedGroupUpdate::MemberLeft),
            ..Default::default()
        };
        assert!(matches!(Message::from_content(content), Some(Message::TypingIndicator(_))));
    }

    #[test]
    fn ttl_policy_per_kind() {
        let visible =
            Message::Visible(VisibleMessage { text: Some("x".into()), ..Default::default() });
        assert_eq!(visible.ttl_millis(), 172_800_000);

        let typing = Message::TypingIndicator(TypingIndicator { action: TypingAction::Started });
        assert_eq!(typing.ttl_millis(), 60_000);

        let update = Message::ClosedGroupUpdate(ClosedGroupUpdate::MemberLeft);
        assert_eq!(update.ttl_millis(), 342_000_000);
    }

    #[test]
    fn malformed_content_bytes_are_an_error() {
        assert!(Content::decode(&[0xFF, 0x00, 0x01]).is_err());
    }
}
