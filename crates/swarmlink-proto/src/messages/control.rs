//! Control messages: receipts, typing indicators, timers, session requests.

use serde::{Deserialize, Serialize};

/// Tells the sender which of their messages have been read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadReceipt {
    /// Sent timestamps of the messages that were read.
    #[serde(default)]
    pub timestamps: Vec<u64>,
}

impl ReadReceipt {
    /// A receipt for nothing carries no information.
    pub fn is_valid_for_sending(&self) -> bool {
        !self.timestamps.is_empty()
    }
}

/// Asks a contact to establish a pairwise session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Opaque pre-key material for session establishment, if included.
    #[serde(default, with = "serde_bytes")]
    pub pre_key_bundle: Option<Vec<u8>>,
}

impl SessionRequest {
    /// Session requests are valid bare; the bundle is optional.
    pub fn is_valid_for_sending(&self) -> bool {
        true
    }
}

/// Whether the sender started or stopped typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypingAction {
    /// The sender began composing.
    Started,
    /// The sender stopped composing or sent the message.
    Stopped,
}

/// Ephemeral typing state for a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingIndicator {
    /// Current typing state.
    pub action: TypingAction,
}

impl TypingIndicator {
    /// Both actions are sendable.
    pub fn is_valid_for_sending(&self) -> bool {
        true
    }
}

/// Changes the disappearing-messages timer for a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationTimerUpdate {
    /// New timer duration in seconds; 0 disables disappearing messages.
    pub duration_seconds: u32,
}

impl ExpirationTimerUpdate {
    /// Any duration including 0 (timer off) is sendable.
    pub fn is_valid_for_sending(&self) -> bool {
        true
    }
}
