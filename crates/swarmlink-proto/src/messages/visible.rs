//! User-visible chat messages.

use serde::{Deserialize, Serialize};

/// A chat message shown in a conversation: text, attachments, or both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VisibleMessage {
    /// Message body. `None` for attachment-only messages.
    #[serde(default)]
    pub text: Option<String>,
    /// Identifiers of attachments uploaded out-of-band.
    #[serde(default)]
    pub attachment_ids: Vec<String>,
    /// Sent timestamp of the message this one quotes, if any.
    #[serde(default)]
    pub quote_timestamp: Option<u64>,
}

impl VisibleMessage {
    /// A message with neither text nor attachments has nothing to show and
    /// is not worth a proof-of-work.
    pub fn is_valid_for_sending(&self) -> bool {
        let has_text = self.text.as_deref().is_some_and(|t| !t.trim().is_empty());
        has_text || !self.attachment_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_is_valid() {
        let message = VisibleMessage { text: Some("hello".into()), ..Default::default() };
        assert!(message.is_valid_for_sending());
    }

    #[test]
    fn attachment_only_message_is_valid() {
        let message =
            VisibleMessage { attachment_ids: vec!["att-1".into()], ..Default::default() };
        assert!(message.is_valid_for_sending());
    }

    #[test]
    fn empty_message_is_invalid() {
        assert!(!VisibleMessage::default().is_valid_for_sending());
        let blank = VisibleMessage { text: Some("   ".into()), ..Default::default() };
        assert!(!blank.is_valid_for_sending());
    }
}
