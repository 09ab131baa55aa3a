//! Closed-group membership and key-distribution messages.

use serde::{Deserialize, Serialize};

/// Genesis chain key for one sender's hash ratchet, distributed when a group
/// is created or its key pair rotates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainKeyRecord {
    /// Hex-encoded public key of the member this chain belongs to.
    pub sender_public_key: String,
    /// 32-byte genesis chain key.
    #[serde(with = "serde_bytes")]
    pub chain_key: Vec<u8>,
}

/// Membership and key changes for a closed group.
///
/// Key-pair rotation on membership change is driven by the group creator;
/// receivers reset chain state for the new key-pair epoch when they see
/// a `New` update for a rotated group key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosedGroupUpdate {
    /// Group creation (or key rotation): full group description.
    New {
        /// Group public key; doubles as the group identifier.
        #[serde(with = "serde_bytes")]
        public_key: Vec<u8>,
        /// Display name of the group.
        name: String,
        /// Hex-encoded member public keys.
        members: Vec<String>,
        /// Hex-encoded admin public keys.
        admins: Vec<String>,
        /// Genesis chain keys for each member's sender ratchet.
        chain_keys: Vec<ChainKeyRecord>,
    },
    /// The group was renamed.
    NameChange {
        /// New display name.
        name: String,
    },
    /// Members joined.
    MembersAdded {
        /// Hex-encoded public keys of the new members.
        members: Vec<String>,
    },
    /// Members were removed by an admin.
    MembersRemoved {
        /// Hex-encoded public keys of the removed members.
        members: Vec<String>,
    },
    /// The sender left the group.
    MemberLeft,
}

impl ClosedGroupUpdate {
    /// Structural validity per variant.
    pub fn is_valid_for_sending(&self) -> bool {
        match self {
            Self::New { public_key, name, members, .. } => {
                public_key.len() == 32 && !name.trim().is_empty() && !members.is_empty()
            }
            Self::NameChange { name } => !name.trim().is_empty(),
            Self::MembersAdded { members } | Self::MembersRemoved { members } => {
                !members.is_empty()
            }
            Self::MemberLeft => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_group_requires_key_name_and_members() {
        let valid = ClosedGroupUpdate::New {
            public_key: vec![0u8; 32],
            name: "ops".into(),
            members: vec!["05aa".into()],
            admins: vec![],
            chain_keys: vec![],
        };
        assert!(valid.is_valid_for_sending());

        let bad_key = ClosedGroupUpdate::New {
            public_key: vec![0u8; 16],
            name: "ops".into(),
            members: vec!["05aa".into()],
            admins: vec![],
            chain_keys: vec![],
        };
        assert!(!bad_key.is_valid_for_sending());
    }

    #[test]
    fn rename_requires_a_name() {
        assert!(!ClosedGroupUpdate::NameChange { name: "  ".into() }.is_valid_for_sending());
        assert!(ClosedGroupUpdate::NameChange { name: "ops".into() }.is_valid_for_sending());
    }

    #[test]
    fn member_left_is_always_valid() {
        assert!(ClosedGroupUpdate::MemberLeft.is_valid_for_sending());
    }
}
