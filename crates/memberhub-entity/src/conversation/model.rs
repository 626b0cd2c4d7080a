//! Conversation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use memberhub_core::AppError;

/// Conversation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    /// A two-party conversation. At most one exists per unordered user pair.
    Direct,
    /// A multi-party conversation.
    Group,
}

impl ConversationKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConversationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "group" => Ok(Self::Group),
            _ => Err(AppError::invalid_spec(format!(
                "Invalid conversation kind: '{s}'"
            ))),
        }
    }
}

/// Normalize a direct-conversation pair into its canonical (low, high) order.
///
/// The pair uniqueness index is built over the sorted pair, so
/// `(a, b)` and `(b, a)` always address the same conversation.
pub fn direct_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

/// A conversation between portal members.
///
/// `last_message_*` fields are a denormalized cache of the newest visible
/// message, maintained on every append so conversation lists never scan the
/// message table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: Uuid,
    /// Direct or group.
    pub kind: ConversationKind,
    /// Participant user ids. Exactly two for direct conversations.
    pub participants: Vec<Uuid>,
    /// Id of the newest message, if any.
    pub last_message_id: Option<Uuid>,
    /// Timestamp of the newest message, if any.
    pub last_message_at: Option<DateTime<Utc>>,
    /// Truncated text of the newest message, if any.
    pub last_message_preview: Option<String>,
    /// Soft-close flag. Closed conversations reject new messages but stay
    /// readable.
    pub is_active: bool,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// When the conversation was last touched.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new direct conversation between two distinct users.
    /// Participants are stored in canonical pair order.
    pub fn direct(a: Uuid, b: Uuid) -> Self {
        let (lo, hi) = direct_pair(a, b);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind: ConversationKind::Direct,
            participants: vec![lo, hi],
            last_message_id: None,
            last_message_at: None,
            last_message_preview: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new group conversation.
    pub fn group(participants: Vec<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind: ConversationKind::Group,
            participants,
            last_message_id: None,
            last_message_at: None,
            last_message_preview: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether a user participates in this conversation.
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    /// All participants except the given user.
    pub fn other_participants(&self, user_id: Uuid) -> Vec<Uuid> {
        self.participants
            .iter()
            .copied()
            .filter(|p| *p != user_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_pair_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(direct_pair(a, b), direct_pair(b, a));
        let (lo, hi) = direct_pair(a, b);
        assert!(lo <= hi);
    }

    #[test]
    fn test_direct_stores_canonical_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let conv = Conversation::direct(a, b);
        let (lo, hi) = direct_pair(a, b);
        assert_eq!(conv.participants, vec![lo, hi]);
        assert_eq!(conv.kind, ConversationKind::Direct);
        assert!(conv.is_active);
    }

    #[test]
    fn test_participant_helpers() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        let conv = Conversation::direct(a, b);
        assert!(conv.is_participant(a));
        assert!(!conv.is_participant(outsider));
        assert_eq!(conv.other_participants(a), vec![b]);
        assert_eq!(conv.other_participants(b), vec![a]);
    }

    #[test]
    fn test_serializes_camel_case() {
        let conv = Conversation::direct(Uuid::new_v4(), Uuid::new_v4());
        let json = serde_json::to_value(&conv).unwrap();
        assert!(json.get("lastMessagePreview").is_some());
        assert!(json.get("isActive").is_some());
        assert_eq!(json["kind"], "direct");
    }
}
