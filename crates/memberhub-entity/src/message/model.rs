//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of characters kept in a conversation preview.
pub const PREVIEW_MAX_CHARS: usize = 80;

/// Preview text used when a message carries attachments but no text.
const ATTACHMENT_PLACEHOLDER: &str = "[attachment]";

/// A descriptor for a file already uploaded through the portal's storage
/// service. MemberHub never touches the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Download URL issued by the storage service.
    pub url: String,
    /// Original file name.
    pub filename: String,
    /// MIME type reported at upload time.
    pub mime_type: String,
    /// File size in bytes.
    pub size_bytes: i64,
}

/// A per-participant read marker on a message.
///
/// At most one receipt exists per participant per message; the storage key
/// enforces it, so marking read twice can never produce a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    /// The participant who read the message.
    pub participant_id: Uuid,
    /// When they read it.
    pub read_at: DateTime<Utc>,
}

/// A message inside a conversation.
///
/// Messages move from sent to read-by-each-participant independently, and a
/// sender may soft-delete their own message from any state. No transition
/// ever removes a read receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: Uuid,
    /// The conversation this message belongs to.
    pub conversation_id: Uuid,
    /// The author.
    pub sender_id: Uuid,
    /// Message text. May be empty only when attachments are present.
    pub content: String,
    /// Attachment descriptors.
    pub attachments: Vec<Attachment>,
    /// Read receipts, one per participant at most.
    pub read_by: Vec<ReadReceipt>,
    /// Soft-delete flag. Deleted messages keep their row; clients render a
    /// tombstone.
    pub is_deleted: bool,
    /// When the message was deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    /// When the message was sent.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message in the sent state.
    pub fn new(
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
        attachments: Vec<Attachment>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            content,
            attachments,
            read_by: Vec::new(),
            is_deleted: false,
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    /// Check whether the given participant has read this message.
    pub fn is_read_by(&self, participant_id: Uuid) -> bool {
        self.read_by
            .iter()
            .any(|r| r.participant_id == participant_id)
    }

    /// The denormalized preview text for conversation lists: the first
    /// [`PREVIEW_MAX_CHARS`] characters of the content, or a placeholder
    /// for attachment-only messages.
    pub fn preview(&self) -> String {
        if self.content.is_empty() {
            return ATTACHMENT_PLACEHOLDER.to_string();
        }
        match self.content.char_indices().nth(PREVIEW_MAX_CHARS) {
            Some((byte_idx, _)) => self.content[..byte_idx].to_string(),
            None => self.content.clone(),
        }
    }
}
