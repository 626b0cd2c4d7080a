//! Persistence gateway traits.
//!
//! Services depend on these traits only; the concrete gateway (PostgreSQL or
//! in-memory) is chosen at startup. Every implementation must preserve the
//! documented atomicity guarantees, since the services build their
//! concurrency story on top of them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use memberhub_core::result::AppResult;
use memberhub_core::types::pagination::{PageRequest, PageResponse};
use memberhub_entity::conversation::Conversation;
use memberhub_entity::message::Message;
use memberhub_entity::notification::Notification;
use memberhub_entity::user::{User, UserRole};

/// A conversation joined with the caller's unread counter, as shown in
/// conversation lists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// The conversation row.
    #[serde(flatten)]
    pub conversation: Conversation,
    /// The caller's unread count for this conversation.
    pub unread_count: i64,
}

/// Storage operations for notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a new notification row.
    async fn insert(&self, notification: &Notification) -> AppResult<Notification>;

    /// Fetch one notification, scoped to its recipient.
    async fn find_by_id(&self, recipient_id: Uuid, id: Uuid) -> AppResult<Option<Notification>>;

    /// List a recipient's notifications, newest first.
    async fn find_by_recipient(
        &self,
        recipient_id: Uuid,
        page: &PageRequest,
        unread_only: bool,
    ) -> AppResult<PageResponse<Notification>>;

    /// Count a recipient's unread notifications in a single aggregate.
    async fn count_unread(&self, recipient_id: Uuid) -> AppResult<i64>;

    /// Mark one notification read.
    ///
    /// Idempotent: an already-read notification is returned unchanged, with
    /// its original `read_at`. Returns `None` when no such notification
    /// exists for this recipient.
    async fn mark_read(
        &self,
        recipient_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Notification>>;

    /// Mark all of a recipient's unread notifications read. Returns the
    /// number of rows that changed.
    async fn mark_all_read(&self, recipient_id: Uuid, at: DateTime<Utc>) -> AppResult<u64>;

    /// Delete one notification, scoped to its recipient. Returns whether a
    /// row was removed.
    async fn delete(&self, recipient_id: Uuid, id: Uuid) -> AppResult<bool>;

    /// Delete all of a recipient's notifications. Returns the removed count.
    async fn delete_all_for(&self, recipient_id: Uuid) -> AppResult<u64>;
}

/// Storage operations for conversations and their unread counters.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Find the direct conversation between two users, if one exists.
    /// The pair is normalized internally, so argument order is irrelevant.
    async fn find_direct(&self, a: Uuid, b: Uuid) -> AppResult<Option<Conversation>>;

    /// Insert a direct conversation.
    ///
    /// Returns `Ok(None)` when the unique-pair constraint rejected the
    /// insert, meaning a concurrent caller created the conversation first;
    /// the caller is expected to re-run [`Self::find_direct`].
    async fn insert_direct(&self, conversation: &Conversation) -> AppResult<Option<Conversation>>;

    /// Insert a group conversation.
    async fn insert_group(&self, conversation: &Conversation) -> AppResult<Conversation>;

    /// Fetch one conversation.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Conversation>>;

    /// List a participant's active conversations with their unread counts,
    /// most recently active first.
    async fn list_for_participant(
        &self,
        participant_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ConversationSummary>>;

    /// Update the denormalized last-message cache.
    async fn touch_last_message(
        &self,
        id: Uuid,
        message_id: Uuid,
        at: DateTime<Utc>,
        preview: &str,
    ) -> AppResult<()>;

    /// Atomically add one to the unread counter of each given participant.
    /// Counters are created on first use.
    async fn increment_unread(&self, id: Uuid, participants: &[Uuid]) -> AppResult<()>;

    /// Reset one participant's unread counter to zero. An absolute write, so
    /// it commutes with concurrent increments without ever double-counting.
    async fn reset_unread(&self, id: Uuid, participant_id: Uuid) -> AppResult<()>;

    /// Read one participant's unread counter for a conversation.
    async fn unread_count(&self, id: Uuid, participant_id: Uuid) -> AppResult<i64>;

    /// Sum a participant's unread counters across their active
    /// conversations. Never scans messages.
    async fn total_unread(&self, participant_id: Uuid) -> AppResult<i64>;

    /// Soft-close or reopen a conversation.
    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<()>;
}

/// Storage operations for messages and read receipts.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message.
    async fn insert(&self, message: &Message) -> AppResult<Message>;

    /// Fetch one message with its read receipts.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Message>>;

    /// List a conversation's messages, newest first, receipts batch-loaded.
    async fn list_for_conversation(
        &self,
        conversation_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Message>>;

    /// Add a read receipt for every message in the conversation that lacks
    /// one for this participant, in one idempotent bulk operation. Returns
    /// the number of receipts newly added.
    async fn add_read_receipts(
        &self,
        conversation_id: Uuid,
        participant_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Soft-delete a message. Idempotent: an already-deleted message is
    /// returned as-is. Returns `None` when the message does not exist.
    async fn mark_deleted(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Message>>;
}

/// Read-side directory of portal members.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch one user.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Fetch one user by username, case-insensitively.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Insert a user projection (seeding and directory sync).
    async fn insert(&self, user: &User) -> AppResult<User>;

    /// Ids of all active users holding a role, for bulk fan-out targeting.
    async fn active_ids_by_role(&self, role: UserRole) -> AppResult<Vec<Uuid>>;
}
