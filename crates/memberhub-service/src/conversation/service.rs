//! Conversation lifecycle, message append, and read-state management.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use memberhub_core::types::pagination::{PageRequest, PageResponse};
use memberhub_core::{AppError, AppResult};
use memberhub_entity::conversation::Conversation;
use memberhub_entity::message::{Attachment, Message};
use memberhub_realtime::{Broadcaster, RoomKey, ServerEvent};
use memberhub_store::traits::{ConversationStore, ConversationSummary, MessageStore};

/// Maximum message length in characters.
pub const MESSAGE_MAX_CHARS: usize = 4000;

/// Direct and group conversations: lookup-or-create, guarded append with
/// unread accounting, read receipts, and the events that go with them.
///
/// A per-conversation async mutex serializes the append pipeline, so
/// within one conversation broadcast order always equals commit order.
/// Different conversations never contend.
#[derive(Clone)]
pub struct ConversationService {
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    broadcaster: Arc<Broadcaster>,
    send_guards: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ConversationService {
    /// Creates a new conversation service.
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            conversations,
            messages,
            broadcaster,
            send_guards: Arc::new(DashMap::new()),
        }
    }

    /// Returns the direct conversation for the unordered pair, creating it
    /// on first contact.
    ///
    /// Safe under two members racing to message each other first: the
    /// storage pair constraint rejects the second insert, and the loser
    /// re-reads the winner's row.
    pub async fn find_or_create_direct(&self, a: Uuid, b: Uuid) -> AppResult<Conversation> {
        if a == b {
            return Err(AppError::invalid_spec(
                "A direct conversation needs two distinct members",
            ));
        }

        if let Some(existing) = self.conversations.find_direct(a, b).await? {
            return Ok(existing);
        }

        match self.conversations.insert_direct(&Conversation::direct(a, b)).await? {
            Some(created) => {
                info!(conversation_id = %created.id, "Created direct conversation");
                Ok(created)
            }
            None => {
                // Lost the creation race; the winner's row must exist now.
                self.conversations.find_direct(a, b).await?.ok_or_else(|| {
                    AppError::internal("Direct conversation missing after pair conflict")
                })
            }
        }
    }

    /// Creates a group conversation. The creator is always a participant.
    pub async fn create_group(
        &self,
        creator_id: Uuid,
        participants: Vec<Uuid>,
    ) -> AppResult<Conversation> {
        let mut members = vec![creator_id];
        for participant in participants {
            if !members.contains(&participant) {
                members.push(participant);
            }
        }
        if members.len() < 2 {
            return Err(AppError::invalid_spec(
                "A group conversation needs at least two members",
            ));
        }

        let created = self.conversations.insert_group(&Conversation::group(members)).await?;
        info!(
            conversation_id = %created.id,
            participants = created.participants.len(),
            "Created group conversation"
        );
        Ok(created)
    }

    /// Appends a message and fans out the matching events.
    ///
    /// Under the conversation's send guard, in order: persist the message,
    /// refresh the denormalized last-message cache, add one unread to every
    /// other participant, publish `conversation:message` to the
    /// conversation room, then `conversation:unread` to each other
    /// participant's own room.
    pub async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
        attachments: Vec<Attachment>,
    ) -> AppResult<Message> {
        let conversation = self.require_conversation(conversation_id).await?;
        if !conversation.is_participant(sender_id) {
            return Err(AppError::not_participant(
                "Sender is not a participant of this conversation",
            ));
        }
        if !conversation.is_active {
            return Err(AppError::conflict("Conversation is closed"));
        }
        if content.trim().is_empty() && attachments.is_empty() {
            return Err(AppError::invalid_spec(
                "A message needs text or at least one attachment",
            ));
        }
        if content.chars().count() > MESSAGE_MAX_CHARS {
            return Err(AppError::invalid_spec(format!(
                "Message exceeds {MESSAGE_MAX_CHARS} characters"
            )));
        }

        let guard = self.send_guard(conversation.id);
        let _ordered = guard.lock().await;

        let message = self
            .messages
            .insert(&Message::new(conversation.id, sender_id, content, attachments))
            .await?;
        self.conversations
            .touch_last_message(
                conversation.id,
                message.id,
                message.created_at,
                &message.preview(),
            )
            .await?;

        let others = conversation.other_participants(sender_id);
        self.conversations.increment_unread(conversation.id, &others).await?;

        self.broadcaster
            .publish(
                &RoomKey::conversation(conversation.id),
                &ServerEvent::ConversationMessage {
                    conversation_id: conversation.id,
                    message: message.clone(),
                },
            )
            .await;
        for participant_id in others {
            self.push_unread(conversation.id, participant_id).await;
        }

        Ok(message)
    }

    /// Marks the whole conversation read for one participant.
    ///
    /// One bulk add-if-absent covers every message, the unread counter is
    /// reset to zero absolutely, and two events go out: a
    /// `conversation:read` receipt to the conversation room and a fresh
    /// `conversation:unread` to the reader's own room so their other tabs
    /// drop the badge. Idempotent.
    pub async fn mark_read(&self, conversation_id: Uuid, participant_id: Uuid) -> AppResult<()> {
        let conversation = self.require_conversation(conversation_id).await?;
        if !conversation.is_participant(participant_id) {
            return Err(AppError::not_participant(
                "Reader is not a participant of this conversation",
            ));
        }

        let read_at = Utc::now();
        let added = self
            .messages
            .add_read_receipts(conversation.id, participant_id, read_at)
            .await?;
        self.conversations.reset_unread(conversation.id, participant_id).await?;
        debug!(
            conversation_id = %conversation.id,
            participant_id = %participant_id,
            receipts_added = added,
            "Marked conversation read"
        );

        self.broadcaster
            .publish(
                &RoomKey::conversation(conversation.id),
                &ServerEvent::ConversationRead {
                    conversation_id: conversation.id,
                    participant_id,
                    read_at,
                },
            )
            .await;
        self.push_unread(conversation.id, participant_id).await;

        Ok(())
    }

    /// Sum of the participant's unread counters across their active
    /// conversations.
    pub async fn total_unread(&self, participant_id: Uuid) -> AppResult<i64> {
        self.conversations.total_unread(participant_id).await
    }

    /// The participant's active conversations with unread counts, most
    /// recently active first.
    pub async fn list_conversations(
        &self,
        participant_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ConversationSummary>> {
        self.conversations.list_for_participant(participant_id, page).await
    }

    /// A page of the conversation's messages, newest first. Readable by
    /// participants only, including on closed conversations.
    pub async fn history(
        &self,
        conversation_id: Uuid,
        participant_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Message>> {
        let conversation = self.require_conversation(conversation_id).await?;
        if !conversation.is_participant(participant_id) {
            return Err(AppError::not_participant(
                "Reader is not a participant of this conversation",
            ));
        }
        self.messages.list_for_conversation(conversation.id, page).await
    }

    /// Soft-deletes a message. Only the sender may delete their own
    /// message; repeats return the tombstone without re-broadcasting.
    pub async fn delete_message(&self, message_id: Uuid, sender_id: Uuid) -> AppResult<Message> {
        let message = self
            .messages
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Message {message_id} not found")))?;
        if message.sender_id != sender_id {
            return Err(AppError::not_participant(
                "Only the sender can delete a message",
            ));
        }
        if message.is_deleted {
            return Ok(message);
        }

        let deleted = self
            .messages
            .mark_deleted(message_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Message {message_id} not found")))?;

        self.broadcaster
            .publish(
                &RoomKey::conversation(deleted.conversation_id),
                &ServerEvent::ConversationMessageDeleted {
                    conversation_id: deleted.conversation_id,
                    message_id: deleted.id,
                },
            )
            .await;

        Ok(deleted)
    }

    /// Soft-closes the conversation. Closed conversations reject appends
    /// but stay readable.
    pub async fn close(&self, conversation_id: Uuid, participant_id: Uuid) -> AppResult<()> {
        let conversation = self.require_conversation(conversation_id).await?;
        if !conversation.is_participant(participant_id) {
            return Err(AppError::not_participant(
                "Only a participant can close a conversation",
            ));
        }

        self.conversations.set_active(conversation.id, false).await?;
        self.send_guards.remove(&conversation.id);
        info!(conversation_id = %conversation.id, "Closed conversation");
        Ok(())
    }

    async fn require_conversation(&self, conversation_id: Uuid) -> AppResult<Conversation> {
        self.conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Conversation {conversation_id} not found")))
    }

    fn send_guard(&self, conversation_id: Uuid) -> Arc<Mutex<()>> {
        Arc::clone(&self.send_guards.entry(conversation_id).or_default())
    }

    /// Publishes the participant's fresh per-conversation and total unread
    /// counts to their own room. A failed counter read drops the event and
    /// nothing else.
    async fn push_unread(&self, conversation_id: Uuid, participant_id: Uuid) {
        let unread_count = match self
            .conversations
            .unread_count(conversation_id, participant_id)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    participant_id = %participant_id,
                    error = %e,
                    "Unread count read failed, skipping unread event"
                );
                return;
            }
        };
        let total_unread = match self.conversations.total_unread(participant_id).await {
            Ok(total) => total,
            Err(e) => {
                warn!(
                    participant_id = %participant_id,
                    error = %e,
                    "Total unread read failed, skipping unread event"
                );
                return;
            }
        };

        self.broadcaster
            .publish_to_user(
                participant_id,
                &ServerEvent::ConversationUnread {
                    conversation_id,
                    unread_count,
                    total_unread,
                },
            )
            .await;
    }
}

impl std::fmt::Debug for ConversationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationService")
            .field("guarded_conversations", &self.send_guards.len())
            .finish()
    }
}
