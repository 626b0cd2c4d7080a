//! In-memory conversation and unread-counter storage.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use async_trait::async_trait;
use memberhub_core::error::AppError;
use memberhub_core::result::AppResult;
use memberhub_core::types::pagination::{PageRequest, PageResponse};
use memberhub_entity::conversation::{Conversation, direct_pair};

use crate::traits::{ConversationStore, ConversationSummary};

/// DashMap-backed [`ConversationStore`].
///
/// Direct-pair uniqueness is enforced through the `direct_index` entry API:
/// the first inserter wins while holding the pair's shard lock, and the
/// loser observes `None` exactly like a rejected insert under the
/// PostgreSQL partial unique index.
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    conversations: DashMap<Uuid, Conversation>,
    direct_index: DashMap<(Uuid, Uuid), Uuid>,
    unreads: DashMap<(Uuid, Uuid), i64>,
}

impl MemoryConversationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn find_direct(&self, a: Uuid, b: Uuid) -> AppResult<Option<Conversation>> {
        let pair = direct_pair(a, b);
        let Some(id) = self.direct_index.get(&pair).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.conversations.get(&id).map(|c| c.clone()))
    }

    async fn insert_direct(&self, conversation: &Conversation) -> AppResult<Option<Conversation>> {
        let &[a, b] = conversation.participants.as_slice() else {
            return Err(AppError::invalid_spec(
                "Direct conversations have exactly two participants",
            ));
        };
        match self.direct_index.entry(direct_pair(a, b)) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(vacant) => {
                self.conversations
                    .insert(conversation.id, conversation.clone());
                vacant.insert(conversation.id);
                Ok(Some(conversation.clone()))
            }
        }
    }

    async fn insert_group(&self, conversation: &Conversation) -> AppResult<Conversation> {
        self.conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Conversation>> {
        Ok(self.conversations.get(&id).map(|c| c.clone()))
    }

    async fn list_for_participant(
        &self,
        participant_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ConversationSummary>> {
        let mut rows: Vec<Conversation> = self
            .conversations
            .iter()
            .filter(|c| c.is_active && c.is_participant(participant_id))
            .map(|c| c.clone())
            .collect();
        // Most recently active first; conversations without messages last.
        rows.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|conversation| {
                let unread_count = self
                    .unreads
                    .get(&(conversation.id, participant_id))
                    .map(|c| *c.value())
                    .unwrap_or(0);
                ConversationSummary {
                    conversation,
                    unread_count,
                }
            })
            .collect();
        Ok(PageResponse::new(items, page, total))
    }

    async fn touch_last_message(
        &self,
        id: Uuid,
        message_id: Uuid,
        at: DateTime<Utc>,
        preview: &str,
    ) -> AppResult<()> {
        if let Some(mut conversation) = self.conversations.get_mut(&id) {
            conversation.last_message_id = Some(message_id);
            conversation.last_message_at = Some(at);
            conversation.last_message_preview = Some(preview.to_string());
            conversation.updated_at = at;
        }
        Ok(())
    }

    async fn increment_unread(&self, id: Uuid, participants: &[Uuid]) -> AppResult<()> {
        for participant_id in participants {
            *self.unreads.entry((id, *participant_id)).or_insert(0) += 1;
        }
        Ok(())
    }

    async fn reset_unread(&self, id: Uuid, participant_id: Uuid) -> AppResult<()> {
        // Absolute write, exactly like the SQL `SET unread_count = 0`.
        self.unreads.insert((id, participant_id), 0);
        Ok(())
    }

    async fn unread_count(&self, id: Uuid, participant_id: Uuid) -> AppResult<i64> {
        Ok(self
            .unreads
            .get(&(id, participant_id))
            .map(|c| *c.value())
            .unwrap_or(0))
    }

    async fn total_unread(&self, participant_id: Uuid) -> AppResult<i64> {
        let mut total = 0;
        for entry in self.unreads.iter() {
            let (conversation_id, owner) = *entry.key();
            if owner != participant_id {
                continue;
            }
            let active = self
                .conversations
                .get(&conversation_id)
                .map(|c| c.is_active)
                .unwrap_or(false);
            if active {
                total += *entry.value();
            }
        }
        Ok(total)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<()> {
        if let Some(mut conversation) = self.conversations.get_mut(&id) {
            conversation.is_active = active;
            conversation.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_direct_insert_for_same_pair_is_rejected() {
        let store = MemoryConversationStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let first = store
            .insert_direct(&Conversation::direct(a, b))
            .await
            .unwrap();
        assert!(first.is_some());

        // Reversed argument order addresses the same pair.
        let second = store
            .insert_direct(&Conversation::direct(b, a))
            .await
            .unwrap();
        assert!(second.is_none());

        let found = store.find_direct(b, a).await.unwrap().unwrap();
        assert_eq!(found.id, first.unwrap().id);
    }

    #[tokio::test]
    async fn test_counters_increment_and_reset_absolutely() {
        let store = MemoryConversationStore::new();
        let conversation = Conversation::direct(Uuid::new_v4(), Uuid::new_v4());
        let reader = conversation.participants[0];
        store.insert_direct(&conversation).await.unwrap();

        for _ in 0..3 {
            store
                .increment_unread(conversation.id, &[reader])
                .await
                .unwrap();
        }
        assert_eq!(store.unread_count(conversation.id, reader).await.unwrap(), 3);

        store.reset_unread(conversation.id, reader).await.unwrap();
        assert_eq!(store.unread_count(conversation.id, reader).await.unwrap(), 0);

        // Resetting an already-zero counter stays zero.
        store.reset_unread(conversation.id, reader).await.unwrap();
        assert_eq!(store.unread_count(conversation.id, reader).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_total_unread_skips_closed_conversations() {
        let store = MemoryConversationStore::new();
        let user = Uuid::new_v4();
        let open = Conversation::direct(user, Uuid::new_v4());
        let closed = Conversation::direct(user, Uuid::new_v4());
        store.insert_direct(&open).await.unwrap();
        store.insert_direct(&closed).await.unwrap();

        store.increment_unread(open.id, &[user]).await.unwrap();
        store.increment_unread(closed.id, &[user]).await.unwrap();
        store.set_active(closed.id, false).await.unwrap();

        assert_eq!(store.total_unread(user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_by_latest_message() {
        let store = MemoryConversationStore::new();
        let user = Uuid::new_v4();
        let quiet = Conversation::direct(user, Uuid::new_v4());
        let busy = Conversation::direct(user, Uuid::new_v4());
        store.insert_direct(&quiet).await.unwrap();
        store.insert_direct(&busy).await.unwrap();

        store
            .touch_last_message(busy.id, Uuid::new_v4(), Utc::now(), "latest")
            .await
            .unwrap();

        let page = store
            .list_for_participant(user, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].conversation.id, busy.id);
        assert_eq!(page.items[1].conversation.id, quiet.id);
    }
}
