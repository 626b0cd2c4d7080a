//! In-memory message and read-receipt storage.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use async_trait::async_trait;
use memberhub_core::result::AppResult;
use memberhub_core::types::pagination::{PageRequest, PageResponse};
use memberhub_entity::message::{Message, ReadReceipt};

use crate::traits::MessageStore;

/// DashMap-backed [`MessageStore`]. Receipts live inline on the message
/// value; the add-if-absent check plays the role of the
/// `(message_id, participant_id)` primary key.
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    rows: DashMap<Uuid, Message>,
    by_conversation: DashMap<Uuid, Vec<Uuid>>,
}

impl MemoryMessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn conversation_message_ids(&self, conversation_id: Uuid) -> Vec<Uuid> {
        self.by_conversation
            .get(&conversation_id)
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert(&self, message: &Message) -> AppResult<Message> {
        self.rows.insert(message.id, message.clone());
        self.by_conversation
            .entry(message.conversation_id)
            .or_default()
            .push(message.id);
        Ok(message.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Message>> {
        Ok(self.rows.get(&id).map(|m| m.clone()))
    }

    async fn list_for_conversation(
        &self,
        conversation_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Message>> {
        let mut rows: Vec<Message> = self
            .conversation_message_ids(conversation_id)
            .into_iter()
            .filter_map(|id| self.rows.get(&id).map(|m| m.clone()))
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }

    async fn add_read_receipts(
        &self,
        conversation_id: Uuid,
        participant_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut added = 0;
        for id in self.conversation_message_ids(conversation_id) {
            if let Some(mut message) = self.rows.get_mut(&id) {
                if !message.is_read_by(participant_id) {
                    message.read_by.push(ReadReceipt {
                        participant_id,
                        read_at: at,
                    });
                    added += 1;
                }
            }
        }
        Ok(added)
    }

    async fn mark_deleted(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Message>> {
        let Some(mut message) = self.rows.get_mut(&id) else {
            return Ok(None);
        };
        if !message.is_deleted {
            message.is_deleted = true;
            message.deleted_at = Some(at);
        }
        Ok(Some(message.clone()))
    }
}
