//! In-memory notification storage.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use async_trait::async_trait;
use memberhub_core::result::AppResult;
use memberhub_core::types::pagination::{PageRequest, PageResponse};
use memberhub_entity::notification::Notification;

use crate::traits::NotificationStore;

/// DashMap-backed [`NotificationStore`].
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    rows: DashMap<Uuid, Notification>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_for(&self, recipient_id: Uuid, unread_only: bool) -> Vec<Notification> {
        let mut rows: Vec<Notification> = self
            .rows
            .iter()
            .filter(|entry| {
                entry.recipient_id == recipient_id && (!unread_only || !entry.is_read)
            })
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        rows
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<Notification> {
        self.rows.insert(notification.id, notification.clone());
        Ok(notification.clone())
    }

    async fn find_by_id(&self, recipient_id: Uuid, id: Uuid) -> AppResult<Option<Notification>> {
        Ok(self
            .rows
            .get(&id)
            .filter(|n| n.recipient_id == recipient_id)
            .map(|n| n.clone()))
    }

    async fn find_by_recipient(
        &self,
        recipient_id: Uuid,
        page: &PageRequest,
        unread_only: bool,
    ) -> AppResult<PageResponse<Notification>> {
        let rows = self.sorted_for(recipient_id, unread_only);
        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }

    async fn count_unread(&self, recipient_id: Uuid) -> AppResult<i64> {
        Ok(self
            .rows
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(
        &self,
        recipient_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        let Some(mut entry) = self.rows.get_mut(&id) else {
            return Ok(None);
        };
        if entry.recipient_id != recipient_id {
            return Ok(None);
        }
        if !entry.is_read {
            entry.is_read = true;
            entry.read_at = Some(at);
        }
        Ok(Some(entry.clone()))
    }

    async fn mark_all_read(&self, recipient_id: Uuid, at: DateTime<Utc>) -> AppResult<u64> {
        let mut changed = 0;
        for mut entry in self.rows.iter_mut() {
            if entry.recipient_id == recipient_id && !entry.is_read {
                entry.is_read = true;
                entry.read_at = Some(at);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, recipient_id: Uuid, id: Uuid) -> AppResult<bool> {
        Ok(self
            .rows
            .remove_if(&id, |_, n| n.recipient_id == recipient_id)
            .is_some())
    }

    async fn delete_all_for(&self, recipient_id: Uuid) -> AppResult<u64> {
        let before = self.rows.len();
        self.rows.retain(|_, n| n.recipient_id != recipient_id);
        Ok((before - self.rows.len()) as u64)
    }
}
