//! PostgreSQL notification storage.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use async_trait::async_trait;
use memberhub_core::error::{AppError, ErrorKind};
use memberhub_core::result::AppResult;
use memberhub_core::types::pagination::{PageRequest, PageResponse};
use memberhub_entity::notification::{Notification, NotificationKind, Reference, ReferenceKind};

use crate::traits::NotificationStore;

/// Database row for a notification. The typed entity is assembled in
/// [`NotificationRow::into_entity`]; enum columns are TEXT validated at
/// this boundary.
#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    sender_id: Option<Uuid>,
    kind: String,
    title: String,
    message: String,
    reference_kind: Option<String>,
    reference_id: Option<Uuid>,
    link: Option<String>,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_entity(self) -> AppResult<Notification> {
        let kind = self.kind.parse::<NotificationKind>().map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Corrupt notification kind in storage", e)
        })?;
        let reference = match (self.reference_kind, self.reference_id) {
            (Some(ref_kind), Some(ref_id)) => Some(Reference {
                kind: ref_kind.parse::<ReferenceKind>().map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Internal,
                        "Corrupt reference kind in storage",
                        e,
                    )
                })?,
                id: ref_id,
            }),
            _ => None,
        };
        Ok(Notification {
            id: self.id,
            recipient_id: self.recipient_id,
            sender_id: self.sender_id,
            kind,
            title: self.title,
            message: self.message,
            reference,
            link: self.link,
            is_read: self.is_read,
            read_at: self.read_at,
            created_at: self.created_at,
        })
    }
}

/// PostgreSQL-backed [`NotificationStore`].
#[derive(Debug, Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    /// Create a new notification store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "INSERT INTO notifications \
             (id, recipient_id, sender_id, kind, title, message, reference_kind, reference_id, link, is_read, read_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(notification.id)
        .bind(notification.recipient_id)
        .bind(notification.sender_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.reference.map(|r| r.kind.as_str()))
        .bind(notification.reference.map(|r| r.id))
        .bind(notification.link.as_deref())
        .bind(notification.is_read)
        .bind(notification.read_at)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to insert notification", e)
        })?;
        row.into_entity()
    }

    async fn find_by_id(&self, recipient_id: Uuid, id: Uuid) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to fetch notification", e)
        })?;
        row.map(NotificationRow::into_entity).transpose()
    }

    async fn find_by_recipient(
        &self,
        recipient_id: Uuid,
        page: &PageRequest,
        unread_only: bool,
    ) -> AppResult<PageResponse<Notification>> {
        let filter = if unread_only {
            "AND is_read = FALSE"
        } else {
            ""
        };

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 {filter}"
        ))
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to count notifications", e)
        })?;

        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT * FROM notifications WHERE recipient_id = $1 {filter} \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(recipient_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to list notifications", e)
        })?;

        let items = rows
            .into_iter()
            .map(NotificationRow::into_entity)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(PageResponse::new(items, page, total as u64))
    }

    async fn count_unread(&self, recipient_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to count unread", e))
    }

    async fn mark_read(
        &self,
        recipient_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        // The conditional update only touches unread rows; a second call
        // falls through to the fetch and returns the row with its original
        // read_at intact.
        let updated = sqlx::query_as::<_, NotificationRow>(
            "UPDATE notifications SET is_read = TRUE, read_at = $3 \
             WHERE id = $1 AND recipient_id = $2 AND is_read = FALSE RETURNING *",
        )
        .bind(id)
        .bind(recipient_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to mark notification read", e)
        })?;

        match updated {
            Some(row) => row.into_entity().map(Some),
            None => self.find_by_id(recipient_id, id).await,
        }
    }

    async fn mark_all_read(&self, recipient_id: Uuid, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $2 \
             WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(recipient_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, recipient_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to delete notification", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for(&self, recipient_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE recipient_id = $1")
            .bind(recipient_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to delete notifications", e)
            })?;
        Ok(result.rows_affected())
    }
}
