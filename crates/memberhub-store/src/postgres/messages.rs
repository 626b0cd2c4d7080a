//! PostgreSQL message and read-receipt storage.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use async_trait::async_trait;
use memberhub_core::error::{AppError, ErrorKind};
use memberhub_core::result::AppResult;
use memberhub_core::types::pagination::{PageRequest, PageResponse};
use memberhub_entity::message::{Attachment, Message, ReadReceipt};

use crate::traits::MessageStore;

/// Database row for a message. Attachments live in a JSONB column; read
/// receipts live in their own table and are joined in by the store.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    sender_id: Uuid,
    content: String,
    attachments: serde_json::Value,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_entity(self, read_by: Vec<ReadReceipt>) -> AppResult<Message> {
        let attachments: Vec<Attachment> =
            serde_json::from_value(self.attachments).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Internal,
                    "Corrupt attachment payload in storage",
                    e,
                )
            })?;
        Ok(Message {
            id: self.id,
            conversation_id: self.conversation_id,
            sender_id: self.sender_id,
            content: self.content,
            attachments,
            read_by,
            is_deleted: self.is_deleted,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
        })
    }
}

/// Database row for a read receipt.
#[derive(Debug, sqlx::FromRow)]
struct ReceiptRow {
    message_id: Uuid,
    participant_id: Uuid,
    read_at: DateTime<Utc>,
}

/// PostgreSQL-backed [`MessageStore`].
#[derive(Debug, Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    /// Create a new message store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Batch-load read receipts for a set of messages.
    async fn load_receipts(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<ReadReceipt>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, ReceiptRow>(
            "SELECT * FROM message_reads WHERE message_id = ANY($1) ORDER BY read_at",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to load read receipts", e)
        })?;

        let mut by_message: HashMap<Uuid, Vec<ReadReceipt>> = HashMap::new();
        for row in rows {
            by_message.entry(row.message_id).or_default().push(ReadReceipt {
                participant_id: row.participant_id,
                read_at: row.read_at,
            });
        }
        Ok(by_message)
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn insert(&self, message: &Message) -> AppResult<Message> {
        let attachments = serde_json::to_value(&message.attachments)?;
        let row = sqlx::query_as::<_, MessageRow>(
            "INSERT INTO messages \
             (id, conversation_id, sender_id, content, attachments, is_deleted, deleted_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(attachments)
        .bind(message.is_deleted)
        .bind(message.deleted_at)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to insert message", e))?;
        row.into_entity(Vec::new())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Message>> {
        let row = sqlx::query_as::<_, MessageRow>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to fetch message", e)
            })?;
        let Some(row) = row else { return Ok(None) };
        let mut receipts = self.load_receipts(&[row.id]).await?;
        let read_by = receipts.remove(&row.id).unwrap_or_default();
        row.into_entity(read_by).map(Some)
    }

    async fn list_for_conversation(
        &self,
        conversation_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Message>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
                .bind(conversation_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Persistence, "Failed to count messages", e)
                })?;

        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT * FROM messages WHERE conversation_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(conversation_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to list messages", e))?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut receipts = self.load_receipts(&ids).await?;

        let items = rows
            .into_iter()
            .map(|row| {
                let read_by = receipts.remove(&row.id).unwrap_or_default();
                row.into_entity(read_by)
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(PageResponse::new(items, page, total as u64))
    }

    async fn add_read_receipts(
        &self,
        conversation_id: Uuid,
        participant_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        // One statement covers the whole conversation; the primary key on
        // (message_id, participant_id) makes re-runs add nothing.
        let result = sqlx::query(
            "INSERT INTO message_reads (message_id, participant_id, read_at) \
             SELECT m.id, $2, $3 FROM messages m WHERE m.conversation_id = $1 \
             ON CONFLICT (message_id, participant_id) DO NOTHING",
        )
        .bind(conversation_id)
        .bind(participant_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to add read receipts", e)
        })?;
        Ok(result.rows_affected())
    }

    async fn mark_deleted(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<Option<Message>> {
        let updated = sqlx::query_as::<_, MessageRow>(
            "UPDATE messages SET is_deleted = TRUE, deleted_at = $2 \
             WHERE id = $1 AND is_deleted = FALSE RETURNING *",
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to mark message deleted", e)
        })?;

        match updated {
            Some(row) => {
                let mut receipts = self.load_receipts(&[row.id]).await?;
                let read_by = receipts.remove(&row.id).unwrap_or_default();
                row.into_entity(read_by).map(Some)
            }
            // Already deleted or missing; hand back whatever exists.
            None => self.find_by_id(id).await,
        }
    }
}
