//! PostgreSQL conversation and unread-counter storage.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use async_trait::async_trait;
use memberhub_core::error::{AppError, ErrorKind};
use memberhub_core::result::AppResult;
use memberhub_core::types::pagination::{PageRequest, PageResponse};
use memberhub_entity::conversation::{Conversation, ConversationKind, direct_pair};

use crate::traits::{ConversationStore, ConversationSummary};

/// Database row for a conversation. The `participant_lo`/`participant_hi`
/// pair columns exist only to back the direct-pair unique index and are not
/// read back.
#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    id: Uuid,
    kind: String,
    participants: Vec<Uuid>,
    last_message_id: Option<Uuid>,
    last_message_at: Option<DateTime<Utc>>,
    last_message_preview: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConversationRow {
    fn into_entity(self) -> AppResult<Conversation> {
        let kind = self.kind.parse::<ConversationKind>().map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Corrupt conversation kind in storage", e)
        })?;
        Ok(Conversation {
            id: self.id,
            kind,
            participants: self.participants,
            last_message_id: self.last_message_id,
            last_message_at: self.last_message_at,
            last_message_preview: self.last_message_preview,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Conversation row joined with the caller's unread counter.
#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    conversation: ConversationRow,
    unread_count: i64,
}

/// PostgreSQL-backed [`ConversationStore`].
#[derive(Debug, Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    /// Create a new conversation store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn find_direct(&self, a: Uuid, b: Uuid) -> AppResult<Option<Conversation>> {
        let (lo, hi) = direct_pair(a, b);
        let row = sqlx::query_as::<_, ConversationRow>(
            "SELECT * FROM conversations \
             WHERE kind = 'direct' AND participant_lo = $1 AND participant_hi = $2",
        )
        .bind(lo)
        .bind(hi)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to find direct conversation", e)
        })?;
        row.map(ConversationRow::into_entity).transpose()
    }

    async fn insert_direct(&self, conversation: &Conversation) -> AppResult<Option<Conversation>> {
        let &[a, b] = conversation.participants.as_slice() else {
            return Err(AppError::invalid_spec(
                "Direct conversations have exactly two participants",
            ));
        };
        let (lo, hi) = direct_pair(a, b);

        // DO NOTHING + RETURNING yields no row when the unique pair index
        // rejects the insert; the caller re-runs find_direct in that case.
        let row = sqlx::query_as::<_, ConversationRow>(
            "INSERT INTO conversations \
             (id, kind, participants, participant_lo, participant_hi, is_active, created_at, updated_at) \
             VALUES ($1, 'direct', $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (participant_lo, participant_hi) WHERE kind = 'direct' DO NOTHING \
             RETURNING *",
        )
        .bind(conversation.id)
        .bind(&conversation.participants)
        .bind(lo)
        .bind(hi)
        .bind(conversation.is_active)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to insert direct conversation", e)
        })?;
        row.map(ConversationRow::into_entity).transpose()
    }

    async fn insert_group(&self, conversation: &Conversation) -> AppResult<Conversation> {
        let row = sqlx::query_as::<_, ConversationRow>(
            "INSERT INTO conversations (id, kind, participants, is_active, created_at, updated_at) \
             VALUES ($1, 'group', $2, $3, $4, $5) RETURNING *",
        )
        .bind(conversation.id)
        .bind(&conversation.participants)
        .bind(conversation.is_active)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to insert group conversation", e)
        })?;
        row.into_entity()
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Conversation>> {
        let row = sqlx::query_as::<_, ConversationRow>("SELECT * FROM conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to fetch conversation", e)
            })?;
        row.map(ConversationRow::into_entity).transpose()
    }

    async fn list_for_participant(
        &self,
        participant_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ConversationSummary>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM conversations WHERE $1 = ANY(participants) AND is_active = TRUE",
        )
        .bind(participant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to count conversations", e)
        })?;

        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT c.*, COALESCE(u.unread_count, 0) AS unread_count \
             FROM conversations c \
             LEFT JOIN conversation_unreads u \
               ON u.conversation_id = c.id AND u.participant_id = $1 \
             WHERE $1 = ANY(c.participants) AND c.is_active = TRUE \
             ORDER BY c.last_message_at DESC NULLS LAST, c.created_at DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(participant_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to list conversations", e)
        })?;

        let items = rows
            .into_iter()
            .map(|row| {
                Ok(ConversationSummary {
                    conversation: row.conversation.into_entity()?,
                    unread_count: row.unread_count,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        Ok(PageResponse::new(items, page, total as u64))
    }

    async fn touch_last_message(
        &self,
        id: Uuid,
        message_id: Uuid,
        at: DateTime<Utc>,
        preview: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE conversations SET last_message_id = $2, last_message_at = $3, \
             last_message_preview = $4, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(message_id)
        .bind(at)
        .bind(preview)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to update last message", e)
        })?;
        Ok(())
    }

    async fn increment_unread(&self, id: Uuid, participants: &[Uuid]) -> AppResult<()> {
        if participants.is_empty() {
            return Ok(());
        }
        // One upsert for all recipients; the +1 happens inside the database,
        // so concurrent senders can never lose an increment.
        sqlx::query(
            "INSERT INTO conversation_unreads (conversation_id, participant_id, unread_count) \
             SELECT $1, p.id, 1 FROM unnest($2::uuid[]) AS p(id) \
             ON CONFLICT (conversation_id, participant_id) \
             DO UPDATE SET unread_count = conversation_unreads.unread_count + 1",
        )
        .bind(id)
        .bind(participants)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to increment unread counters", e)
        })?;
        Ok(())
    }

    async fn reset_unread(&self, id: Uuid, participant_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE conversation_unreads SET unread_count = 0 \
             WHERE conversation_id = $1 AND participant_id = $2",
        )
        .bind(id)
        .bind(participant_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to reset unread counter", e)
        })?;
        Ok(())
    }

    async fn unread_count(&self, id: Uuid, participant_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COALESCE((SELECT unread_count FROM conversation_unreads \
             WHERE conversation_id = $1 AND participant_id = $2), 0)",
        )
        .bind(id)
        .bind(participant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to read unread counter", e)
        })
    }

    async fn total_unread(&self, participant_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(u.unread_count), 0)::BIGINT \
             FROM conversation_unreads u \
             JOIN conversations c ON c.id = u.conversation_id \
             WHERE u.participant_id = $1 AND c.is_active = TRUE",
        )
        .bind(participant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to sum unread counters", e)
        })
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AppResult<()> {
        sqlx::query("UPDATE conversations SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to update conversation state", e)
            })?;
        Ok(())
    }
}
