//! PostgreSQL user directory.

use sqlx::PgPool;
use uuid::Uuid;

use async_trait::async_trait;
use memberhub_core::error::{AppError, ErrorKind};
use memberhub_core::result::AppResult;
use memberhub_entity::user::{User, UserRole, UserStatus};

use crate::traits::UserDirectory;

/// Database row for a user projection.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    display_name: String,
    role: String,
    status: String,
}

impl UserRow {
    fn into_entity(self) -> AppResult<User> {
        let role = self.role.parse::<UserRole>().map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Corrupt user role in storage", e)
        })?;
        let status = self.status.parse::<UserStatus>().map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Corrupt user status in storage", e)
        })?;
        Ok(User {
            id: self.id,
            username: self.username,
            display_name: self.display_name,
            role,
            status,
        })
    }
}

/// PostgreSQL-backed [`UserDirectory`].
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a new user directory over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to fetch user", e))?;
        row.map(UserRow::into_entity).transpose()
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT * FROM users WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to fetch user by username", e)
        })?;
        row.map(UserRow::into_entity).transpose()
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, username, display_name, role, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to insert user", e))?;
        row.into_entity()
    }

    async fn active_ids_by_role(&self, role: UserRole) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT id FROM users WHERE role = $1 AND status = 'active'")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to list users by role", e)
            })
    }
}
