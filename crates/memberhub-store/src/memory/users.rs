//! In-memory user directory.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use async_trait::async_trait;
use memberhub_core::error::AppError;
use memberhub_core::result::AppResult;
use memberhub_entity::user::{User, UserRole};

use crate::traits::UserDirectory;

/// DashMap-backed [`UserDirectory`]. Username lookups go through a
/// lowercased index, matching the `LOWER(username)` unique index in
/// PostgreSQL.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    by_id: DashMap<Uuid, User>,
    by_username: DashMap<String, Uuid>,
}

impl MemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.by_id.get(&id).map(|u| u.clone()))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let Some(id) = self
            .by_username
            .get(&username.to_lowercase())
            .map(|e| *e.value())
        else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        match self.by_username.entry(user.username.to_lowercase()) {
            Entry::Occupied(existing) if *existing.get() != user.id => {
                Err(AppError::conflict(format!(
                    "Username '{}' is already taken",
                    user.username
                )))
            }
            Entry::Occupied(_) => {
                self.by_id.insert(user.id, user.clone());
                Ok(user.clone())
            }
            Entry::Vacant(vacant) => {
                self.by_id.insert(user.id, user.clone());
                vacant.insert(user.id);
                Ok(user.clone())
            }
        }
    }

    async fn active_ids_by_role(&self, role: UserRole) -> AppResult<Vec<Uuid>> {
        Ok(self
            .by_id
            .iter()
            .filter(|u| u.role == role && u.is_active())
            .map(|u| u.id)
            .collect())
    }
}
