//! Store bundle that dispatches to the configured gateway provider.

use std::sync::Arc;

use tracing::info;

use memberhub_core::config::store::StoreConfig;
use memberhub_core::error::AppError;
use memberhub_core::result::AppResult;

use crate::memory::{
    MemoryConversationStore, MemoryMessageStore, MemoryNotificationStore, MemoryUserDirectory,
};
use crate::postgres::{
    PgConversationStore, PgMessageStore, PgNotificationStore, PgUserDirectory, connect_pool,
    run_migrations,
};
use crate::traits::{ConversationStore, MessageStore, NotificationStore, UserDirectory};

/// The persistence gateway bundle handed to the service layer.
///
/// The provider is selected at construction time based on configuration;
/// services only ever see the trait objects.
#[derive(Clone)]
pub struct Store {
    /// Notification storage.
    pub notifications: Arc<dyn NotificationStore>,
    /// Conversation and unread-counter storage.
    pub conversations: Arc<dyn ConversationStore>,
    /// Message and read-receipt storage.
    pub messages: Arc<dyn MessageStore>,
    /// User directory projection.
    pub users: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Create a store from configuration.
    pub async fn connect(config: &StoreConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "postgres" => {
                info!("Initializing PostgreSQL store");
                let pool = connect_pool(&config.postgres).await?;
                if config.postgres.run_migrations {
                    run_migrations(&pool).await?;
                }
                Ok(Self {
                    notifications: Arc::new(PgNotificationStore::new(pool.clone())),
                    conversations: Arc::new(PgConversationStore::new(pool.clone())),
                    messages: Arc::new(PgMessageStore::new(pool.clone())),
                    users: Arc::new(PgUserDirectory::new(pool)),
                })
            }
            "memory" => {
                info!("Initializing in-memory store");
                Ok(Self::in_memory())
            }
            other => Err(AppError::configuration(format!(
                "Unknown store provider: '{other}'. Supported: memory, postgres"
            ))),
        }
    }

    /// Create an in-memory store directly (used by tests).
    pub fn in_memory() -> Self {
        Self {
            notifications: Arc::new(MemoryNotificationStore::new()),
            conversations: Arc::new(MemoryConversationStore::new()),
            messages: Arc::new(MemoryMessageStore::new()),
            users: Arc::new(MemoryUserDirectory::new()),
        }
    }
}
