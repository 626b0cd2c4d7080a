//! PostgreSQL gateway implementation.

pub mod conversations;
pub mod messages;
pub mod migration;
pub mod notifications;
pub mod pool;
pub mod users;

pub use conversations::PgConversationStore;
pub use messages::PgMessageStore;
pub use migration::run_migrations;
pub use notifications::PgNotificationStore;
pub use pool::connect as connect_pool;
pub use users::PgUserDirectory;
