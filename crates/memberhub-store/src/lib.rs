//! # memberhub-store
//!
//! The persistence gateway for MemberHub: the store traits every service
//! depends on, a PostgreSQL implementation (sqlx), and a full-fidelity
//! in-memory implementation (DashMap) used for tests and dependency-free
//! development. The provider is selected by `[store] provider` in the
//! configuration.

pub mod memory;
pub mod postgres;
pub mod provider;
pub mod traits;

pub use provider::Store;
pub use traits::{
    ConversationStore, ConversationSummary, MessageStore, NotificationStore, UserDirectory,
};
