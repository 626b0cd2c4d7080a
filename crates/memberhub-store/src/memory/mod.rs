//! In-memory gateway implementation.
//!
//! Full-fidelity versions of the store traits over DashMap, with the same
//! observable semantics as the PostgreSQL gateway. Used by the test suites
//! and as the dependency-free development mode.

pub mod conversations;
pub mod messages;
pub mod notifications;
pub mod users;

pub use conversations::MemoryConversationStore;
pub use messages::MemoryMessageStore;
pub use notifications::MemoryNotificationStore;
pub use users::MemoryUserDirectory;
