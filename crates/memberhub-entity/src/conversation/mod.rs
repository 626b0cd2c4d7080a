//! Conversation entity.

pub mod model;

pub use model::{Conversation, ConversationKind, direct_pair};
