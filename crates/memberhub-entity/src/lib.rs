//! # memberhub-entity
//!
//! Domain entity models for MemberHub. Every struct in this crate represents
//! a stored record or a domain value object. All entities derive `Debug`,
//! `Clone`, `Serialize`, and `Deserialize`, and serialize with camelCase
//! field names because the portal's JavaScript clients consume these shapes
//! verbatim.
//!
//! Database row mapping lives in `memberhub-store`; this crate stays free of
//! persistence concerns.

pub mod conversation;
pub mod message;
pub mod notification;
pub mod user;

pub use conversation::{Conversation, ConversationKind};
pub use message::{Attachment, Message, ReadReceipt};
pub use notification::{Notification, NotificationKind, Reference, ReferenceKind};
pub use user::{User, UserRole, UserStatus};
