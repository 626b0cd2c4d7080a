//! Message entity and its value objects.

pub mod model;

pub use model::{Attachment, Message, ReadReceipt, PREVIEW_MAX_CHARS};
