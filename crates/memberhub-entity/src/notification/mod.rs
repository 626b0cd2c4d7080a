//! Notification entity and its enumerations.

pub mod kind;
pub mod model;
pub mod reference;

pub use kind::NotificationKind;
pub use model::Notification;
pub use reference::{Reference, ReferenceKind};
