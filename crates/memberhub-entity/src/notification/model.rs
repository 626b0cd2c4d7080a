//! Per-recipient notification row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::kind::NotificationKind;
use super::reference::Reference;

/// A notification addressed to exactly one recipient.
///
/// Fan-out to N recipients creates N independent rows; read state is never
/// shared between recipients. After creation a notification is only ever
/// mutated by its recipient marking it read, and only ever removed by its
/// recipient deleting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Row identifier, assigned at creation.
    pub id: Uuid,
    /// The one user this row belongs to.
    pub recipient_id: Uuid,
    /// The user whose action triggered this notification, if any.
    pub sender_id: Option<Uuid>,
    /// Category, drives the portal's icon and grouping.
    pub kind: NotificationKind,
    /// Short title shown in the notification list.
    pub title: String,
    /// Body text under the title.
    pub message: String,
    /// The portal resource this notification points at, if any.
    pub reference: Option<Reference>,
    /// Deep-link path into the portal (e.g. `/forum/thread/123`).
    pub link: Option<String>,
    /// Whether the recipient has read this notification.
    pub is_read: bool,
    /// When the recipient read it.
    pub read_at: Option<DateTime<Utc>>,
    /// Creation instant; list ordering is newest-first on this.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new unread notification.
    pub fn new(
        recipient_id: Uuid,
        sender_id: Option<Uuid>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        reference: Option<Reference>,
        link: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            sender_id,
            kind,
            title: title.into(),
            message: message.into(),
            reference,
            link,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    /// Check whether the notification is still unread.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }
}
