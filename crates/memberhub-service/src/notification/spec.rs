//! Input shape for notification creation and fan-out.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use memberhub_core::{AppError, AppResult};
use memberhub_entity::notification::{Notification, NotificationKind, Reference};

/// Everything needed to create one notification row.
///
/// In a fan-out the same spec acts as a template: [`NotificationSpec::for_recipient`]
/// re-targets it per recipient while title, body, and reference stay shared.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSpec {
    /// The recipient user.
    pub recipient_id: Uuid,
    /// The user whose action triggered the notification, if any.
    pub sender_id: Option<Uuid>,
    /// Notification category.
    pub kind: NotificationKind,
    /// Short title shown in the notification list.
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    /// Notification body text.
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub message: String,
    /// The portal resource the notification points at, if any.
    pub reference: Option<Reference>,
    /// Deep-link path into the portal.
    #[validate(length(max = 500, message = "Link must stay under 500 characters"))]
    pub link: Option<String>,
}

impl NotificationSpec {
    /// Validate field constraints plus the no-self-notification rule.
    pub fn check(&self) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::invalid_spec(format!("Invalid notification spec: {e}")))?;
        if self.sender_id == Some(self.recipient_id) {
            return Err(AppError::invalid_spec(
                "A member cannot be notified about their own action",
            ));
        }
        Ok(())
    }

    /// Copy of this spec addressed to a different recipient.
    pub fn for_recipient(&self, recipient_id: Uuid) -> Self {
        Self {
            recipient_id,
            ..self.clone()
        }
    }

    /// Build the unread notification row this spec describes.
    pub fn into_notification(self) -> Notification {
        Notification::new(
            self.recipient_id,
            self.sender_id,
            self.kind,
            self.title,
            self.message,
            self.reference,
            self.link,
        )
    }
}

/// Per-recipient result of a fan-out.
///
/// Recipients are isolated: one failed row changes nothing for the others,
/// so a fan-out reports one outcome per attempted recipient instead of a
/// single all-or-nothing result.
#[derive(Debug)]
pub struct FanoutOutcome {
    /// The recipient this outcome belongs to.
    pub recipient_id: Uuid,
    /// The stored row, or why this recipient was skipped.
    pub stored: AppResult<Notification>,
    /// How many live channels accepted the event. Zero for offline members.
    pub delivered: usize,
}

impl FanoutOutcome {
    /// Whether the notification row was persisted for this recipient.
    pub fn is_stored(&self) -> bool {
        self.stored.is_ok()
    }
}
