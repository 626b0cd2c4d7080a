//! Notification kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use memberhub_core::AppError;

/// The closed set of notification categories the portal produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone @-mentioned the recipient.
    Mention,
    /// Someone replied to the recipient's forum thread or comment.
    Reply,
    /// A resource owned by the recipient changed status (approved,
    /// rejected, archived).
    StatusChange,
    /// A new resource was published in an area the recipient follows.
    NewResource,
    /// A portal-wide announcement.
    Broadcast,
    /// A reminder for an upcoming convention or training event.
    EventReminder,
}

impl NotificationKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mention => "mention",
            Self::Reply => "reply",
            Self::StatusChange => "status_change",
            Self::NewResource => "new_resource",
            Self::Broadcast => "broadcast",
            Self::EventReminder => "event_reminder",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mention" => Ok(Self::Mention),
            "reply" => Ok(Self::Reply),
            "status_change" => Ok(Self::StatusChange),
            "new_resource" => Ok(Self::NewResource),
            "broadcast" => Ok(Self::Broadcast),
            "event_reminder" => Ok(Self::EventReminder),
            _ => Err(AppError::invalid_spec(format!(
                "Invalid notification kind: '{s}'"
            ))),
        }
    }
}
