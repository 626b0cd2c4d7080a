//! Resource references carried by notifications.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use memberhub_core::AppError;

/// The kinds of portal resources a notification can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    ForumThread,
    SuccessStory,
    LibraryFile,
    EquipmentListing,
    Event,
    BugReport,
    Conversation,
}

impl ReferenceKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForumThread => "forum_thread",
            Self::SuccessStory => "success_story",
            Self::LibraryFile => "library_file",
            Self::EquipmentListing => "equipment_listing",
            Self::Event => "event",
            Self::BugReport => "bug_report",
            Self::Conversation => "conversation",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReferenceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forum_thread" => Ok(Self::ForumThread),
            "success_story" => Ok(Self::SuccessStory),
            "library_file" => Ok(Self::LibraryFile),
            "equipment_listing" => Ok(Self::EquipmentListing),
            "event" => Ok(Self::Event),
            "bug_report" => Ok(Self::BugReport),
            "conversation" => Ok(Self::Conversation),
            _ => Err(AppError::invalid_spec(format!(
                "Invalid reference kind: '{s}'"
            ))),
        }
    }
}

/// A typed pointer to the portal resource a notification is about.
///
/// Stored as a kind plus id pair rather than a free-form model name, so the
/// set of referenceable resources is closed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// The resource kind.
    pub kind: ReferenceKind,
    /// The resource identifier.
    pub id: Uuid,
}

impl Reference {
    /// Create a new reference.
    pub fn new(kind: ReferenceKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}
