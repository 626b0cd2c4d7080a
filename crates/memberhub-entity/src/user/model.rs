//! Read-side member record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::UserRole;
use super::status::UserStatus;

/// A portal member, as MemberHub sees one.
///
/// Account management lives in the portal's identity service; this is the
/// read-side projection the mention resolver and fan-out callers need.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier shared with the portal's identity service.
    pub id: Uuid,
    /// Login name, unique case-insensitively. Mentions resolve against it.
    pub username: String,
    /// Name shown in the portal UI.
    pub display_name: String,
    /// Portal role, the coarse audience selector for bulk sends.
    pub role: UserRole,
    /// Lifecycle state; only active members receive fan-out.
    pub status: UserStatus,
}

impl User {
    /// Whether this user currently receives notifications and mentions.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
