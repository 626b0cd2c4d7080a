//! Account status as the portal's identity service reports it.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use memberhub_core::AppError;

/// Lifecycle state of a member account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Normal account.
    Active,
    /// Deactivated account (e.g. a closed franchise). Dropped from mention
    /// resolution and bulk fan-out targeting.
    Inactive,
    /// Temporarily suspended by an administrator.
    Suspended,
}

impl UserStatus {
    /// Lowercase form, shared by the wire format and the status column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Suspended => "suspended",
        }
    }

    /// Whether the account is active.
    pub fn is_active(&self) -> bool {
        matches!(self, UserStatus::Active)
    }
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let status = match raw.to_ascii_lowercase().as_str() {
            "active" => UserStatus::Active,
            "inactive" => UserStatus::Inactive,
            "suspended" => UserStatus::Suspended,
            other => return Err(AppError::invalid_spec(format!("Unknown user status '{other}'"))),
        };
        Ok(status)
    }
}
