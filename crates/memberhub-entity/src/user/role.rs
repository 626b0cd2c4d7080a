//! Portal roles, the coarse audience axis for bulk notifications.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use memberhub_core::AppError;

/// Role a member holds within the franchise network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Franchise headquarters administrator.
    Admin,
    /// A franchise owner.
    Franchisee,
    /// Store staff under a franchisee.
    Staff,
}

impl UserRole {
    /// Lowercase form, shared by the wire format and the role column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Franchisee => "franchisee",
            UserRole::Staff => "staff",
        }
    }

}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let role = match raw.to_ascii_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "franchisee" => UserRole::Franchisee,
            "staff" => UserRole::Staff,
            other => return Err(AppError::invalid_spec(format!("Unknown user role '{other}'"))),
        };
        Ok(role)
    }
}
