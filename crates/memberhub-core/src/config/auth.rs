//! Channel authentication configuration.
//!
//! MemberHub never issues tokens; the portal's identity service does.
//! These settings only control validation of the tokens it presents.

use serde::{Deserialize, Serialize};

/// Channel token validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret shared with the portal's identity service.
    #[serde(default = "defaults::secret")]
    pub jwt_secret: String,
    /// Clock skew tolerance for `exp`/`nbf` validation, in seconds.
    #[serde(default = "defaults::leeway")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: defaults::secret(),
            leeway_seconds: defaults::leeway(),
        }
    }
}

mod defaults {
    pub fn secret() -> String {
        // Placeholder for local development. Deployments override it via
        // MEMBERHUB__AUTH__JWT_SECRET.
        "memberhub-dev-secret".to_string()
    }

    pub fn leeway() -> u64 {
        30
    }
}
