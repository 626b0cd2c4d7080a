//! JWT validation for incoming realtime channels.
//!
//! MemberHub never issues tokens. The portal's identity service signs
//! short-lived access tokens with an HMAC secret shared through
//! configuration; this authenticator only verifies a presented token and
//! extracts the identity the channel runs under.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use uuid::Uuid;

use memberhub_core::config::auth::AuthConfig;
use memberhub_core::{AppError, AppResult};
use memberhub_realtime::{ChannelAuthenticator, ChannelIdentity};

/// The claims subset MemberHub reads. Portal tokens carry more (role,
/// session id); serde skips what is not listed here.
#[derive(Debug, Deserialize)]
struct Claims {
    /// Subject, the portal user ID.
    sub: Uuid,
    /// Username, attached to channel log context.
    username: String,
}

/// Validates portal-issued JWTs at the channel boundary.
pub struct JwtChannelAuthenticator {
    /// Key derived from the shared HMAC secret.
    key: DecodingKey,
    /// Algorithm pin plus expiry and clock-skew settings.
    validator: Validation,
}

impl JwtChannelAuthenticator {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validator = Validation::new(Algorithm::HS256);
        validator.validate_exp = true;
        validator.leeway = config.leeway_seconds;

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validator,
        }
    }
}

#[async_trait]
impl ChannelAuthenticator for JwtChannelAuthenticator {
    async fn authenticate(&self, token: &str) -> AppResult<ChannelIdentity> {
        let data = decode::<Claims>(token, &self.key, &self.validator).map_err(reject)?;

        Ok(ChannelIdentity {
            user_id: data.claims.sub,
            username: data.claims.username,
        })
    }
}

fn reject(e: jsonwebtoken::errors::Error) -> AppError {
    match e.kind() {
        JwtErrorKind::ExpiredSignature => AppError::unauthorized("Channel token expired"),
        JwtErrorKind::InvalidSignature => AppError::unauthorized("Signature check failed"),
        JwtErrorKind::InvalidToken => AppError::unauthorized("Malformed channel token"),
        _ => AppError::unauthorized(format!("Channel token rejected: {e}")),
    }
}
