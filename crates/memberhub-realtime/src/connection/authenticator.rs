use async_trait::async_trait;
use memberhub_core::AppResult;
use uuid::Uuid;

/// Verified identity attached to a channel at upgrade time.
#[derive(Debug, Clone)]
pub struct ChannelIdentity {
    pub user_id: Uuid,
    pub username: String,
}

/// Turns the `token` query parameter of the upgrade request into a
/// [`ChannelIdentity`]. The binary provides a JWT-backed implementation;
/// tests install permissive stand-ins.
#[async_trait]
pub trait ChannelAuthenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> AppResult<ChannelIdentity>;
}
