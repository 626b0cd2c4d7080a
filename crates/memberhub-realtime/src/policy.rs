use async_trait::async_trait;
use memberhub_core::AppResult;
use uuid::Uuid;

/// Decides whether a member may join a conversation room. The service
/// layer backs this with the conversation store; own-user rooms and open
/// topics are decided inside the session registry and never reach here.
#[async_trait]
pub trait RoomPolicy: Send + Sync {
    async fn can_join_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> AppResult<bool>;
}

/// Allows every conversation room. Only suitable for tests and local
/// tooling.
#[derive(Debug, Default)]
pub struct OpenRoomPolicy;

#[async_trait]
impl RoomPolicy for OpenRoomPolicy {
    async fn can_join_conversation(
        &self,
        _user_id: Uuid,
        _conversation_id: Uuid,
    ) -> AppResult<bool> {
        Ok(true)
    }
}
