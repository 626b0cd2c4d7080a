//! Conversation-room admission backed by the conversation store.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use memberhub_core::AppResult;
use memberhub_realtime::RoomPolicy;
use memberhub_store::traits::ConversationStore;

/// Admits a member into `conversation:<id>` rooms only when they are a
/// participant of that conversation. Unknown conversations admit nobody.
#[derive(Clone)]
pub struct ParticipantRoomPolicy {
    conversations: Arc<dyn ConversationStore>,
}

impl ParticipantRoomPolicy {
    pub fn new(conversations: Arc<dyn ConversationStore>) -> Self {
        Self { conversations }
    }
}

#[async_trait]
impl RoomPolicy for ParticipantRoomPolicy {
    async fn can_join_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> AppResult<bool> {
        Ok(self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .is_some_and(|conversation| conversation.is_participant(user_id)))
    }
}

impl std::fmt::Debug for ParticipantRoomPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantRoomPolicy").finish()
    }
}
