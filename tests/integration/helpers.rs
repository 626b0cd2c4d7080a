//! Shared fixtures for the integration suite.

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use memberhub_core::config::realtime::RealtimeConfig;
use memberhub_entity::{NotificationKind, User, UserRole, UserStatus};
use memberhub_realtime::{ChannelHandle, RealtimeEngine, ServerEvent};
use memberhub_service::{
    ConversationService, MentionResolver, NotificationService, NotificationSpec,
    ParticipantRoomPolicy,
};
use memberhub_store::Store;

/// The full service stack over the in-memory gateway, wired the same way
/// the server binary wires it.
pub struct TestApp {
    pub store: Store,
    pub engine: RealtimeEngine,
    pub notifications: NotificationService,
    pub conversations: ConversationService,
    pub mentions: MentionResolver,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Store::in_memory();
        let policy = Arc::new(ParticipantRoomPolicy::new(Arc::clone(&store.conversations)));
        let engine = RealtimeEngine::new(RealtimeConfig::default(), policy);

        let notifications = NotificationService::new(
            Arc::clone(&store.notifications),
            Arc::clone(&store.users),
            engine.broadcaster(),
        );
        let conversations = ConversationService::new(
            Arc::clone(&store.conversations),
            Arc::clone(&store.messages),
            engine.broadcaster(),
        );
        let mentions = MentionResolver::new(Arc::clone(&store.users));

        Self {
            store,
            engine,
            notifications,
            conversations,
            mentions,
        }
    }

    /// Seeds an active franchisee into the directory.
    pub async fn seed_user(&self, username: &str) -> User {
        self.seed_user_with(username, UserRole::Franchisee, UserStatus::Active)
            .await
    }

    pub async fn seed_user_with(&self, username: &str, role: UserRole, status: UserStatus) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            display_name: username.to_string(),
            role,
            status,
        };
        self.store.users.insert(&user).await.expect("seed user")
    }

    /// Opens a realtime channel for the member. The channel starts in the
    /// member's own room; the receiver is the outbound frame queue.
    pub fn connect(&self, user_id: Uuid) -> (Arc<ChannelHandle>, mpsc::Receiver<String>) {
        self.engine
            .sessions()
            .register(user_id)
            .expect("channel registration")
    }

    /// Subscribes an open channel to a room through the client frame path.
    pub async fn subscribe(&self, handle: &ChannelHandle, room: &str) {
        let frame = format!(r#"{{"type":"subscribe","room":"{room}"}}"#);
        let reply = self
            .engine
            .sessions()
            .handle_client_message(handle, &frame)
            .await;
        assert!(
            matches!(reply, Some(ServerEvent::RoomSubscribed { .. })),
            "subscribe to {room} failed: {reply:?}"
        );
    }
}

/// Pops the next queued frame off a channel receiver, parsed as JSON.
pub fn next_frame(rx: &mut mpsc::Receiver<String>) -> serde_json::Value {
    let raw = rx.try_recv().expect("expected a queued frame");
    serde_json::from_str(&raw).expect("frames are JSON")
}

/// A well-formed reply notification from `sender` to `recipient`.
pub fn reply_spec(recipient: Uuid, sender: Uuid) -> NotificationSpec {
    NotificationSpec {
        recipient_id: recipient,
        sender_id: Some(sender),
        kind: NotificationKind::Reply,
        title: "New reply".to_string(),
        message: "Someone replied to your thread".to_string(),
        reference: None,
        link: Some("/forum/thread/7".to_string()),
    }
}
