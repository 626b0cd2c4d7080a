use chrono::{DateTime, Utc};
use memberhub_entity::{Message, Notification};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-to-client frames. The portal's browser client switches on the
/// `event` field, so the wire names here are a compatibility surface and
/// must not change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// A notification row was created for the receiving member.
    #[serde(rename = "notification:new")]
    NotificationNew {
        notification: Notification,
        unread_count: i64,
    },
    /// A message was appended to a conversation the member is in.
    #[serde(rename = "conversation:message")]
    ConversationMessage {
        conversation_id: Uuid,
        message: Message,
    },
    /// The member's unread counters changed for one conversation.
    #[serde(rename = "conversation:unread")]
    ConversationUnread {
        conversation_id: Uuid,
        unread_count: i64,
        total_unread: i64,
    },
    /// Another participant read the conversation up to now.
    #[serde(rename = "conversation:read")]
    ConversationRead {
        conversation_id: Uuid,
        participant_id: Uuid,
        read_at: DateTime<Utc>,
    },
    /// A message was soft-deleted by its sender.
    #[serde(rename = "conversation:message_deleted")]
    ConversationMessageDeleted {
        conversation_id: Uuid,
        message_id: Uuid,
    },
    /// Acknowledges a subscribe request.
    #[serde(rename = "room:subscribed")]
    RoomSubscribed { room: String },
    /// Acknowledges an unsubscribe request.
    #[serde(rename = "room:unsubscribed")]
    RoomUnsubscribed { room: String },
    /// A client request was rejected; the channel stays open.
    #[serde(rename = "error")]
    Error { code: String, message: String },
    /// Server keepalive probe.
    #[serde(rename = "ping")]
    Ping { timestamp: i64 },
    /// Reply to a client ping, echoing its timestamp.
    #[serde(rename = "pong")]
    Pong { timestamp: i64 },
}

impl ServerEvent {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Client-to-server frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { room: String },
    Unsubscribe { room: String },
    Ping { timestamp: i64 },
}
