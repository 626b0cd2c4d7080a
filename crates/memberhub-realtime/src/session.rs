use std::sync::Arc;

use memberhub_core::config::realtime::RealtimeConfig;
use memberhub_core::{AppError, AppResult};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::connection::handle::{ChannelHandle, ChannelId};
use crate::connection::pool::ChannelPool;
use crate::event::{ClientMessage, ServerEvent};
use crate::policy::RoomPolicy;
use crate::room::key::RoomKey;
use crate::room::registry::RoomRegistry;

/// Registers channels, places them in rooms, and interprets client frames.
///
/// Room membership is gated here: a channel may always sit in its owner's
/// `user:` room (it is put there on registration), may join `conversation:`
/// rooms only when the [`RoomPolicy`] approves, and may join any topic.
pub struct SessionRegistry {
    pool: Arc<ChannelPool>,
    rooms: Arc<RoomRegistry>,
    policy: Arc<dyn RoomPolicy>,
    config: RealtimeConfig,
}

impl SessionRegistry {
    pub fn new(
        pool: Arc<ChannelPool>,
        rooms: Arc<RoomRegistry>,
        policy: Arc<dyn RoomPolicy>,
        config: RealtimeConfig,
    ) -> Self {
        Self {
            pool,
            rooms,
            policy,
            config,
        }
    }

    /// Creates a channel for the member and auto-subscribes it to the
    /// member's private room. The returned receiver is the outbound frame
    /// queue the socket task must drain.
    pub fn register(
        &self,
        user_id: Uuid,
    ) -> AppResult<(Arc<ChannelHandle>, mpsc::Receiver<String>)> {
        if self.pool.user_channel_count(user_id) >= self.config.max_channels_per_user {
            return Err(AppError::conflict(format!(
                "Member already holds {} channels",
                self.config.max_channels_per_user
            )));
        }

        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ChannelHandle::new(user_id, tx));
        self.pool.insert(Arc::clone(&handle));
        self.rooms.subscribe(&RoomKey::user(user_id), handle.id);

        info!(channel_id = %handle.id, user_id = %user_id, "Channel registered");
        Ok((handle, rx))
    }

    /// Removes the channel from the pool and from every room. Safe to call
    /// more than once.
    pub fn unregister(&self, channel_id: ChannelId) {
        if let Some(handle) = self.pool.remove(channel_id) {
            handle.mark_dead();
            let rooms = self.rooms.unsubscribe_all(channel_id);
            info!(
                channel_id = %channel_id,
                user_id = %handle.user_id,
                rooms = rooms.len(),
                "Channel unregistered"
            );
        }
    }

    /// Interprets one client frame and returns the reply to send back on
    /// the same channel, if any. Malformed or rejected frames produce an
    /// error event; the channel is never closed from here.
    pub async fn handle_client_message(
        &self,
        handle: &ChannelHandle,
        raw: &str,
    ) -> Option<ServerEvent> {
        let message: ClientMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(channel_id = %handle.id, error = %e, "Discarding malformed client frame");
                return Some(ServerEvent::error("bad_message", "Frame could not be parsed"));
            }
        };

        match message {
            ClientMessage::Subscribe { room } => self.subscribe(handle, &room).await,
            ClientMessage::Unsubscribe { room } => {
                let Some(key) = RoomKey::parse(&room) else {
                    return Some(ServerEvent::error("invalid_room", "Unknown room name"));
                };
                self.rooms.unsubscribe(&key, handle.id);
                Some(ServerEvent::RoomUnsubscribed { room })
            }
            ClientMessage::Ping { timestamp } => Some(ServerEvent::Pong { timestamp }),
        }
    }

    async fn subscribe(&self, handle: &ChannelHandle, room: &str) -> Option<ServerEvent> {
        let Some(key) = RoomKey::parse(room) else {
            return Some(ServerEvent::error("invalid_room", "Unknown room name"));
        };

        if self.rooms.membership_count(handle.id) >= self.config.max_rooms_per_channel {
            return Some(ServerEvent::error(
                "room_limit",
                "Channel is in too many rooms",
            ));
        }

        let allowed = match &key {
            RoomKey::User(id) => *id == handle.user_id,
            RoomKey::Conversation(id) => {
                match self.policy.can_join_conversation(handle.user_id, *id).await {
                    Ok(allowed) => allowed,
                    Err(e) => {
                        warn!(
                            channel_id = %handle.id,
                            room = %key,
                            error = %e,
                            "Room policy check failed"
                        );
                        return Some(ServerEvent::error(
                            "subscribe_failed",
                            "Could not verify room membership",
                        ));
                    }
                }
            }
            RoomKey::Topic(_) => true,
        };

        if !allowed {
            return Some(ServerEvent::error("forbidden", "Not a member of this room"));
        }

        self.rooms.subscribe(&key, handle.id);
        Some(ServerEvent::RoomSubscribed {
            room: room.to_string(),
        })
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("channels", &self.pool.len())
            .field("rooms", &self.rooms.room_count())
            .finish()
    }
}
