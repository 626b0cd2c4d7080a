use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, error};

use crate::connection::handle::ChannelId;
use crate::connection::pool::ChannelPool;
use crate::event::ServerEvent;
use crate::room::key::RoomKey;
use crate::room::registry::RoomRegistry;

/// Pushes events into rooms on a best-effort basis.
///
/// The event is serialized once, then fanned out to every channel in the
/// room concurrently. Channels that fail the send are pruned from the pool
/// and from every room; the caller only ever learns how many channels took
/// the frame. Publishing never returns an error.
#[derive(Debug)]
pub struct Broadcaster {
    pool: Arc<ChannelPool>,
    rooms: Arc<RoomRegistry>,
    publish_timeout: Duration,
}

impl Broadcaster {
    pub fn new(
        pool: Arc<ChannelPool>,
        rooms: Arc<RoomRegistry>,
        publish_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            rooms,
            publish_timeout,
        }
    }

    /// Sends the event to every live channel in the room and returns how
    /// many channels accepted it. An unknown room delivers to nobody.
    pub async fn publish(&self, room: &RoomKey, event: &ServerEvent) -> usize {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                error!(room = %room, error = %e, "Failed to serialize event, dropping it");
                return 0;
            }
        };

        let members = self.rooms.members(room);
        if members.is_empty() {
            return 0;
        }

        let sends = members.iter().map(|channel_id| {
            let frame = frame.clone();
            async move {
                match self.pool.get(*channel_id) {
                    Some(handle) if handle.send(frame, self.publish_timeout).await => {
                        (*channel_id, true)
                    }
                    _ => (*channel_id, false),
                }
            }
        });

        let mut delivered = 0;
        let mut dead: Vec<ChannelId> = Vec::new();
        for (channel_id, ok) in join_all(sends).await {
            if ok {
                delivered += 1;
            } else {
                dead.push(channel_id);
            }
        }

        for channel_id in dead {
            self.prune(channel_id);
        }

        debug!(room = %room, delivered, "Published event to room");
        delivered
    }

    /// Shorthand for publishing into a member's private room.
    pub async fn publish_to_user(&self, user_id: uuid::Uuid, event: &ServerEvent) -> usize {
        self.publish(&RoomKey::user(user_id), event).await
    }

    fn prune(&self, channel_id: ChannelId) {
        if let Some(handle) = self.pool.remove(channel_id) {
            handle.mark_dead();
        }
        let rooms = self.rooms.unsubscribe_all(channel_id);
        debug!(channel_id = %channel_id, rooms = rooms.len(), "Pruned dead channel");
    }
}
