use std::collections::HashSet;

use dashmap::DashMap;
use tracing::debug;

use crate::connection::handle::ChannelId;
use crate::room::key::RoomKey;
use crate::room::room::Room;

/// Tracks which channels sit in which rooms, plus the reverse index so a
/// disconnecting channel can be removed from every room it joined.
///
/// Rooms are created lazily on the first join and removed as soon as the
/// last member leaves.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
    memberships: DashMap<ChannelId, HashSet<String>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the channel to the room, creating the room if needed.
    /// Returns `true` when the channel was not already a member.
    pub fn subscribe(&self, key: &RoomKey, channel_id: ChannelId) -> bool {
        let name = key.to_string();
        let joined = self
            .rooms
            .entry(name.clone())
            .or_insert_with(|| Room::new(name.clone()))
            .join(channel_id);

        if joined {
            self.memberships
                .entry(channel_id)
                .or_default()
                .insert(name.clone());
            debug!(room = %name, channel_id = %channel_id, "Channel joined room");
        }
        joined
    }

    /// Removes the channel from the room. Returns `true` when the channel
    /// was a member.
    pub fn unsubscribe(&self, key: &RoomKey, channel_id: ChannelId) -> bool {
        self.unsubscribe_by_name(&key.to_string(), channel_id)
    }

    fn unsubscribe_by_name(&self, name: &str, channel_id: ChannelId) -> bool {
        let Some(mut room) = self.rooms.get_mut(name) else {
            return false;
        };

        let left = room.leave(&channel_id);
        let empty = room.is_empty();
        // The guard must be released before removing the entry.
        drop(room);

        if left {
            if let Some(mut joined) = self.memberships.get_mut(&channel_id) {
                joined.remove(name);
                let none_left = joined.is_empty();
                drop(joined);
                if none_left {
                    self.memberships.remove(&channel_id);
                }
            }
            debug!(room = %name, channel_id = %channel_id, "Channel left room");
        }
        if empty {
            self.rooms.remove(name);
            debug!(room = %name, "Removed empty room");
        }
        left
    }

    /// Drops the channel from every room it joined and returns the names of
    /// those rooms. Used on disconnect and when a channel is pruned dead.
    pub fn unsubscribe_all(&self, channel_id: ChannelId) -> Vec<String> {
        let Some((_, joined)) = self.memberships.remove(&channel_id) else {
            return Vec::new();
        };

        let mut names: Vec<String> = joined.into_iter().collect();
        names.sort();
        for name in &names {
            if let Some(mut room) = self.rooms.get_mut(name) {
                room.leave(&channel_id);
                let empty = room.is_empty();
                drop(room);
                if empty {
                    self.rooms.remove(name);
                }
            }
        }
        names
    }

    /// Channel ids currently subscribed to the room. Empty when the room
    /// does not exist.
    pub fn members(&self, key: &RoomKey) -> Vec<ChannelId> {
        self.rooms
            .get(&key.to_string())
            .map(|room| room.members())
            .unwrap_or_default()
    }

    pub fn is_member(&self, key: &RoomKey, channel_id: ChannelId) -> bool {
        self.rooms
            .get(&key.to_string())
            .is_some_and(|room| room.contains(&channel_id))
    }

    /// Number of rooms the channel has joined.
    pub fn membership_count(&self, channel_id: ChannelId) -> usize {
        self.memberships
            .get(&channel_id)
            .map(|joined| joined.len())
            .unwrap_or(0)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
