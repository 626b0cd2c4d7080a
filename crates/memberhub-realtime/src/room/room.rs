use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::connection::handle::ChannelId;

/// One live room: the set of channels currently subscribed to it.
/// Rooms have no persisted state; an empty room is removed outright.
#[derive(Debug)]
pub struct Room {
    name: String,
    members: HashSet<ChannelId>,
    created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: HashSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` when the channel was not already a member.
    pub fn join(&mut self, channel_id: ChannelId) -> bool {
        self.members.insert(channel_id)
    }

    /// Returns `true` when the channel was a member.
    pub fn leave(&mut self, channel_id: &ChannelId) -> bool {
        self.members.remove(channel_id)
    }

    pub fn contains(&self, channel_id: &ChannelId) -> bool {
        self.members.contains(channel_id)
    }

    pub fn members(&self) -> Vec<ChannelId> {
        self.members.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_join_and_leave_report_membership_changes() {
        let mut room = Room::new("announcements");
        let channel = Uuid::new_v4();

        assert!(room.join(channel));
        assert!(!room.join(channel));
        assert!(room.contains(&channel));
        assert_eq!(room.len(), 1);

        assert!(room.leave(&channel));
        assert!(!room.leave(&channel));
        assert!(room.is_empty());
    }
}
