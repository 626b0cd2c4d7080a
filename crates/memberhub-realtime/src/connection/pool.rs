use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::connection::handle::{ChannelHandle, ChannelId};

/// All live channel handles, indexed by channel id and by owning member.
/// One member may hold several channels (one per tab or device).
#[derive(Debug, Default)]
pub struct ChannelPool {
    by_id: DashMap<ChannelId, Arc<ChannelHandle>>,
    by_user: DashMap<Uuid, Vec<ChannelId>>,
}

impl ChannelPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, handle: Arc<ChannelHandle>) {
        self.by_user
            .entry(handle.user_id)
            .or_default()
            .push(handle.id);
        self.by_id.insert(handle.id, handle);
    }

    pub fn remove(&self, channel_id: ChannelId) -> Option<Arc<ChannelHandle>> {
        let (_, handle) = self.by_id.remove(&channel_id)?;

        if let Some(mut channels) = self.by_user.get_mut(&handle.user_id) {
            channels.retain(|id| *id != channel_id);
            let none_left = channels.is_empty();
            drop(channels);
            if none_left {
                self.by_user.remove(&handle.user_id);
            }
        }
        Some(handle)
    }

    pub fn get(&self, channel_id: ChannelId) -> Option<Arc<ChannelHandle>> {
        self.by_id.get(&channel_id).map(|entry| Arc::clone(&entry))
    }

    pub fn channels_for_user(&self, user_id: Uuid) -> Vec<Arc<ChannelHandle>> {
        let Some(ids) = self.by_user.get(&user_id) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| self.get(*id))
            .collect()
    }

    pub fn user_channel_count(&self, user_id: Uuid) -> usize {
        self.by_user
            .get(&user_id)
            .map(|ids| ids.len())
            .unwrap_or(0)
    }

    /// Whether the member has at least one live channel right now.
    pub fn is_connected(&self, user_id: Uuid) -> bool {
        self.channels_for_user(user_id)
            .iter()
            .any(|handle| handle.is_alive())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn handle_for(user_id: Uuid) -> Arc<ChannelHandle> {
        let (tx, rx) = mpsc::channel(4);
        std::mem::forget(rx);
        Arc::new(ChannelHandle::new(user_id, tx))
    }

    #[tokio::test]
    async fn test_tracks_multiple_channels_per_member() {
        let pool = ChannelPool::new();
        let user = Uuid::new_v4();
        let first = handle_for(user);
        let second = handle_for(user);

        pool.insert(Arc::clone(&first));
        pool.insert(Arc::clone(&second));

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.user_channel_count(user), 2);
        assert!(pool.is_connected(user));

        pool.remove(first.id);
        assert_eq!(pool.user_channel_count(user), 1);
        assert!(pool.is_connected(user));

        pool.remove(second.id);
        assert!(pool.is_empty());
        assert!(!pool.is_connected(user));
    }

    #[tokio::test]
    async fn test_a_member_with_only_dead_channels_is_not_connected() {
        let pool = ChannelPool::new();
        let user = Uuid::new_v4();
        let handle = handle_for(user);

        pool.insert(Arc::clone(&handle));
        handle.mark_dead();

        assert_eq!(pool.user_channel_count(user), 1);
        assert!(!pool.is_connected(user));
    }
}
