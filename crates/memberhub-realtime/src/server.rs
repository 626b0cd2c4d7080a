use std::sync::Arc;
use std::time::Duration;

use memberhub_core::config::realtime::RealtimeConfig;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::broadcaster::Broadcaster;
use crate::connection::pool::ChannelPool;
use crate::policy::RoomPolicy;
use crate::room::registry::RoomRegistry;
use crate::session::SessionRegistry;

/// Facade over the realtime building blocks. Cloning is cheap; every clone
/// shares the same pool, rooms, and shutdown signal.
#[derive(Clone)]
pub struct RealtimeEngine {
    pool: Arc<ChannelPool>,
    rooms: Arc<RoomRegistry>,
    sessions: Arc<SessionRegistry>,
    broadcaster: Arc<Broadcaster>,
    shutdown_tx: broadcast::Sender<()>,
    config: RealtimeConfig,
}

impl RealtimeEngine {
    pub fn new(config: RealtimeConfig, policy: Arc<dyn RoomPolicy>) -> Self {
        let pool = Arc::new(ChannelPool::new());
        let rooms = Arc::new(RoomRegistry::new());
        let sessions = Arc::new(SessionRegistry::new(
            Arc::clone(&pool),
            Arc::clone(&rooms),
            policy,
            config.clone(),
        ));
        let broadcaster = Arc::new(Broadcaster::new(
            Arc::clone(&pool),
            Arc::clone(&rooms),
            Duration::from_millis(config.publish_timeout_ms),
        ));
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            pool,
            rooms,
            sessions,
            broadcaster,
            shutdown_tx,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn broadcaster(&self) -> Arc<Broadcaster> {
        Arc::clone(&self.broadcaster)
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Whether the member has at least one live channel.
    pub fn is_connected(&self, user_id: Uuid) -> bool {
        self.pool.is_connected(user_id)
    }

    pub fn channel_count(&self) -> usize {
        self.pool.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    /// Subscribes to the shutdown signal. Socket tasks exit their loops
    /// when this fires.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signals every socket task to close. Idempotent.
    pub fn shutdown(&self) {
        info!(
            channels = self.pool.len(),
            rooms = self.rooms.room_count(),
            "Shutting down realtime engine"
        );
        let _ = self.shutdown_tx.send(());
    }
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("channels", &self.pool.len())
            .field("rooms", &self.rooms.room_count())
            .finish()
    }
}
