use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::warn;
use uuid::Uuid;

pub type ChannelId = Uuid;

/// Write side of one WebSocket channel.
///
/// Frames queued here are drained by the socket task that owns the paired
/// receiver. A handle that fails a send is marked dead and stays dead; the
/// broadcaster prunes dead handles out of the pool and the rooms.
#[derive(Debug)]
pub struct ChannelHandle {
    pub id: ChannelId,
    pub user_id: Uuid,
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<String>,
    alive: AtomicBool,
}

impl ChannelHandle {
    pub fn new(user_id: Uuid, sender: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            connected_at: Utc::now(),
            sender,
            alive: AtomicBool::new(true),
        }
    }

    /// Queues one serialized frame, waiting at most `timeout` for buffer
    /// space. Returns `false` and marks the handle dead when the receiver
    /// is gone or the buffer stays full; a dead handle never delivers.
    pub async fn send(&self, frame: String, timeout: Duration) -> bool {
        if !self.is_alive() {
            return false;
        }

        match self.sender.send_timeout(frame, timeout).await {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(_)) => {
                warn!(
                    channel_id = %self.id,
                    user_id = %self.user_id,
                    "Channel buffer stayed full, marking channel dead"
                );
                self.mark_dead();
                false
            }
            Err(SendTimeoutError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::Relaxed);
    }
}
