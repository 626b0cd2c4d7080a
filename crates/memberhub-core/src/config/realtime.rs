//! Realtime engine limits and timings.

use serde::{Deserialize, Serialize};

/// Fan-out limits and timings for the WebSocket engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Concurrent WebSocket channels one user may hold open.
    #[serde(default = "defaults::max_channels_per_user")]
    pub max_channels_per_user: usize,
    /// Outbound frame buffer depth per channel.
    #[serde(default = "defaults::channel_buffer")]
    pub channel_buffer_size: usize,
    /// Per-channel write deadline for a single publish, in milliseconds.
    /// A channel that cannot accept a frame within this window is treated
    /// as dead and pruned.
    #[serde(default = "defaults::publish_timeout")]
    pub publish_timeout_ms: u64,
    /// Room subscriptions one channel may hold.
    #[serde(default = "defaults::max_rooms")]
    pub max_rooms_per_channel: usize,
    /// Server-initiated keepalive ping cadence, in seconds.
    #[serde(default = "defaults::ping_interval")]
    pub ping_interval_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_channels_per_user: defaults::max_channels_per_user(),
            channel_buffer_size: defaults::channel_buffer(),
            publish_timeout_ms: defaults::publish_timeout(),
            max_rooms_per_channel: defaults::max_rooms(),
            ping_interval_seconds: defaults::ping_interval(),
        }
    }
}

mod defaults {
    pub fn max_channels_per_user() -> usize {
        5
    }

    pub fn channel_buffer() -> usize {
        256
    }

    pub fn publish_timeout() -> u64 {
        250
    }

    pub fn max_rooms() -> usize {
        50
    }

    pub fn ping_interval() -> u64 {
        30
    }
}
