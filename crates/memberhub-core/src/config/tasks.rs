//! Background task runner settings.

use serde::{Deserialize, Serialize};

/// Concurrency and drain behavior for deferred work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Background tasks allowed to run at once; excess work queues.
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
    /// How long shutdown waits for in-flight tasks, in seconds.
    #[serde(default = "defaults::shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::max_concurrent(),
            shutdown_grace_seconds: defaults::shutdown_grace(),
        }
    }
}

mod defaults {
    pub fn max_concurrent() -> usize {
        8
    }

    pub fn shutdown_grace() -> u64 {
        20
    }
}
