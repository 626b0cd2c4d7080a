//! Bounded runner for fire-and-forget work.
//!
//! Callers that dispatch notifications after their own response is already
//! sent hand the work here instead of spawning bare tasks: concurrency is
//! capped by a semaphore, failures are logged under the task's name, and
//! shutdown waits for in-flight tasks up to a grace period.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use memberhub_core::AppResult;
use memberhub_core::config::tasks::TasksConfig;

/// Semaphore-bounded detached task runner.
#[derive(Debug, Clone)]
pub struct BackgroundTasks {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    grace: Duration,
}

impl BackgroundTasks {
    pub fn new(config: &TasksConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            max_concurrent: config.max_concurrent,
            grace: Duration::from_secs(config.shutdown_grace_seconds),
        }
    }

    /// Runs the future on the runtime once a concurrency slot frees up.
    /// The task's error, if any, is logged and goes nowhere else.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: Future<Output = AppResult<()>> + Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        tokio::spawn(async move {
            // A closed semaphore means shutdown already drained the runner.
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    debug!(task = name, "Dropping background task, runner is shut down");
                    return;
                }
            };

            if let Err(e) = future.await {
                error!(task = name, error = %e, "Background task failed");
            }
        });
    }

    /// Waits for in-flight tasks up to the grace period, then refuses any
    /// task that has not started yet.
    pub async fn shutdown(&self) {
        info!("Waiting for in-flight background tasks");
        let drained = tokio::time::timeout(
            self.grace,
            self.semaphore.acquire_many(self.max_concurrent as u32),
        )
        .await;
        if drained.is_err() {
            error!(
                grace_seconds = self.grace.as_secs(),
                "Background tasks still running after grace period"
            );
        }
        self.semaphore.close();
    }
}
