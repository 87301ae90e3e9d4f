//! Background drainer: drains on every kick and on a fixed schedule.

use std::sync::Arc;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, debug};

use crate::{
    QueueCtx, QueueError, QueueResult, Trigger,
    config::QueueConfig,
    driver::WorkerDriver,
};

/// Handle for managing worker lifecycle
pub struct WorkerHandle {
    shutdown_tx: oneshot::Sender<()>,
    join_handle: JoinHandle<QueueResult<()>>,
}

impl WorkerHandle {
    /// Gracefully shutdown the worker. A drain in progress finishes first.
    pub async fn shutdown(self) -> QueueResult<()> {
        let _ = self.shutdown_tx.send(());
        self.join_handle
            .await
            .map_err(|e| QueueError::Internal(format!("Worker join error: {}", e)))?
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

/// Runs bounded drains in a tokio task.
///
/// A drain starts on a kick, on every `drain_interval` tick, and once at
/// startup. After a full batch the drainer wakes itself again, so a backlog
/// does not wait for the next tick.
pub struct Drainer {
    driver: Arc<WorkerDriver>,
    wake: Arc<Notify>,
    config: QueueConfig,
    max_jobs: usize,
}

impl Drainer {
    pub fn new(driver: Arc<WorkerDriver>, config: &QueueConfig, wake: Arc<Notify>) -> Self {
        Self {
            driver,
            wake,
            config: config.clone(),
            max_jobs: config.clamp_max_jobs(config.max_jobs_ceiling),
        }
    }

    /// Jobs per drain, clamped into `1..=max_jobs_ceiling` like the driver does
    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = self.config.clamp_max_jobs(max_jobs);
        self
    }

    /// Start the drainer task
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join_handle = tokio::spawn(self.run(shutdown_rx));

        WorkerHandle {
            shutdown_tx,
            join_handle,
        }
    }

    async fn run(self, mut shutdown_rx: oneshot::Receiver<()>) -> QueueResult<()> {
        let mut ticker = tokio::time::interval(self.config.drain_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?self.config.drain_interval, max_jobs = self.max_jobs, "Drainer started");

        loop {
            let trigger = tokio::select! {
                biased;
                _ = &mut shutdown_rx => {
                    info!("Drainer shutdown requested");
                    break;
                }
                _ = self.wake.notified() => Trigger::Kick,
                _ = ticker.tick() => Trigger::Scheduled,
            };

            let ctx = QueueCtx::new(trigger);
            let report = self.driver.drain(&ctx, self.max_jobs).await;

            if report.attempted() >= self.max_jobs {
                debug!("Full batch, draining again");
                self.wake.notify_one();
                // Let shutdown and other tasks in between back-to-back drains
                tokio::task::yield_now().await;
            }
        }

        info!("Drainer stopped");
        Ok(())
    }
}
