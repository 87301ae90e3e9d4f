//! Producer side: dedup against the ledger, enqueue, then kick a worker.

use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::{
    Job, QueueResult,
    ledger::CompletionLedger,
    observability::ObservabilityLayer,
    queue::JobQueue,
};

/// Best-effort wake-up for a worker.
///
/// Nothing is guaranteed: a kick may be lost, coalesced with others, or
/// arrive when no worker listens. Scheduled drains pick up whatever a
/// missed kick leaves behind.
pub trait Kick: Send + Sync {
    fn kick(&self);
}

/// Kick that goes nowhere
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopKick;

impl Kick for NoopKick {
    fn kick(&self) {}
}

/// Kick that wakes an in-process `Drainer` waiting on the same `Notify`
#[derive(Debug, Clone, Default)]
pub struct NotifyKick {
    notify: Arc<Notify>,
}

impl NotifyKick {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `Notify` a drainer should wait on
    pub fn notify(&self) -> Arc<Notify> {
        self.notify.clone()
    }
}

impl Kick for NotifyKick {
    fn kick(&self) {
        // Stores a permit if nobody waits yet, so an early kick is not lost
        self.notify.notify_one();
    }
}

/// What `Producer::submit` did with a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Appended to the queue
    Enqueued,
    /// Already processed within the dedup window; nothing was written
    AlreadyDone,
}

#[derive(Clone)]
pub struct Producer {
    queue: JobQueue,
    ledger: CompletionLedger,
    kick: Arc<dyn Kick>,
    observability: ObservabilityLayer,
}

impl Producer {
    pub fn new(queue: JobQueue, ledger: CompletionLedger) -> Self {
        Self {
            queue,
            ledger,
            kick: Arc::new(NoopKick),
            observability: ObservabilityLayer::new(),
        }
    }

    pub fn with_kick(mut self, kick: Arc<dyn Kick>) -> Self {
        self.kick = kick;
        self
    }

    pub fn with_observability(mut self, observability: ObservabilityLayer) -> Self {
        self.observability = observability;
        self
    }

    /// Enqueue `job` unless its identity was completed recently.
    ///
    /// The check and the append are two separate store calls, so two
    /// producers racing on the same identity can both enqueue. The lease
    /// keeps those copies from running at the same time.
    pub async fn submit(&self, job: &Job) -> QueueResult<SubmitOutcome> {
        if self.ledger.is_done(&job.job_id).await? {
            info!(job_id = %job.job_id, "Job already done, not enqueueing");
            self.observability.record_duplicate_suppressed(&job.job_id);
            return Ok(SubmitOutcome::AlreadyDone);
        }

        self.queue.enqueue(job).await?;
        self.kick.kick();
        debug!(job_id = %job.job_id, "Kicked worker");
        Ok(SubmitOutcome::Enqueued)
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use crate::{JobId, KeySpace, backend::{KeyValueStore, memory::MemoryStore}};

    #[derive(Default)]
    struct CountingKick(AtomicUsize);

    impl Kick for CountingKick {
        fn kick(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn parts() -> (JobQueue, CompletionLedger) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let keys = KeySpace::new("test");
        (JobQueue::new(store.clone(), keys.clone()), CompletionLedger::new(store, keys))
    }

    #[tokio::test]
    async fn test_submit_enqueues_and_kicks() {
        let (queue, ledger) = parts();
        let kick = Arc::new(CountingKick::default());
        let producer = Producer::new(queue.clone(), ledger).with_kick(kick.clone());

        let outcome = producer.submit(&Job::new("abc")).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Enqueued);
        assert_eq!(queue.depth().await.unwrap(), 1);
        assert_eq!(kick.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_suppresses_done_job() {
        let (queue, ledger) = parts();
        let kick = Arc::new(CountingKick::default());
        let producer = Producer::new(queue.clone(), ledger.clone()).with_kick(kick.clone());
        ledger.mark_done(&JobId::from("abc"), Duration::from_secs(60)).await.unwrap();

        let outcome = producer.submit(&Job::new("abc")).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::AlreadyDone);
        assert_eq!(queue.depth().await.unwrap(), 0);
        assert_eq!(kick.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_without_done_marker_allows_duplicates() {
        let (queue, ledger) = parts();
        let producer = Producer::new(queue.clone(), ledger);

        producer.submit(&Job::new("abc")).await.unwrap();
        producer.submit(&Job::new("abc")).await.unwrap();

        assert_eq!(queue.depth().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_notify_kick_stores_a_permit() {
        let kick = NotifyKick::new();
        kick.kick();
        tokio::time::timeout(Duration::from_secs(1), kick.notify().notified())
            .await
            .expect("permit should be stored");
    }
}
