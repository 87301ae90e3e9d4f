//! Bounded drain loop: pop, lease, process, record, release.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    Job, JobError, JobId, QueueCtx,
    config::QueueConfig,
    lease::LeaseManager,
    ledger::CompletionLedger,
    observability::ObservabilityLayer,
    queue::JobQueue,
};

/// The application's processing step.
///
/// The driver only cares whether it returned `Ok`. Panics are caught and
/// treated like errors.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    async fn process(&self, job: &Job) -> Result<(), JobError>;
}

#[async_trait]
impl<F, Fut> JobProcessor for F
where
    F: Fn(Job) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), JobError>> + Send,
{
    async fn process(&self, job: &Job) -> Result<(), JobError> {
        (self)(job.clone()).await
    }
}

/// What one drain did. Jobs that failed or were contended are only counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Jobs processed and marked done, in processing order
    pub processed: Vec<JobId>,
    /// Jobs dropped after a processing or bookkeeping failure
    pub failed: usize,
    /// Jobs skipped because another worker held the lease
    pub contended: usize,
}

impl DrainReport {
    pub fn into_processed(self) -> Vec<JobId> {
        self.processed
    }

    /// Number of jobs popped and acted on
    pub fn attempted(&self) -> usize {
        self.processed.len() + self.failed + self.contended
    }
}

/// Drives jobs from the queue through a `JobProcessor`.
///
/// Holds no state between drains; everything shared lives in the store.
pub struct WorkerDriver {
    queue: JobQueue,
    leases: LeaseManager,
    ledger: CompletionLedger,
    processor: Arc<dyn JobProcessor>,
    observability: ObservabilityLayer,
    config: QueueConfig,
}

impl WorkerDriver {
    pub fn new(
        queue: JobQueue,
        leases: LeaseManager,
        ledger: CompletionLedger,
        processor: Arc<dyn JobProcessor>,
        config: &QueueConfig,
    ) -> Self {
        Self {
            queue,
            leases,
            ledger,
            processor,
            observability: ObservabilityLayer::new(),
            config: config.clone(),
        }
    }

    pub fn with_observability(mut self, observability: ObservabilityLayer) -> Self {
        self.observability = observability;
        self
    }

    /// Process up to `max_jobs` jobs, clamped by `QueueConfig::clamp_max_jobs`.
    ///
    /// Stops early when the queue is empty or the store cannot be read.
    /// A failed job is logged and dropped; it is not put back.
    #[instrument(
        skip(self, ctx),
        fields(request_id = %ctx.request_id, trigger = %ctx.trigger, trace_id = ?ctx.trace_id)
    )]
    pub async fn drain(&self, ctx: &QueueCtx, max_jobs: usize) -> DrainReport {
        let max_jobs = self.config.clamp_max_jobs(max_jobs);
        let mut report = DrainReport::default();

        for _ in 0..max_jobs {
            let job = match self.queue.dequeue().await {
                Ok(Some(job)) => job,
                Ok(None) => {
                    debug!("Queue empty");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Dequeue failed, stopping drain");
                    break;
                }
            };

            let job_id = job.job_id.clone();

            match self.leases.acquire(&job_id, self.config.lease_ttl).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(%job_id, "Lease held elsewhere, skipping job");
                    self.observability.record_lease_contended(&job_id);
                    report.contended += 1;
                    continue;
                }
                Err(e) => {
                    error!(%job_id, error = %e, "Lease acquire failed, dropping job");
                    self.observability.record_job_failed(&job_id, &e.to_string());
                    report.failed += 1;
                    continue;
                }
            }

            match self.run_job(&job).await {
                Ok(()) => {
                    info!(%job_id, "Job completed");
                    self.observability.record_job_completed(&job_id);
                    report.processed.push(job_id.clone());
                }
                Err(e) => {
                    error!(%job_id, error = %e, "Job failed");
                    self.observability.record_job_failed(&job_id, e.message());
                    report.failed += 1;
                }
            }

            // Always release; if this fails the TTL reclaims the lease
            if let Err(e) = self.leases.release(&job_id).await {
                warn!(%job_id, error = %e, "Lease release failed");
            }
        }

        info!(
            processed = report.processed.len(),
            failed = report.failed,
            contended = report.contended,
            "Drain finished"
        );
        report
    }

    /// Process one leased job and record its completion
    async fn run_job(&self, job: &Job) -> Result<(), JobError> {
        AssertUnwindSafe(self.processor.process(job))
            .catch_unwind()
            .await
            .map_err(|panic| JobError::Panicked(panic_message(panic.as_ref())))??;

        self.ledger.mark_done(&job.job_id, self.config.done_ttl).await?;
        Ok(())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::{KeySpace, backend::{KeyValueStore, memory::MemoryStore}};
    use tracing_test::traced_test;

    struct Fixture {
        store: MemoryStore,
        queue: JobQueue,
        leases: LeaseManager,
        ledger: CompletionLedger,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let shared: Arc<dyn KeyValueStore> = Arc::new(store.clone());
        let keys = KeySpace::new("test");
        Fixture {
            queue: JobQueue::new(shared.clone(), keys.clone()),
            leases: LeaseManager::new(shared.clone(), keys.clone()),
            ledger: CompletionLedger::new(shared, keys),
            store,
        }
    }

    fn driver_with<P: JobProcessor + 'static>(f: &Fixture, processor: P) -> WorkerDriver {
        WorkerDriver::new(
            f.queue.clone(),
            f.leases.clone(),
            f.ledger.clone(),
            Arc::new(processor),
            &QueueConfig::default(),
        )
    }

    async fn succeed(_job: Job) -> Result<(), JobError> {
        Ok(())
    }

    #[tokio::test]
    async fn test_processed_jobs_are_marked_done_and_unlocked() {
        let f = fixture();
        f.queue.enqueue(&Job::new("a")).await.unwrap();
        f.queue.enqueue(&Job::new("b")).await.unwrap();

        let driver = driver_with(&f, succeed);
        let report = driver.drain(&QueueCtx::manual(), 5).await;

        assert_eq!(report.processed, vec![JobId::from("a"), JobId::from("b")]);
        for id in ["a", "b"] {
            let id = JobId::from(id);
            assert!(f.ledger.is_done(&id).await.unwrap());
            assert!(!f.leases.is_held(&id).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_contended_job_is_skipped_not_requeued() {
        let f = fixture();
        f.queue.enqueue(&Job::new("busy")).await.unwrap();
        f.queue.enqueue(&Job::new("free")).await.unwrap();
        assert!(f.leases.acquire(&JobId::from("busy"), Duration::from_secs(60)).await.unwrap());

        let driver = driver_with(&f, succeed);
        let report = driver.drain(&QueueCtx::manual(), 5).await;

        assert_eq!(report.processed, vec![JobId::from("free")]);
        assert_eq!(report.contended, 1);
        assert_eq!(f.queue.depth().await.unwrap(), 0);
        // The other holder's lease is untouched
        assert!(f.leases.is_held(&JobId::from("busy")).await.unwrap());
        assert!(!f.ledger.is_done(&JobId::from("busy")).await.unwrap());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failure_is_isolated_logged_and_dropped() {
        let f = fixture();
        for id in ["ok-1", "boom", "ok-2"] {
            f.queue.enqueue(&Job::new(id)).await.unwrap();
        }

        let driver = driver_with(&f, |job: Job| async move {
            if job.job_id.as_str() == "boom" {
                Err(JobError::failed("upstream returned 502"))
            } else {
                Ok(())
            }
        });
        let report = driver.drain(&QueueCtx::manual(), 5).await;

        assert_eq!(report.processed, vec![JobId::from("ok-1"), JobId::from("ok-2")]);
        assert_eq!(report.failed, 1);
        assert_eq!(f.queue.depth().await.unwrap(), 0);
        assert!(!f.ledger.is_done(&JobId::from("boom")).await.unwrap());
        assert!(!f.leases.is_held(&JobId::from("boom")).await.unwrap());
        assert!(logs_contain("boom"));
        assert!(logs_contain("upstream returned 502"));
    }

    #[tokio::test]
    async fn test_panicking_processor_is_a_failure() {
        let f = fixture();
        f.queue.enqueue(&Job::new("panics")).await.unwrap();
        f.queue.enqueue(&Job::new("after")).await.unwrap();

        let driver = driver_with(&f, |job: Job| async move {
            if job.job_id.as_str() == "panics" {
                panic!("processor exploded");
            }
            Ok::<(), JobError>(())
        });
        let report = driver.drain(&QueueCtx::manual(), 5).await;

        assert_eq!(report.processed, vec![JobId::from("after")]);
        assert_eq!(report.failed, 1);
        assert!(!f.leases.is_held(&JobId::from("panics")).await.unwrap());
    }

    #[tokio::test]
    async fn test_max_jobs_is_clamped() {
        let f = fixture();
        for i in 0..8 {
            f.queue.enqueue(&Job::new(format!("job-{i}"))).await.unwrap();
        }
        let driver = driver_with(&f, succeed);

        let report = driver.drain(&QueueCtx::manual(), 0).await;
        assert_eq!(report.processed.len(), 1);

        let report = driver.drain(&QueueCtx::manual(), 100).await;
        assert_eq!(report.processed.len(), 5);
        assert_eq!(f.queue.depth().await.unwrap(), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_drain_span_carries_trace_id() {
        let f = fixture();
        f.queue.enqueue(&Job::new("traced")).await.unwrap();

        let driver = driver_with(&f, succeed);
        let ctx = QueueCtx::manual().with_trace_id("trace-7f3a".to_string());
        driver.drain(&ctx, 1).await;

        assert!(logs_contain("trace-7f3a"));
        assert!(logs_contain(&ctx.request_id));
    }

    #[tokio::test]
    async fn test_empty_queue_stops_early() {
        let f = fixture();
        let driver = driver_with(&f, succeed);
        let processed = driver.drain(&QueueCtx::scheduled(), 5).await.into_processed();
        assert!(processed.is_empty());
        assert_eq!(f.store.list_len("test:queue").await.unwrap(), 0);
    }
}
