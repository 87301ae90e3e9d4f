use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::{
    Job, JobId, KeySpace, QueueResult,
    backend::KeyValueStore,
    config::QueueConfig,
    driver::{JobProcessor, WorkerDriver},
    lease::LeaseManager,
    ledger::CompletionLedger,
    observability::ObservabilityLayer,
    producer::{Kick, NotifyKick, Producer},
    queue::JobQueue,
    worker::{Drainer, WorkerHandle},
};

/// One queue namespace over one store: queue, leases and ledger sharing a
/// configuration and an observability layer.
///
/// ```rust,no_run
/// use dog_lease_queue::prelude::*;
/// use dog_lease_queue::backend::memory::MemoryStore;
///
/// # async fn run() -> QueueResult<()> {
/// let adapter = QueueAdapter::new(MemoryStore::new(), QueueConfig::with_namespace("answers"))?;
///
/// let job = Job::new(JobId::derive(["ticket-1", "hello"])).with_attribute("ticketId", 1);
/// adapter.producer(std::sync::Arc::new(NoopKick)).submit(&job).await?;
///
/// let driver = adapter.driver(|job: Job| async move {
///     println!("answering {}", job.job_id);
///     Ok::<(), JobError>(())
/// });
/// let report = driver.drain(&QueueCtx::manual(), 5).await;
/// assert_eq!(report.processed.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueueAdapter {
    store: Arc<dyn KeyValueStore>,
    config: QueueConfig,
    queue: JobQueue,
    leases: LeaseManager,
    ledger: CompletionLedger,
    observability: ObservabilityLayer,
}

impl QueueAdapter {
    /// Create an adapter; fails if the configuration is unusable
    pub fn new<S: KeyValueStore + 'static>(store: S, config: QueueConfig) -> QueueResult<Self> {
        Self::from_shared(Arc::new(store), config)
    }

    /// Create an adapter over an already shared store
    pub fn from_shared(store: Arc<dyn KeyValueStore>, config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;
        Ok(Self::assemble(store, config))
    }

    /// Adapter over a fresh in-memory store with default configuration
    #[cfg(feature = "memory")]
    pub fn in_memory() -> Self {
        Self::assemble(
            Arc::new(crate::backend::memory::MemoryStore::new()),
            QueueConfig::default(),
        )
    }

    fn assemble(store: Arc<dyn KeyValueStore>, config: QueueConfig) -> Self {
        let keys = KeySpace::new(config.namespace.clone());
        let observability = ObservabilityLayer::new();
        let queue = JobQueue::new(store.clone(), keys.clone())
            .with_max_attempts(config.max_dequeue_attempts)
            .with_observability(observability.clone());
        let leases = LeaseManager::new(store.clone(), keys.clone());
        let ledger = CompletionLedger::new(store.clone(), keys);

        info!(namespace = %config.namespace, "Queue adapter ready");

        Self {
            store,
            config,
            queue,
            leases,
            ledger,
            observability,
        }
    }

    #[instrument(skip(self, job), fields(job_id = %job.job_id))]
    pub async fn enqueue(&self, job: &Job) -> QueueResult<()> {
        self.queue.enqueue(job).await
    }

    #[instrument(skip(self))]
    pub async fn dequeue(&self) -> QueueResult<Option<Job>> {
        self.queue.dequeue().await
    }

    #[instrument(skip(self))]
    pub async fn purge_queue(&self) -> QueueResult<()> {
        self.queue.purge().await
    }

    pub async fn queue_depth(&self) -> QueueResult<usize> {
        self.queue.depth().await
    }

    pub async fn mark_done(&self, job_id: &JobId, ttl: Duration) -> QueueResult<()> {
        self.ledger.mark_done(job_id, ttl).await
    }

    pub async fn is_done(&self, job_id: &JobId) -> QueueResult<bool> {
        self.ledger.is_done(job_id).await
    }

    pub async fn acquire_lock(&self, job_id: &JobId, ttl: Duration) -> QueueResult<bool> {
        self.leases.acquire(job_id, ttl).await
    }

    pub async fn release_lock(&self, job_id: &JobId) -> QueueResult<()> {
        self.leases.release(job_id).await
    }

    /// Build a driver that runs jobs through `processor`
    pub fn driver<P: JobProcessor + 'static>(&self, processor: P) -> WorkerDriver {
        self.driver_with(Arc::new(processor))
    }

    pub fn driver_with(&self, processor: Arc<dyn JobProcessor>) -> WorkerDriver {
        WorkerDriver::new(
            self.queue.clone(),
            self.leases.clone(),
            self.ledger.clone(),
            processor,
            &self.config,
        )
        .with_observability(self.observability.clone())
    }

    /// Build a producer that fires `kick` after each enqueue
    pub fn producer(&self, kick: Arc<dyn Kick>) -> Producer {
        Producer::new(self.queue.clone(), self.ledger.clone())
            .with_kick(kick)
            .with_observability(self.observability.clone())
    }

    /// Spawn a background drainer; returns its handle and the kick that wakes it
    pub fn start_drainer<P: JobProcessor + 'static>(&self, processor: P) -> (WorkerHandle, NotifyKick) {
        let kick = NotifyKick::new();
        let driver = Arc::new(self.driver(processor));
        let handle = Drainer::new(driver, &self.config, kick.notify()).spawn();
        info!(namespace = %self.config.namespace, "Started drainer");
        (handle, kick)
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeySpace {
        self.queue.keys()
    }

    pub fn observability(&self) -> &ObservabilityLayer {
        &self.observability
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::{JobError, QueueError, QueueCtx, backend::memory::MemoryStore};

    #[tokio::test]
    async fn test_adapter_rejects_invalid_config() {
        let config = QueueConfig {
            max_dequeue_attempts: 0,
            ..QueueConfig::default()
        };
        let result = QueueAdapter::new(MemoryStore::new(), config);
        assert!(matches!(result, Err(QueueError::Config(_))));
    }

    #[tokio::test]
    async fn test_namespace_scopes_keys() {
        let store = MemoryStore::new();
        let answers = QueueAdapter::new(store.clone(), QueueConfig::with_namespace("answers")).unwrap();
        let billing = QueueAdapter::new(store.clone(), QueueConfig::with_namespace("billing")).unwrap();

        answers.enqueue(&Job::new("abc")).await.unwrap();

        assert_eq!(answers.queue_depth().await.unwrap(), 1);
        assert_eq!(billing.queue_depth().await.unwrap(), 0);
        assert_eq!(store.list_snapshot("answers:queue").len(), 1);
    }

    #[tokio::test]
    async fn test_components_share_metrics() {
        let adapter = QueueAdapter::in_memory();
        let producer = adapter.producer(Arc::new(crate::producer::NoopKick));
        producer.submit(&Job::new("abc")).await.unwrap();

        let driver = adapter.driver(|_job: Job| async { Ok::<(), JobError>(()) });
        driver.drain(&QueueCtx::manual(), 5).await;
        producer.submit(&Job::new("abc")).await.unwrap();

        let snapshot = adapter.observability().metrics().snapshot();
        assert_eq!(snapshot.jobs_enqueued, 1);
        assert_eq!(snapshot.jobs_completed, 1);
        assert_eq!(snapshot.duplicates_suppressed, 1);
    }
}
