//! # dog-lease-queue: shared job queue with TTL leases
//!
//! A FIFO job queue, a per-job lease and a completion ledger, all living in
//! one shared key-value store so that any number of worker processes can
//! cooperate without talking to each other.
//!
//! ## Guarantees
//!
//! - **At most one worker per job**: a job is only processed while its lease
//!   (`<ns>:lock:<jobId>`) is held; a lease expires on its own if the holder dies
//! - **Duplicate suppression**: finished jobs are recorded under
//!   `<ns>:done:<jobId>` for a configurable window
//! - **Bounded work**: a drain processes at most `max_jobs` jobs and a dequeue
//!   skips at most `max_dequeue_attempts` corrupt entries
//! - **Failure isolation**: a failing or panicking job never stops the drain
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use dog_lease_queue::prelude::*;
//!
//! # async fn run() -> QueueResult<()> {
//! let adapter = QueueAdapter::in_memory();
//!
//! let job = Job::new("abc").with_attribute("ticketId", 42);
//! adapter.enqueue(&job).await?;
//!
//! let driver = adapter.driver(|job: Job| async move {
//!     println!("processing {}", job.job_id);
//!     Ok::<(), JobError>(())
//! });
//! let report = driver.drain(&QueueCtx::manual(), 5).await;
//! assert_eq!(report.processed, vec![JobId::from("abc")]);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod backend;
pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod lease;
pub mod ledger;
pub mod observability;
pub mod producer;
pub mod queue;
pub mod types;
pub mod worker;

pub use adapter::QueueAdapter;
pub use types::{Job, JobId, KeySpace, QueueCtx, QueueEvent, Trigger};
pub use error::{JobError, QueueError, QueueResult};
pub use config::QueueConfig;
pub use backend::{KeyValueStore, StoreValue};
pub use codec::{DiscardReason, EntryCodec, ParsedEntry};
pub use codec::json::JsonCodec;
pub use queue::JobQueue;
pub use lease::LeaseManager;
pub use ledger::CompletionLedger;
pub use driver::{DrainReport, JobProcessor, WorkerDriver};
pub use producer::{Kick, NoopKick, NotifyKick, Producer, SubmitOutcome};
pub use worker::{Drainer, WorkerHandle};

// Observability exports
pub use observability::{LiveMetrics, MetricsSnapshot, ObservabilityLayer};

// Backend implementations
#[cfg(feature = "memory")]
pub use backend::memory::MemoryStore;

#[cfg(feature = "redis")]
pub use backend::redis::RedisStore;

/// Everything needed to enqueue and drain jobs
pub mod prelude {
    pub use crate::{
        QueueAdapter, QueueConfig, KeyValueStore,
    };

    pub use crate::{
        Job, JobId, QueueCtx, Trigger, JobError, QueueError, QueueResult,
    };

    pub use crate::{
        JobProcessor, WorkerDriver, DrainReport,
        Producer, SubmitOutcome, Kick, NoopKick, NotifyKick,
        WorkerHandle,
    };

    pub use crate::{ObservabilityLayer, QueueEvent};

    #[cfg(feature = "memory")]
    pub use crate::MemoryStore;

    #[cfg(feature = "redis")]
    pub use crate::RedisStore;

    pub use async_trait::async_trait;
}
