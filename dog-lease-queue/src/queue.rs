//! FIFO queue of pending jobs over a shared store list.
//!
//! Entries are always written as canonical text. Reading is defensive: the
//! list is shared, so whatever sits at the head may be corrupt. `dequeue`
//! drops corrupt entries and keeps popping, but never more than
//! `max_attempts` times per call.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    Job, KeySpace, QueueResult,
    backend::KeyValueStore,
    codec::{EntryCodec, ParsedEntry, json::JsonCodec},
    config::DEFAULT_MAX_DEQUEUE_ATTEMPTS,
    observability::ObservabilityLayer,
};

#[derive(Clone)]
pub struct JobQueue {
    store: Arc<dyn KeyValueStore>,
    keys: KeySpace,
    codec: Arc<dyn EntryCodec>,
    max_attempts: usize,
    observability: ObservabilityLayer,
}

impl JobQueue {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: KeySpace) -> Self {
        Self {
            store,
            keys,
            codec: Arc::new(JsonCodec),
            max_attempts: DEFAULT_MAX_DEQUEUE_ATTEMPTS,
            observability: ObservabilityLayer::new(),
        }
    }

    /// Pops per `dequeue` call before giving up. Zero is treated as one.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn EntryCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_observability(mut self, observability: ObservabilityLayer) -> Self {
        self.observability = observability;
        self
    }

    /// Append a job to the tail. Duplicate identities are not checked here.
    pub async fn enqueue(&self, job: &Job) -> QueueResult<()> {
        let entry = self.codec.encode(job)?;
        self.store.push_tail(&self.keys.queue(), entry).await?;

        self.observability.record_job_enqueued(&job.job_id);
        info!(job_id = %job.job_id, codec = self.codec.codec_id(), "Enqueued job");
        Ok(())
    }

    /// Remove and return the oldest valid job, or `None`.
    ///
    /// Returns `None` as soon as the list is empty, or after `max_attempts`
    /// pops that all yielded corrupt entries.
    pub async fn dequeue(&self) -> QueueResult<Option<Job>> {
        let queue_key = self.keys.queue();

        for attempt in 1..=self.max_attempts {
            let Some(entry) = self.store.pop_head(&queue_key).await? else {
                return Ok(None);
            };

            match self.codec.decode(entry) {
                ParsedEntry::Job(job) => {
                    debug!(job_id = %job.job_id, attempt, "Dequeued job");
                    return Ok(Some(job));
                }
                ParsedEntry::Discard(reason) => {
                    let reason = reason.to_string();
                    warn!(queue = %queue_key, attempt, %reason, "Discarded corrupt queue entry");
                    self.observability.record_entry_discarded(&reason);
                }
            }
        }

        warn!(
            queue = %queue_key,
            max_attempts = self.max_attempts,
            "Gave up dequeueing after too many corrupt entries"
        );
        Ok(None)
    }

    /// Delete every pending entry
    pub async fn purge(&self) -> QueueResult<()> {
        self.store.delete_list(&self.keys.queue()).await?;
        self.observability.record_queue_purged();
        info!(queue = %self.keys.queue(), "Purged queue");
        Ok(())
    }

    /// Number of pending entries, corrupt ones included
    pub async fn depth(&self) -> QueueResult<usize> {
        self.store.list_len(&self.keys.queue()).await
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }
}
