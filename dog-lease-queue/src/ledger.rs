//! Completion ledger: "this job identity was processed within the last TTL".
//!
//! A marker's absence does not mean the job never ran, only that the
//! dedup window has passed.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::{JobId, KeySpace, QueueResult, backend::KeyValueStore};

const DONE_SENTINEL: &str = "1";

#[derive(Clone)]
pub struct CompletionLedger {
    store: Arc<dyn KeyValueStore>,
    keys: KeySpace,
}

impl CompletionLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    pub async fn mark_done(&self, job_id: &JobId, ttl: Duration) -> QueueResult<()> {
        self.store
            .set_with_expiry(&self.keys.done(job_id), DONE_SENTINEL, ttl)
            .await?;
        debug!(%job_id, ttl_secs = ttl.as_secs(), "Marked done");
        Ok(())
    }

    pub async fn is_done(&self, job_id: &JobId) -> QueueResult<bool> {
        Ok(self.store.get(&self.keys.done(job_id)).await?.is_some())
    }
}
