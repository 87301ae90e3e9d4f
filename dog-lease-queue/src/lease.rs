//! Per-job leases: a TTL-bounded trylock on a job identity.
//!
//! Dequeue already hands each list slot to one worker. The lease covers
//! the other case, two slots carrying the same `jobId`, so that the same
//! logical job is never processed twice at once.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::{JobId, KeySpace, QueueResult, backend::KeyValueStore};

/// Value stored under a lease key
const LEASE_SENTINEL: &str = "1";

#[derive(Clone)]
pub struct LeaseManager {
    store: Arc<dyn KeyValueStore>,
    keys: KeySpace,
}

impl LeaseManager {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Try to take the lease. `false` means someone else holds it; do not wait.
    pub async fn acquire(&self, job_id: &JobId, ttl: Duration) -> QueueResult<bool> {
        let acquired = self
            .store
            .set_if_absent_with_expiry(&self.keys.lock(job_id), LEASE_SENTINEL, ttl)
            .await?;
        debug!(%job_id, acquired, ttl_secs = ttl.as_secs(), "Lease acquire");
        Ok(acquired)
    }

    /// Drop the lease. Releasing a lease nobody holds is fine.
    pub async fn release(&self, job_id: &JobId) -> QueueResult<()> {
        self.store.delete(&self.keys.lock(job_id)).await?;
        debug!(%job_id, "Lease released");
        Ok(())
    }

    /// Whether a live lease exists for the job
    pub async fn is_held(&self, job_id: &JobId) -> QueueResult<bool> {
        Ok(self.store.get(&self.keys.lock(job_id)).await?.is_some())
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryStore;

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let leases = LeaseManager::new(Arc::new(MemoryStore::new()), KeySpace::new("test"));
        let id = JobId::from("abc");

        leases.release(&id).await.unwrap();
        assert!(leases.acquire(&id, Duration::from_secs(60)).await.unwrap());
        assert!(leases.is_held(&id).await.unwrap());
        leases.release(&id).await.unwrap();
        leases.release(&id).await.unwrap();
        assert!(!leases.is_held(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_leases_are_per_job() {
        let leases = LeaseManager::new(Arc::new(MemoryStore::new()), KeySpace::new("test"));
        let ttl = Duration::from_secs(60);

        assert!(leases.acquire(&JobId::from("a"), ttl).await.unwrap());
        assert!(leases.acquire(&JobId::from("b"), ttl).await.unwrap());
    }
}
