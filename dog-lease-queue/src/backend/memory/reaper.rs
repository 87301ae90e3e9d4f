use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant};
use tracing::{info, warn, debug};

use crate::{QueueResult, backend::memory::storage::MemoryStore};

/// Periodically drops expired keys from a `MemoryStore`.
///
/// Expiry is already enforced on read; sweeping only keeps memory bounded
/// when leases and completion markers are never read again.
pub struct ExpirySweeper {
    store: Arc<MemoryStore>,
    interval: Duration,
}

impl ExpirySweeper {
    /// Create a new sweeper
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            interval: Duration::from_secs(30), // Run every 30 seconds
        }
    }

    /// Create sweeper with custom interval
    pub fn with_interval(store: Arc<MemoryStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run the sweeper until the task is dropped
    pub async fn start(self) -> QueueResult<()> {
        let mut ticker = interval(self.interval);

        info!("Starting expiry sweeper with interval: {:?}", self.interval);

        loop {
            ticker.tick().await;

            match self.sweep_expired().await {
                Ok(swept) if swept > 0 => info!("Swept {} expired keys", swept),
                Ok(_) => debug!("No expired keys found"),
                Err(e) => warn!("Error during expiry sweep: {}", e),
            }
        }
    }

    /// Run one sweep cycle
    pub async fn sweep_expired(&self) -> QueueResult<usize> {
        let now = Instant::now();
        let mut values = self.store.values.write();
        let before = values.len();
        values.retain(|_, entry| entry.is_live(now));
        Ok(before - values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::KeyValueStore;

    #[tokio::test]
    async fn test_sweep_drops_only_expired_keys() {
        let store = Arc::new(MemoryStore::new());
        let ttl = Duration::from_secs(60);
        store.set_with_expiry("stale", "1", ttl).await.unwrap();
        store.set_with_expiry("fresh", "1", ttl).await.unwrap();
        store.force_expiry("stale");

        let sweeper = ExpirySweeper::new(store.clone());
        let swept = sweeper.sweep_expired().await.unwrap();

        assert_eq!(swept, 1);
        assert_eq!(store.key_count(), 1);
        assert_eq!(store.get("fresh").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_runs_on_interval() {
        let store = Arc::new(MemoryStore::new());
        store.set_with_expiry("k", "1", Duration::from_secs(1)).await.unwrap();

        let sweeper = ExpirySweeper::with_interval(store.clone(), Duration::from_secs(10));
        let task = tokio::spawn(sweeper.start());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(store.key_count(), 0);

        task.abort();
    }
}
