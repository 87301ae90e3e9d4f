use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::Instant;

use crate::{
    QueueResult,
    backend::{KeyValueStore, StoreValue},
};

/// A string value with its expiry deadline
#[derive(Debug, Clone)]
pub(crate) struct ExpiringValue {
    pub(crate) value: String,
    pub(crate) expires_at: Instant,
}

impl ExpiringValue {
    pub(crate) fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory store for tests and single-process deployments.
///
/// Each primitive takes one write lock, so every operation is atomic with
/// respect to the others. Expiry is checked on read; `ExpirySweeper` drops
/// dead keys in the background. Time comes from `tokio::time`, so tests can
/// pause and advance it.
pub struct MemoryStore {
    /// Keys with TTL: key -> value and deadline
    pub(crate) values: Arc<RwLock<HashMap<String, ExpiringValue>>>,

    /// Lists: key -> entries, head at the front
    pub(crate) lists: Arc<RwLock<HashMap<String, VecDeque<StoreValue>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: Arc::new(RwLock::new(HashMap::new())),
            lists: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Append an arbitrary value to a list, bypassing the text-only writer path (test helper)
    pub fn push_raw(&self, list: &str, value: StoreValue) {
        self.lists
            .write()
            .entry(list.to_string())
            .or_default()
            .push_back(value);
    }

    /// Copy of a list's current entries, head first (test helper)
    pub fn list_snapshot(&self, list: &str) -> Vec<StoreValue> {
        self.lists
            .read()
            .get(list)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Expire a key immediately (test helper)
    pub fn force_expiry(&self, key: &str) {
        if let Some(entry) = self.values.write().get_mut(key) {
            entry.expires_at = Instant::now();
        }
    }

    /// Number of keys held, live or not yet swept
    pub fn key_count(&self) -> usize {
        self.values.read().len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn push_tail(&self, list: &str, value: String) -> QueueResult<()> {
        self.push_raw(list, StoreValue::Text(value));
        Ok(())
    }

    async fn pop_head(&self, list: &str) -> QueueResult<Option<StoreValue>> {
        let mut lists = self.lists.write();
        let Some(entries) = lists.get_mut(list) else {
            return Ok(None);
        };
        let head = entries.pop_front();
        // An emptied list stops existing, as in Redis
        if entries.is_empty() {
            lists.remove(list);
        }
        Ok(head)
    }

    async fn delete_list(&self, list: &str) -> QueueResult<()> {
        self.lists.write().remove(list);
        Ok(())
    }

    async fn list_len(&self, list: &str) -> QueueResult<usize> {
        Ok(self.lists.read().get(list).map_or(0, VecDeque::len))
    }

    async fn get(&self, key: &str) -> QueueResult<Option<String>> {
        let now = Instant::now();
        let values = self.values.read();
        Ok(values
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set_if_absent_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> QueueResult<bool> {
        let now = Instant::now();
        let mut values = self.values.write();

        if values.get(key).is_some_and(|entry| entry.is_live(now)) {
            return Ok(false);
        }

        values.insert(
            key.to_string(),
            ExpiringValue {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> QueueResult<()> {
        let now = Instant::now();
        self.values.write().insert(
            key.to_string(),
            ExpiringValue {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> QueueResult<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same maps, so a clone is another handle to one store
impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            lists: self.lists.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_is_fifo() {
        let store = MemoryStore::new();
        store.push_tail("q", "first".to_string()).await.unwrap();
        store.push_tail("q", "second".to_string()).await.unwrap();

        assert_eq!(store.list_len("q").await.unwrap(), 2);
        assert_eq!(store.pop_head("q").await.unwrap(), Some(StoreValue::Text("first".to_string())));
        assert_eq!(store.pop_head("q").await.unwrap(), Some(StoreValue::Text("second".to_string())));
        assert_eq!(store.pop_head("q").await.unwrap(), None);
        assert_eq!(store.list_len("q").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_if_absent_respects_live_key() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(30);

        assert!(store.set_if_absent_with_expiry("k", "1", ttl).await.unwrap());
        assert!(!store.set_if_absent_with_expiry("k", "2", ttl).await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_key_reads_as_absent_and_can_be_set_again() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(5);

        assert!(store.set_if_absent_with_expiry("k", "1", ttl).await.unwrap());
        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.set_if_absent_with_expiry("k", "2", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete("missing").await.is_ok());
        assert!(store.delete_list("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.push_tail("q", "x".to_string()).await.unwrap();
        assert_eq!(other.list_len("q").await.unwrap(), 1);
    }
}
