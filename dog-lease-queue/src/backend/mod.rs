#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

use async_trait::async_trait;
use futures_core::Stream;
use std::pin::Pin;
use std::time::Duration;

use crate::QueueResult;

/// Type alias for boxed streams (stable Rust compatible)
pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send + 'static>>;

/// A value popped from a store list.
///
/// Writers in this crate only ever push text, but the list is shared and
/// out-of-band writers may leave anything behind, so readers see what is
/// actually there.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    /// UTF-8 text
    Text(String),
    /// Raw bytes that are not valid UTF-8
    Bytes(Vec<u8>),
    /// A structured value some clients hand back already decoded
    Structured(serde_json::Value),
}

impl StoreValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<String> for StoreValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for StoreValue {
    fn from(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(err) => Self::Bytes(err.into_bytes()),
        }
    }
}

/// Atomic primitives of a shared key-value store.
///
/// Every call is a single atomic operation on the store; there are no
/// multi-key transactions. All coordination between workers goes through
/// these calls because workers may live in different processes.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Append a value to the tail of a list
    async fn push_tail(&self, list: &str, value: String) -> QueueResult<()>;

    /// Remove and return the head of a list, `None` when empty
    async fn pop_head(&self, list: &str) -> QueueResult<Option<StoreValue>>;

    /// Delete a whole list
    async fn delete_list(&self, list: &str) -> QueueResult<()>;

    /// Number of entries in a list
    async fn list_len(&self, list: &str) -> QueueResult<usize>;

    /// Read a key
    async fn get(&self, key: &str) -> QueueResult<Option<String>>;

    /// Set a key only if it does not exist, with expiry. Returns whether it was set.
    async fn set_if_absent_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> QueueResult<bool>;

    /// Set a key unconditionally, with expiry
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> QueueResult<()>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> QueueResult<()>;
}
