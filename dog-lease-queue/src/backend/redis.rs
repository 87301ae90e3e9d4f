//! Redis-backed store.
//!
//! Maps each primitive onto one Redis command:
//!
//! | primitive                   | command            |
//! |-----------------------------|--------------------|
//! | `push_tail`                 | `RPUSH`            |
//! | `pop_head`                  | `LPOP`             |
//! | `delete_list` / `delete`    | `DEL`              |
//! | `list_len`                  | `LLEN`             |
//! | `get`                       | `GET`              |
//! | `set_if_absent_with_expiry` | `SET key v NX EX`  |
//! | `set_with_expiry`           | `SET key v EX`     |

use std::time::Duration;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use crate::{
    QueueError, QueueResult,
    backend::{KeyValueStore, StoreValue},
};

/// Environment variable holding the connection URL
pub const REDIS_URL_ENV: &str = "REDIS_URL";

/// Shared Redis store. Cloning is cheap; clones share one managed connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to `redis_url` (e.g. `redis://localhost:6379`)
    pub async fn connect(redis_url: impl AsRef<str>) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| QueueError::config(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to redis");
        Ok(Self { conn })
    }

    /// Connect using `REDIS_URL`. A missing variable is a configuration error.
    pub async fn from_env() -> QueueResult<Self> {
        let url = std::env::var(REDIS_URL_ENV)
            .map_err(|_| QueueError::config(format!("{REDIS_URL_ENV} is not set")))?;
        Self::connect(url).await
    }
}

/// Redis expiries are whole seconds; round up and never send zero
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn push_tail(&self, list: &str, value: String) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        let _len: i64 = redis::cmd("RPUSH")
            .arg(list)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn pop_head(&self, list: &str) -> QueueResult<Option<StoreValue>> {
        let mut conn = self.conn.clone();
        let head: Option<Vec<u8>> = redis::cmd("LPOP").arg(list).query_async(&mut conn).await?;
        Ok(head.map(StoreValue::from))
    }

    async fn delete_list(&self, list: &str) -> QueueResult<()> {
        self.delete(list).await
    }

    async fn list_len(&self, list: &str) -> QueueResult<usize> {
        let mut conn = self.conn.clone();
        let len: usize = redis::cmd("LLEN").arg(list).query_async(&mut conn).await?;
        Ok(len)
    }

    async fn get(&self, key: &str) -> QueueResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set_if_absent_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> QueueResult<bool> {
        let mut conn = self.conn.clone();
        // Nil reply means the key already existed
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await?;
        debug!(key, acquired = reply.is_some(), "SET NX");
        Ok(reply.is_some())
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        let _removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_rounds_up_to_whole_seconds() {
        assert_eq!(ttl_secs(Duration::from_secs(120)), 120);
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_secs(Duration::ZERO), 1);
    }
}
