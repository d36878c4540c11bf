//! Redis-backed store adapter.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::Result;

use super::KeyValueStore;

/// Store adapter over a shared Redis instance.
///
/// Uses a [`ConnectionManager`], which multiplexes a single connection and is
/// cheap to clone, so concurrent callers do not contend on a lock. TTLs are
/// written with millisecond precision so that sub-second burst windows are
/// honored.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection })
    }

    /// Wrap an existing connection manager.
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut connection = self.connection.clone();
        let value: Option<Vec<u8>> = connection.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut connection = self.connection.clone();

        // Redis rejects non-positive expirations, so an already-elapsed TTL
        // is realized by dropping the entry.
        let ttl_ms = ttl.as_millis() as u64;
        if ttl_ms == 0 {
            connection.del::<_, ()>(key).await?;
            return Ok(());
        }

        connection.pset_ex::<_, _, ()>(key, value, ttl_ms).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut connection = self.connection.clone();
        connection.del::<_, ()>(key).await?;
        Ok(())
    }
}
