//! Store adapters for persisting window counter state.

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Trait for the shared key-value store backing the window counters.
///
/// Implementations must tolerate concurrent invocation: the dual-window
/// limiter calls into the store from two concurrent branches per request, and
/// overlapping requests for the same identity are expected.
///
/// The contract deliberately exposes no atomic increment or compare-and-set
/// primitive. The counter update built on top of it is a non-atomic
/// read-then-write, so concurrent updates to the same key can lose attempts
/// (see [`WindowCounter`](crate::ratelimit::WindowCounter)).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, or `None` if no entry exists.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key` with the given time-to-live.
    ///
    /// A zero TTL must expire the entry immediately; implementations may
    /// delete the key instead of writing.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Remove the entry under `key`, if any.
    async fn delete(&self, key: &str) -> Result<()>;
}
