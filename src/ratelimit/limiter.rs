//! Dual-window admission limiter.

use std::sync::Arc;

use chrono::TimeDelta;
use tracing::{debug, trace};

use crate::config::LimitsConfig;
use crate::store::KeyValueStore;

use super::window::WindowCounter;

/// The admission-control limiter composing the two windows.
///
/// One long-horizon "total" counter bounds aggregate request volume and one
/// short-horizon "burst" counter bounds consecutive requests. Both share the
/// identity components but write under distinct key prefixes, so their buckets
/// never collide in the store.
///
/// The limiter holds no mutable state of its own; everything lives in the
/// store, so one instance can be shared freely across tasks and the same
/// limits apply across process instances pointed at the same store.
pub struct RateLimiter {
    total: WindowCounter,
    burst: WindowCounter,
}

impl RateLimiter {
    /// Create a limiter from the configured limits and a store handle.
    pub fn new(store: Arc<dyn KeyValueStore>, limits: &LimitsConfig) -> Self {
        let total = WindowCounter::new(
            limits.total_limit,
            TimeDelta::seconds(limits.total_window_secs as i64),
            &limits.total_key_prefix,
            store.clone(),
        );
        let burst = WindowCounter::new(
            limits.burst_limit,
            TimeDelta::seconds(limits.burst_window_secs as i64),
            &limits.burst_key_prefix,
            store,
        );
        Self { total, burst }
    }

    /// Compose two pre-built window counters.
    pub fn from_counters(total: WindowCounter, burst: WindowCounter) -> Self {
        Self { total, burst }
    }

    /// The long-horizon counter.
    pub fn total(&self) -> &WindowCounter {
        &self.total
    }

    /// The short-horizon counter.
    pub fn burst(&self) -> &WindowCounter {
        &self.burst
    }

    /// Record one attempt against both windows.
    ///
    /// The two updates run concurrently and the call returns once both have
    /// completed. No ordering holds between the branches, and a failure in
    /// one does not roll back the other.
    pub async fn note_request(&self, identity: &[&str]) {
        trace!(identity = ?identity, "Noting request");
        tokio::join!(self.total.note(identity), self.burst.note(identity));
    }

    /// Decide whether a new request from this identity may proceed.
    ///
    /// Both window checks run concurrently to completion and the result is
    /// their logical AND: one denying window rejects the request. Aside from
    /// the expired-bucket cleanup inside each counter, the check does not
    /// write to the store, so repeated calls are stable until a window
    /// naturally elapses.
    pub async fn allow_request(&self, identity: &[&str]) -> bool {
        let (within_total, within_burst) =
            tokio::join!(self.total.allow(identity), self.burst.allow(identity));

        let allowed = within_total && within_burst;
        if !allowed {
            debug!(
                identity = ?identity,
                within_total,
                within_burst,
                "Request denied"
            );
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::bucket::Bucket;
    use crate::store::{KeyValueStore, MemoryStore};

    fn limits(
        total_limit: u64,
        burst_limit: u64,
        total_window_secs: u64,
        burst_window_secs: u64,
    ) -> LimitsConfig {
        LimitsConfig {
            total_limit,
            burst_limit,
            total_window_secs,
            burst_window_secs,
            ..LimitsConfig::default()
        }
    }

    #[tokio::test]
    async fn test_unseen_identity_denied() {
        let store = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::new(store, &limits(5, 2, 3600, 60));

        assert!(!limiter.allow_request(&["10.0.0.1"]).await);
    }

    #[tokio::test]
    async fn test_burst_window_denies_before_total() {
        let store = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::new(store, &limits(5, 1, 3600, 60));

        limiter.note_request(&["10.0.0.1"]).await;

        // The total window alone would admit this, but the burst window is
        // already exhausted.
        assert!(limiter.total().allow(&["10.0.0.1"]).await);
        assert!(!limiter.burst().allow(&["10.0.0.1"]).await);
        assert!(!limiter.allow_request(&["10.0.0.1"]).await);
    }

    #[tokio::test]
    async fn test_both_windows_admit_under_limits() {
        let store = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::new(store, &limits(5, 3, 3600, 60));

        limiter.note_request(&["10.0.0.1"]).await;
        limiter.note_request(&["10.0.0.1"]).await;

        assert!(limiter.allow_request(&["10.0.0.1"]).await);
    }

    #[tokio::test]
    async fn test_note_updates_both_windows() {
        let store = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::new(store.clone(), &limits(5, 3, 3600, 60));

        limiter.note_request(&["10.0.0.1", "alice"]).await;

        let total_key = limiter.total().key_for(&["10.0.0.1", "alice"]);
        let burst_key = limiter.burst().key_for(&["10.0.0.1", "alice"]);
        assert_ne!(total_key, burst_key);

        for key in [&total_key, &burst_key] {
            let bucket = Bucket::decode(&store.get(key).await.unwrap().unwrap()).unwrap();
            assert_eq!(bucket.attempts, 1);
        }
    }

    #[tokio::test]
    async fn test_allow_is_read_only() {
        let store = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::new(store.clone(), &limits(5, 3, 3600, 60));

        limiter.note_request(&["10.0.0.1"]).await;

        let total_key = limiter.total().key_for(&["10.0.0.1"]);
        let before = store.get(&total_key).await.unwrap().unwrap();

        for _ in 0..10 {
            assert!(limiter.allow_request(&["10.0.0.1"]).await);
        }

        let after = store.get(&total_key).await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_notes_may_undercount() {
        const CALLERS: u64 = 50;

        let store = Arc::new(MemoryStore::new());
        let limiter = Arc::new(RateLimiter::new(store.clone(), &limits(1000, 1000, 3600, 60)));

        let mut handles = Vec::new();
        for _ in 0..CALLERS {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.note_request(&["10.0.0.1"]).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // The read-then-write update can lose attempts under concurrency, so
        // only the bounds hold: at least one write landed, never more than
        // one per caller.
        let total_key = limiter.total().key_for(&["10.0.0.1"]);
        let bucket = Bucket::decode(&store.get(&total_key).await.unwrap().unwrap()).unwrap();
        assert!(bucket.attempts >= 1);
        assert!(bucket.attempts <= CALLERS);
    }
}
