//! Fixed-window counter over the shared store.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use tracing::{debug, trace, warn};

use crate::store::KeyValueStore;

use super::bucket::Bucket;

/// Delimiter joining identity components and the window prefix into a store key.
const KEY_DELIMITER: &str = "_";

/// A single fixed-window counter.
///
/// Parameterized by a limit, a window length, and a key prefix that keeps its
/// buckets separate from any other counter sharing the store. All state lives
/// in the store; the counter itself is immutable and cheap to share.
///
/// The update path is a non-atomic read-then-write against the store, so two
/// concurrent `note` calls for the same identity can both read `attempts = k`
/// and both write `attempts = k + 1`, undercounting by one. A store offering
/// an atomic increment-with-expiry primitive would close this gap; the
/// [`KeyValueStore`] contract does not assume one.
pub struct WindowCounter {
    /// Maximum attempts allowed within one window
    limit: u64,
    /// Length of the window
    period: TimeDelta,
    /// Key suffix isolating this counter's buckets in the store
    prefix: String,
    /// The shared store
    store: Arc<dyn KeyValueStore>,
}

impl WindowCounter {
    /// Create a new window counter.
    pub fn new(limit: u64, period: TimeDelta, prefix: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            limit,
            period,
            prefix: prefix.to_string(),
            store,
        }
    }

    /// The limit for this counter.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// The window length for this counter.
    pub fn period(&self) -> TimeDelta {
        self.period
    }

    /// Build the store key for an identity: the components joined in order,
    /// with this counter's prefix appended last.
    ///
    /// Callers must choose components that are unique and stable; nothing
    /// here guards against collisions.
    pub fn key_for(&self, identity: &[&str]) -> String {
        let mut parts: Vec<&str> = identity.to_vec();
        parts.push(&self.prefix);
        parts.join(KEY_DELIMITER)
    }

    /// Record one attempt for the identity.
    ///
    /// Absent (or unreadable) buckets start a fresh window; existing buckets
    /// accumulate with their deadline unchanged. Every write carries a store
    /// TTL equal to the remaining window time, so entries vanish on their own
    /// once the window closes.
    pub async fn note(&self, identity: &[&str]) {
        let key = self.key_for(identity);
        let now = Utc::now();

        let bucket = match self.read_bucket(&key).await {
            Some(existing) => existing.noted(),
            None => Bucket::opened(now + self.period),
        };

        trace!(
            key = %key,
            attempts = bucket.attempts,
            "Recording attempt"
        );

        let encoded = match bucket.encode() {
            Ok(encoded) => encoded,
            Err(error) => {
                warn!(key = %key, %error, "Failed to encode bucket, dropping attempt");
                return;
            }
        };

        let ttl = bucket.remaining(now);
        if let Err(error) = self.store.set(&key, &encoded, ttl).await {
            warn!(key = %key, %error, "Store write failed, attempt not recorded");
        }
    }

    /// Decide whether the identity is currently within this window's limit.
    ///
    /// An identity with no recorded attempt is denied: the integrating
    /// application is expected to pair `note` with every `allow` check, so an
    /// absent bucket means the attempt was never accounted for. An exhausted
    /// bucket whose window has elapsed is deleted and the check passes; the
    /// next `note` opens a fresh window.
    pub async fn allow(&self, identity: &[&str]) -> bool {
        let key = self.key_for(identity);

        let Some(bucket) = self.read_bucket(&key).await else {
            return false;
        };

        if bucket.attempts < self.limit {
            return true;
        }

        if bucket.expired(Utc::now()) {
            trace!(key = %key, "Window elapsed, clearing exhausted bucket");
            if let Err(error) = self.store.delete(&key).await {
                warn!(key = %key, %error, "Failed to clear expired bucket");
            }
            return true;
        }

        debug!(
            key = %key,
            attempts = bucket.attempts,
            limit = self.limit,
            "Limit reached"
        );
        false
    }

    /// Fetch and decode the bucket under `key`.
    ///
    /// A failed read and an undecodable payload both collapse into `None`,
    /// the same branch as a missing entry. Corrupt data therefore resets the
    /// counter rather than surfacing a fault; the decode failure is logged so
    /// the condition is at least observable.
    async fn read_bucket(&self, key: &str) -> Option<Bucket> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(key = %key, %error, "Store read failed, treating bucket as absent");
                return None;
            }
        };

        match Bucket::decode(&raw?) {
            Ok(bucket) => Some(bucket),
            Err(error) => {
                debug!(key = %key, %error, "Undecodable bucket treated as absent");
                None
            }
        }
    }
}
