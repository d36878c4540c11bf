//! Persisted counter state for one identity in one window.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The stored state of one window counter for one identity.
///
/// A bucket is born on the first noted attempt for an identity and accumulates
/// attempts until the window closes. The deadline is fixed at creation; only
/// `attempts` changes across updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Number of attempts recorded since the window opened
    pub attempts: u64,
    /// Absolute time at which the window closes
    pub window_deadline: DateTime<Utc>,
}

impl Bucket {
    /// Open a fresh bucket recording its first attempt.
    pub fn opened(window_deadline: DateTime<Utc>) -> Self {
        Self {
            attempts: 1,
            window_deadline,
        }
    }

    /// Record one more attempt. The window deadline never moves.
    pub fn noted(&self) -> Self {
        Self {
            attempts: self.attempts + 1,
            window_deadline: self.window_deadline,
        }
    }

    /// Time left until the window deadline, clamped to zero once the window
    /// has elapsed. Used as the store TTL on every write.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.window_deadline - now).to_std().unwrap_or_default()
    }

    /// Whether the window deadline has passed.
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now > self.window_deadline
    }

    /// Serialize to the persisted JSON form.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from the persisted JSON form.
    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
