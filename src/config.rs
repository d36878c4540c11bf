//! Configuration management for Floodgate.

use serde::{Deserialize, Serialize};

/// Main configuration for a Floodgate limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodgateConfig {
    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Window limit configuration
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for FloodgateConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

/// Limits for the two admission windows.
///
/// Immutable once the limiter is constructed. All counter state lives in the
/// external store; nothing here changes at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum requests allowed across the long-horizon total window
    #[serde(default = "default_total_limit")]
    pub total_limit: u64,

    /// Maximum consecutive requests allowed within the short burst window
    #[serde(default = "default_burst_limit")]
    pub burst_limit: u64,

    /// Length of the total window in seconds
    #[serde(default = "default_total_window_secs")]
    pub total_window_secs: u64,

    /// Length of the burst window in seconds
    #[serde(default = "default_burst_window_secs")]
    pub burst_window_secs: u64,

    /// Key suffix for total-window buckets
    #[serde(default = "default_total_key_prefix")]
    pub total_key_prefix: String,

    /// Key suffix for burst-window buckets
    #[serde(default = "default_burst_key_prefix")]
    pub burst_key_prefix: String,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            total_limit: default_total_limit(),
            burst_limit: default_burst_limit(),
            total_window_secs: default_total_window_secs(),
            burst_window_secs: default_burst_window_secs(),
            total_key_prefix: default_total_key_prefix(),
            burst_key_prefix: default_burst_key_prefix(),
        }
    }
}

fn default_total_limit() -> u64 {
    1000
}

fn default_burst_limit() -> u64 {
    20
}

fn default_total_window_secs() -> u64 {
    3600
}

fn default_burst_window_secs() -> u64 {
    60
}

fn default_total_key_prefix() -> String {
    "total".to_string()
}

fn default_burst_key_prefix() -> String {
    "burst".to_string()
}

impl FloodgateConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: FloodgateConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::FloodgateError::Config(e.to_string()))?;
        Ok(config)
    }
}
