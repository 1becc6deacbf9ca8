//! Configuration Module
//!
//! Handles cache configuration from environment variables or any serde source.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::EvictionPolicy;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Eviction policy
    pub policy: EvictionPolicy,
    /// Maximum number of entries the cache can hold, 0 = unbounded
    pub max_size: usize,
    /// Default TTL in milliseconds for entries without explicit TTL, 0 = never expires
    pub default_ttl_ms: u64,
    /// Interval in milliseconds between scheduled prune passes
    pub prune_interval_ms: u64,
}

impl CacheConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_POLICY` - `fifo`, `lru`, `lfu` or `timed` (default: lru)
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 0)
    /// - `CACHE_PRUNE_INTERVAL_MS` - Prune frequency in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let policy = match env::var("CACHE_POLICY") {
            Ok(value) => value.parse().unwrap_or_else(|err| {
                warn!("{}, falling back to {}", err, defaults.policy);
                defaults.policy
            }),
            Err(_) => defaults.policy,
        };

        Self {
            policy,
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_size),
            default_ttl_ms: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl_ms),
            prune_interval_ms: env::var("CACHE_PRUNE_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.prune_interval_ms),
        }
    }

    /// Set the eviction policy.
    pub fn with_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the maximum number of entries.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the scheduled prune interval.
    pub fn with_prune_interval(mut self, interval: Duration) -> Self {
        self.prune_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_millis(self.prune_interval_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: EvictionPolicy::Lru,
            max_size: 1000,
            default_ttl_ms: 0,
            prune_interval_ms: 1000,
        }
    }
}
