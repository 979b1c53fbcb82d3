//! Configuration for the caches and the rate limiter.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default entry lifetime when none is given.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default number of rate limiter shards.
pub const DEFAULT_SHARDS: usize = 16;

/// Configuration for [`TtlCache`](crate::TtlCache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of entries stored without an explicit TTL.
    pub default_ttl: Duration,
    /// Maximum number of live entries; unbounded when `None`.
    pub capacity: Option<usize>,
    /// Interval for [`spawn_sweeper`](crate::spawn_sweeper).
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            capacity: None,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Bound the number of entries.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Configuration for [`DiskCache`](crate::DiskCache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskCacheConfig {
    /// Directory holding one file per entry. Created if missing.
    pub dir: PathBuf,
    /// Lifetime of entries stored without an explicit TTL.
    pub default_ttl: Duration,
    /// Maximum number of entry files; unbounded when `None`.
    pub capacity: Option<usize>,
}

impl DiskCacheConfig {
    /// Defaults for a cache rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            default_ttl: DEFAULT_TTL,
            capacity: None,
        }
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Bound the number of entries.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// Configuration for [`ShardedStore`](crate::ShardedStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Number of independently locked shards.
    pub shards: usize,
    /// Maximum tracked keys across all shards; unbounded when `None`.
    pub max_keys: Option<usize>,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
            max_keys: None,
        }
    }
}

impl RateLimiterConfig {
    /// Set the shard count. Zero is treated as one.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards.max(1);
        self
    }

    /// Bound the number of tracked keys.
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = Some(max_keys);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = CacheConfig::default();
        assert_eq!(c.default_ttl, Duration::from_secs(300));
        assert_eq!(c.capacity, None);
        assert_eq!(c.sweep_interval, Duration::from_secs(300));

        let r = RateLimiterConfig::default();
        assert_eq!(r.shards, 16);
        assert_eq!(r.max_keys, None);
        assert_eq!(RateLimiterConfig::default().with_shards(0).shards, 1);
    }

    #[test]
    fn test_json_round_trip() {
        let c = CacheConfig::default()
            .with_capacity(128)
            .with_default_ttl(Duration::from_millis(50));
        let json = serde_json::to_string(&c).unwrap();
        let back: CacheConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);

        let d = DiskCacheConfig::new("/var/cache/weather").with_capacity(10);
        let back: DiskCacheConfig =
            serde_json::from_str(&serde_json::to_string(&d).unwrap()).unwrap();
        assert_eq!(back, d);
    }
}
