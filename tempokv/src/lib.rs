//! # TempoKV - Time-Bounded Key-Value Storage
//!
//! Caches whose entries expire, and a rate limiter whose counters reset, on
//! top of the ordered maps in [`algokit`].
//!
//! ## Features
//!
//! - **In-memory TTL cache**: [`TtlCache`], with an optional capacity bound
//!   that evicts the entry expiring soonest
//! - **Disk TTL cache**: [`DiskCache`], one JSON file per entry, written
//!   atomically
//! - **Background sweeping**: [`spawn_sweeper`] reclaims expired entries on a
//!   tokio interval
//! - **Fixed-window rate limiting**: [`RateLimiter`] over a sharded
//!   [`BucketStore`], failing open when the store is unavailable
//! - **Adapters**: rate-limit headers and 429 bodies in [`http`], completion
//!   caching in [`response_cache`]
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use tempokv::{CacheConfig, TtlCache};
//!
//! let cache = TtlCache::new(CacheConfig::default()).unwrap();
//! cache.set_with_ttl("session:42".to_string(), "alice", Duration::from_secs(30)).unwrap();
//!
//! assert_eq!(cache.get("session:42"), Some("alice"));
//! assert_eq!(cache.stats().size, 1);
//! ```
//!
//! Time is read through the [`Clock`] trait; tests drive expiry with a
//! [`ManualClock`] instead of sleeping.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod clock;
pub mod config;
pub mod disk;
pub mod error;
pub mod http;
pub mod limiter;
pub mod response_cache;
pub mod store;
pub mod sweeper;

pub use cache::TtlCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, DiskCacheConfig, RateLimiterConfig};
pub use disk::DiskCache;
pub use error::{CacheError, CacheResult, LimitError, LimitResult};
pub use http::{RateLimitHeaders, TooManyRequests};
pub use limiter::{Bucket, BucketStore, Decision, RateLimiter, ShardedStore};
pub use response_cache::ResponseCache;
pub use store::{CacheStats, CacheStore};
pub use sweeper::{spawn_sweeper, Sweep, SweeperHandle};
