//! The contract shared by the in-memory and on-disk caches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::error::CacheResult;

/// Snapshot of a cache's size and counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Live entries (expired entries not yet purged may be included).
    pub size: usize,
    /// TTL applied by `set`.
    pub default_ttl: Duration,
    /// Configured bound on `size`.
    pub capacity: Option<usize>,
    /// Lookups that returned a value.
    pub hits: u64,
    /// Lookups that found nothing or found an expired entry.
    pub misses: u64,
    /// Entries dropped to make room under the capacity bound.
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed.
    pub expirations: u64,
}

/// A string-keyed cache with per-entry expiry.
///
/// For a key stored at `t0` with TTL `ttl` and not touched since, `get`
/// returns the value while `now < t0 + ttl` and `None` from then on.
pub trait CacheStore<V> {
    /// The value for `key`, unless missing or expired. An expired entry is
    /// removed as a side effect.
    fn get(&self, key: &str) -> CacheResult<Option<V>>;

    /// Store `value` under `key` with the default TTL.
    fn set(&self, key: &str, value: V) -> CacheResult<()>;

    /// Store `value` under `key`, expiring `ttl` from now.
    fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) -> CacheResult<()>;

    /// Remove `key`. Returns whether an entry was present.
    fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Remove every entry.
    fn clear(&self) -> CacheResult<()>;

    /// Current size and counters.
    fn stats(&self) -> CacheResult<CacheStats>;
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl Counters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn evicted(&self, n: usize) {
        self.evictions.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn expired(&self, n: usize) {
        self.expirations.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        size: usize,
        default_ttl: Duration,
        capacity: Option<usize>,
    ) -> CacheStats {
        CacheStats {
            size,
            default_ttl,
            capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}

/// Behaviour every [`CacheStore`] must show, driven through `advance` so it
/// works with any clock the store was built on.
#[cfg(test)]
pub(crate) fn check_contract<S: CacheStore<String>>(store: &S, advance: impl Fn(Duration)) {
    let ttl = Duration::from_millis(50);

    assert_eq!(store.get("missing").unwrap(), None);

    store.set_with_ttl("k", "v".to_string(), ttl).unwrap();
    advance(Duration::from_millis(10));
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

    // Overwrite resets the expiry.
    store.set_with_ttl("k", "v2".to_string(), ttl).unwrap();
    advance(Duration::from_millis(45));
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));

    advance(Duration::from_millis(5));
    assert_eq!(store.get("k").unwrap(), None);
    assert_eq!(store.stats().unwrap().size, 0);

    store.set("a", "1".to_string()).unwrap();
    store.set("b", "2".to_string()).unwrap();
    assert!(store.delete("a").unwrap());
    assert!(!store.delete("a").unwrap());
    assert_eq!(store.stats().unwrap().size, 1);

    store.clear().unwrap();
    assert_eq!(store.get("b").unwrap(), None);
    assert_eq!(store.stats().unwrap().size, 0);

    assert!(matches!(
        store.set_with_ttl("z", "x".to_string(), Duration::ZERO),
        Err(crate::CacheError::ZeroTtl)
    ));

    let stats = store.stats().unwrap();
    assert!(stats.hits >= 2);
    assert!(stats.misses >= 2);
    assert!(stats.expirations >= 1);
}
