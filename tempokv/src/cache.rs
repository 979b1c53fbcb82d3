//! In-memory TTL cache.
//!
//! Entries live in a `HashMap`; a second index, an [`OrderedMap`] keyed by
//! `(expires_at, seq)`, orders them by expiry so that purging and capacity
//! eviction always start from the entry that expires first. `seq` is a
//! per-cache insertion counter: it makes index keys unique and breaks expiry
//! ties in insertion order.
//!
//! Expiry is lazy on access and eager on [`TtlCache::purge_expired`], which
//! the background [`sweeper`](crate::sweeper) calls periodically.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use algokit::{AvlTree, OrderedMap};
use parking_lot::RwLock;
use tracing::debug;

use crate::clock::{instant_after, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::store::{CacheStats, CacheStore, Counters};

/// Expiry index key.
pub type ExpiryKey = (Instant, u64);

/// Default expiry index.
pub type DefaultIndex<K> = AvlTree<ExpiryKey, K>;

struct Entry<V> {
    value: V,
    expires_at: Instant,
    seq: u64,
}

impl<V> Entry<V> {
    #[inline]
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct Inner<K, V, M> {
    entries: HashMap<K, Entry<V>>,
    expiry: M,
    next_seq: u64,
}

impl<K, V, M> Inner<K, V, M>
where
    K: Hash + Eq + Clone,
    M: OrderedMap<Key = ExpiryKey, Value = K>,
{
    fn remove<Q>(&mut self, key: &Q) -> Option<Entry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.entries.remove(key)?;
        self.expiry.remove(&(entry.expires_at, entry.seq));
        Some(entry)
    }

    /// Drop every entry with `expires_at <= now`, earliest first.
    fn purge(&mut self, now: Instant) -> usize {
        let mut purged = 0;
        loop {
            match self.expiry.first() {
                Some((&(at, _), _)) if at <= now => {}
                _ => break,
            }
            let Some((_, key)) = self.expiry.pop_first() else {
                break;
            };
            self.entries.remove(&key);
            purged += 1;
        }
        purged
    }

    /// Drop the entry that expires first.
    fn evict_earliest(&mut self) -> Option<K> {
        let (_, key) = self.expiry.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.expiry.clear();
    }
}

/// A concurrent map whose entries expire.
///
/// `M` is the expiry index; any of the `algokit` ordered maps works.
///
/// ```
/// use std::time::Duration;
/// use tempokv::{CacheConfig, TtlCache};
///
/// let cache: TtlCache<String, u32> =
///     TtlCache::new(CacheConfig::default().with_capacity(2)).unwrap();
/// cache.set("a".to_string(), 1).unwrap();
/// cache.set_with_ttl("b".to_string(), 2, Duration::from_secs(1)).unwrap();
/// assert_eq!(cache.get("a"), Some(1));
///
/// // Full: "b" expires first, so it makes room for "c".
/// cache.set("c".to_string(), 3).unwrap();
/// assert_eq!(cache.get("b"), None);
/// ```
pub struct TtlCache<K, V, C = SystemClock, M = DefaultIndex<K>> {
    inner: RwLock<Inner<K, V, M>>,
    clock: C,
    default_ttl: Duration,
    capacity: Option<usize>,
    counters: Counters,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// A cache on the system clock with an AVL expiry index.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> TtlCache<K, V, C>
where
    K: Hash + Eq + Clone,
    V: Clone,
    C: Clock,
{
    /// A cache on `clock` with an AVL expiry index.
    pub fn with_clock(config: CacheConfig, clock: C) -> CacheResult<Self> {
        Self::with_index(config, clock, AvlTree::new())
    }
}

impl<K, V, C, M> TtlCache<K, V, C, M>
where
    K: Hash + Eq + Clone,
    V: Clone,
    C: Clock,
    M: OrderedMap<Key = ExpiryKey, Value = K>,
{
    /// A cache on `clock` using `index` (which must be empty) to order expiry.
    pub fn with_index(config: CacheConfig, clock: C, mut index: M) -> CacheResult<Self> {
        if config.default_ttl.is_zero() {
            return Err(CacheError::ZeroTtl);
        }
        if config.capacity == Some(0) {
            return Err(CacheError::ZeroCapacity);
        }
        index.clear();

        Ok(Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                expiry: index,
                next_seq: 0,
            }),
            clock,
            default_ttl: config.default_ttl,
            capacity: config.capacity,
            counters: Counters::default(),
        })
    }

    /// The value for `key` if present and unexpired.
    ///
    /// Runs under the read lock. An expired entry is removed under the write
    /// lock, after re-checking that no writer refreshed it in between.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        {
            let inner = self.inner.read();
            match inner.entries.get(key) {
                None => {
                    self.counters.miss();
                    return None;
                }
                Some(entry) if !entry.is_expired(now) => {
                    self.counters.hit();
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        let mut inner = self.inner.write();
        match inner.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.counters.hit();
                Some(entry.value.clone())
            }
            Some(_) => {
                inner.remove(key);
                self.counters.expired(1);
                self.counters.miss();
                None
            }
            None => {
                self.counters.miss();
                None
            }
        }
    }

    /// Whether `key` holds an unexpired entry. Does not touch counters or
    /// remove anything.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        self.inner
            .read()
            .entries
            .get(key)
            .is_some_and(|e| !e.is_expired(now))
    }

    /// Store with the default TTL.
    pub fn set(&self, key: K, value: V) -> CacheResult<()> {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    /// Store `value`, expiring `ttl` from now. Overwrites reset the expiry.
    ///
    /// When the cache is full and `key` is new, expired entries are purged
    /// first; if that frees nothing, the entry expiring soonest is evicted.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) -> CacheResult<()> {
        if ttl.is_zero() {
            return Err(CacheError::ZeroTtl);
        }
        let now = self.clock.now();
        let expires_at = instant_after(now, ttl);

        let mut inner = self.inner.write();
        if inner.remove(&key).is_none() {
            if let Some(cap) = self.capacity {
                if inner.entries.len() >= cap {
                    let purged = inner.purge(now);
                    self.counters.expired(purged);
                    if inner.entries.len() >= cap && inner.evict_earliest().is_some() {
                        self.counters.evicted(1);
                        debug!(capacity = cap, "ttl cache full, evicted earliest expiry");
                    }
                }
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.expiry.insert((expires_at, seq), key.clone());
        inner.entries.insert(
            key,
            Entry {
                value,
                expires_at,
                seq,
            },
        );
        Ok(())
    }

    /// Remove `key`, returning its value if it was live.
    pub fn delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        let entry = self.inner.write().remove(key)?;
        (!entry.is_expired(now)).then_some(entry.value)
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let purged = self.inner.write().purge(now);
        if purged > 0 {
            self.counters.expired(purged);
            debug!(purged, "ttl cache purged expired entries");
        }
        purged
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// TTL used by [`set`](Self::set).
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Size and counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len(), self.default_ttl, self.capacity)
    }
}

impl<V, C, M> CacheStore<V> for TtlCache<String, V, C, M>
where
    V: Clone,
    C: Clock,
    M: OrderedMap<Key = ExpiryKey, Value = String>,
{
    fn get(&self, key: &str) -> CacheResult<Option<V>> {
        Ok(TtlCache::get(self, key))
    }

    fn set(&self, key: &str, value: V) -> CacheResult<()> {
        TtlCache::set(self, key.to_string(), value)
    }

    fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) -> CacheResult<()> {
        TtlCache::set_with_ttl(self, key.to_string(), value, ttl)
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.inner.write().remove(key).is_some())
    }

    fn clear(&self) -> CacheResult<()> {
        TtlCache::clear(self);
        Ok(())
    }

    fn stats(&self) -> CacheResult<CacheStats> {
        Ok(TtlCache::stats(self))
    }
}
