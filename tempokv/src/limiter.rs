//! Fixed-window rate limiting.
//!
//! Each key owns a bucket `(count, window_start)`. A call first rolls the
//! window over if `now - window_start >= window`, then admits the request iff
//! `count < limit`. A refused request leaves the count untouched, so no
//! window of length `window` ever admits more than `limit` requests for one
//! key.
//!
//! Buckets live behind the [`BucketStore`] trait. The limiter is not the
//! system of record: when the store fails, requests are allowed and the
//! failure is logged.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::clock::{instant_after, Clock, SystemClock};
use crate::config::RateLimiterConfig;
use crate::error::{LimitError, LimitResult};

/// Per-key counter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Requests admitted in the current window.
    pub count: u32,
    /// When the current window opened.
    pub window_start: Instant,
}

impl Bucket {
    fn fresh(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    #[inline]
    fn rolled_over(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }
}

/// Storage for buckets.
///
/// Every method is a critical section for the key it touches.
pub trait BucketStore<K>: Send + Sync {
    /// Run `f` on the slot for `key`. The slot is `None` for an untracked
    /// key; whatever `f` leaves in it is stored (`None` removes the key).
    fn update<R>(&self, key: &K, f: impl FnOnce(&mut Option<Bucket>) -> R) -> LimitResult<R>;

    /// Current bucket for `key`, if tracked.
    fn peek(&self, key: &K) -> LimitResult<Option<Bucket>>;

    /// Drop every bucket for which `keep` is false. Returns how many went.
    fn retain(&self, keep: impl FnMut(&Bucket) -> bool) -> LimitResult<usize>;

    /// Number of tracked keys.
    fn len(&self) -> usize;

    /// Whether no keys are tracked.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory bucket store split into independently locked shards.
///
/// With a key bound, the store tracks at most `max_keys` buckets in total.
/// Admitting a new key beyond that evicts the bucket with the oldest
/// `window_start` across all shards. Eviction scans every shard, so it costs
/// O(tracked keys) and only happens once the bound is reached.
pub struct ShardedStore<K, H = RandomState> {
    shards: Box<[Mutex<HashMap<K, Bucket>>]>,
    max_keys: Option<usize>,
    tracked: AtomicUsize,
    hasher: H,
}

impl<K: Hash + Eq> ShardedStore<K> {
    /// A store laid out according to `config`.
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self::with_hasher(config, RandomState::new())
    }
}

impl<K: Hash + Eq, H: BuildHasher> ShardedStore<K, H> {
    /// A store that picks shards with `hasher`.
    pub fn with_hasher(config: &RateLimiterConfig, hasher: H) -> Self {
        let n = config.shards.max(1);
        Self {
            shards: (0..n).map(|_| Mutex::new(HashMap::new())).collect(),
            max_keys: config.max_keys,
            tracked: AtomicUsize::new(0),
            hasher,
        }
    }

    #[inline]
    fn shard(&self, key: &K) -> &Mutex<HashMap<K, Bucket>> {
        let i = self.hasher.hash_one(key) as usize % self.shards.len();
        &self.shards[i]
    }
}

impl<K: Hash + Eq + Clone, H: BuildHasher> ShardedStore<K, H> {
    /// Drop the bucket with the oldest window, never `keep`.
    ///
    /// Shards are locked one at a time. If the chosen bucket changes before
    /// it can be removed, the scan is repeated.
    fn evict_oldest(&self, keep: &K) {
        for _ in 0..self.shards.len() {
            let mut oldest: Option<(usize, K, Instant)> = None;
            for (i, shard) in self.shards.iter().enumerate() {
                let map = shard.lock();
                let candidate = map
                    .iter()
                    .filter(|(k, _)| *k != keep)
                    .min_by_key(|(_, b)| b.window_start);
                if let Some((k, b)) = candidate {
                    if oldest.as_ref().map_or(true, |(_, _, t)| b.window_start < *t) {
                        oldest = Some((i, k.clone(), b.window_start));
                    }
                }
            }

            let Some((i, key, window_start)) = oldest else {
                return;
            };
            let mut map = self.shards[i].lock();
            if map.get(&key).is_some_and(|b| b.window_start == window_start) {
                map.remove(&key);
                self.tracked.fetch_sub(1, Ordering::AcqRel);
                debug!("rate limiter full, evicted oldest window");
                return;
            }
        }
    }
}

impl<K: Hash + Eq> Default for ShardedStore<K> {
    fn default() -> Self {
        Self::new(&RateLimiterConfig::default())
    }
}

impl<K, H> BucketStore<K> for ShardedStore<K, H>
where
    K: Hash + Eq + Clone + Send + Sync,
    H: BuildHasher + Send + Sync,
{
    fn update<R>(&self, key: &K, f: impl FnOnce(&mut Option<Bucket>) -> R) -> LimitResult<R> {
        let (out, inserted) = {
            let mut map = self.shard(key).lock();
            let mut slot = map.get(key).copied();
            let tracked = slot.is_some();
            let out = f(&mut slot);

            match slot {
                Some(bucket) => {
                    map.insert(key.clone(), bucket);
                    (out, !tracked)
                }
                None => {
                    if map.remove(key).is_some() {
                        self.tracked.fetch_sub(1, Ordering::AcqRel);
                    }
                    (out, false)
                }
            }
        };

        if inserted {
            let tracked = self.tracked.fetch_add(1, Ordering::AcqRel) + 1;
            if self.max_keys.is_some_and(|max| tracked > max) {
                self.evict_oldest(key);
            }
        }
        Ok(out)
    }

    fn peek(&self, key: &K) -> LimitResult<Option<Bucket>> {
        Ok(self.shard(key).lock().get(key).copied())
    }

    fn retain(&self, mut keep: impl FnMut(&Bucket) -> bool) -> LimitResult<usize> {
        let mut removed = 0;
        for shard in self.shards.iter() {
            let mut map = shard.lock();
            let before = map.len();
            map.retain(|_, b| keep(b));
            let dropped = before - map.len();
            self.tracked.fetch_sub(dropped, Ordering::AcqRel);
            removed += dropped;
        }
        Ok(removed)
    }

    fn len(&self) -> usize {
        self.tracked.load(Ordering::Acquire)
    }
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the request is admitted.
    pub allowed: bool,
    /// The limit that was applied.
    pub limit: u32,
    /// Requests still admissible in the current window.
    pub remaining: u32,
    /// When the current window rolls over.
    pub reset_at: Instant,
    /// `reset_at` on the wall clock.
    pub reset_at_wall: DateTime<Utc>,
}

impl Decision {
    /// Time from `now` until the window rolls over.
    pub fn retry_after(&self, now: Instant) -> Duration {
        self.reset_at.saturating_duration_since(now)
    }
}

/// A fixed-window rate limiter keyed by `K`.
///
/// ```
/// use std::time::Duration;
/// use tempokv::RateLimiter;
///
/// let limiter: RateLimiter<&str> = RateLimiter::new();
/// let window = Duration::from_secs(60);
/// assert!(limiter.allow(&"10.0.0.1", 2, window).unwrap());
/// assert!(limiter.allow(&"10.0.0.1", 2, window).unwrap());
/// assert!(!limiter.allow(&"10.0.0.1", 2, window).unwrap());
/// assert!(limiter.allow(&"10.0.0.2", 2, window).unwrap());
/// ```
pub struct RateLimiter<K, C = SystemClock, S = ShardedStore<K>> {
    store: S,
    clock: C,
    _key: PhantomData<fn(&K)>,
}

impl<K> RateLimiter<K>
where
    K: Hash + Eq + Clone + Send + Sync,
{
    /// Default sharding, unbounded, on the system clock.
    pub fn new() -> Self {
        Self::with_config(&RateLimiterConfig::default())
    }

    /// Sharding and key bound from `config`, on the system clock.
    pub fn with_config(config: &RateLimiterConfig) -> Self {
        Self::with_store(ShardedStore::new(config), SystemClock)
    }
}

impl<K> Default for RateLimiter<K>
where
    K: Hash + Eq + Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

fn validate(limit: u32, window: Duration) -> LimitResult<()> {
    if limit == 0 {
        return Err(LimitError::InvalidLimit);
    }
    if window.is_zero() {
        return Err(LimitError::ZeroWindow);
    }
    Ok(())
}

impl<K, C, S> RateLimiter<K, C, S>
where
    C: Clock,
    S: BucketStore<K>,
{
    /// A limiter over `store` on `clock`.
    pub fn with_store(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            _key: PhantomData,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Count one request for `key` and report the outcome.
    ///
    /// Fails only on invalid arguments; a store failure yields an allowing
    /// decision with the full limit remaining.
    pub fn check(&self, key: &K, limit: u32, window: Duration) -> LimitResult<Decision> {
        validate(limit, window)?;
        let now = self.clock.now();

        let outcome = self.store.update(key, |slot| {
            let bucket = slot.get_or_insert_with(|| Bucket::fresh(now));
            if bucket.rolled_over(now, window) {
                *bucket = Bucket::fresh(now);
            }
            let allowed = bucket.count < limit;
            if allowed {
                bucket.count += 1;
            }
            (allowed, bucket.count, bucket.window_start)
        });

        let (allowed, count, window_start) = match outcome {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "rate limiter store unavailable, failing open");
                (true, 0, now)
            }
        };

        let reset_at = instant_after(window_start, window);
        Ok(Decision {
            allowed,
            limit,
            remaining: limit.saturating_sub(count),
            reset_at,
            reset_at_wall: self.clock.wall_at(reset_at),
        })
    }

    /// Count one request for `key`; `true` if it is admitted.
    pub fn allow(&self, key: &K, limit: u32, window: Duration) -> LimitResult<bool> {
        self.check(key, limit, window).map(|d| d.allowed)
    }

    /// Requests still admissible for `key` in its current window, without
    /// counting one.
    pub fn remaining(&self, key: &K, limit: u32, window: Duration) -> LimitResult<u32> {
        validate(limit, window)?;
        let now = self.clock.now();
        match self.store.peek(key) {
            Ok(Some(b)) if !b.rolled_over(now, window) => Ok(limit.saturating_sub(b.count)),
            Ok(_) => Ok(limit),
            Err(e) => {
                warn!(error = %e, "rate limiter store unavailable, reporting full limit");
                Ok(limit)
            }
        }
    }

    /// Forget `key`, so its next request opens a fresh window.
    pub fn reset(&self, key: &K) {
        if let Err(e) = self.store.update(key, |slot| *slot = None) {
            warn!(error = %e, "rate limiter store unavailable, reset skipped");
        }
    }

    /// Drop buckets whose window of length `window` has elapsed. Returns how
    /// many were dropped.
    pub fn sweep_expired(&self, window: Duration) -> usize {
        let now = self.clock.now();
        match self.store.retain(|b| !b.rolled_over(now, window)) {
            Ok(removed) => removed,
            Err(e) => {
                warn!(error = %e, "rate limiter sweep failed");
                0
            }
        }
    }

    /// Number of tracked keys.
    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}
