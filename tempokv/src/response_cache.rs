//! Cache for model completions.
//!
//! A completion is identified by the provider, the model and the exact
//! prompt. Prompts are large, so entries are keyed by a BLAKE3 digest of the
//! three rather than by the prompt itself.

use std::time::Duration;

use tracing::trace;

use crate::cache::TtlCache;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::store::CacheStats;

/// Capacity used when the config leaves the cache unbounded.
pub const DEFAULT_RESPONSE_CAPACITY: usize = 1_000;

/// Digest identifying a `(provider, model, prompt)` triple, as lowercase hex.
///
/// Fields are length-prefixed so that no two distinct triples share an
/// encoding.
pub fn response_key(provider: &str, model: &str, prompt: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in [provider, model, prompt] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// A bounded TTL cache of completions.
pub struct ResponseCache<V = String, C = SystemClock> {
    cache: TtlCache<String, V, C>,
}

impl<V: Clone> ResponseCache<V> {
    /// A cache on the system clock. An unbounded config is capped at
    /// [`DEFAULT_RESPONSE_CAPACITY`].
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<V: Clone, C: Clock> ResponseCache<V, C> {
    /// A cache on `clock`.
    pub fn with_clock(mut config: CacheConfig, clock: C) -> CacheResult<Self> {
        config.capacity.get_or_insert(DEFAULT_RESPONSE_CAPACITY);
        Ok(Self {
            cache: TtlCache::with_clock(config, clock)?,
        })
    }

    /// The cached completion, if any.
    pub fn get(&self, provider: &str, model: &str, prompt: &str) -> Option<V> {
        let key = response_key(provider, model, prompt);
        let found = self.cache.get(key.as_str());
        trace!(provider, model, hit = found.is_some(), "response cache lookup");
        found
    }

    /// Cache `response` with the default TTL.
    pub fn put(&self, provider: &str, model: &str, prompt: &str, response: V) -> CacheResult<()> {
        self.cache.set(response_key(provider, model, prompt), response)
    }

    /// Cache `response` for `ttl`.
    pub fn put_with_ttl(
        &self,
        provider: &str,
        model: &str,
        prompt: &str,
        response: V,
        ttl: Duration,
    ) -> CacheResult<()> {
        self.cache.set_with_ttl(response_key(provider, model, prompt), response, ttl)
    }

    /// Forget the completion for a triple. Returns whether one was cached.
    pub fn invalidate(&self, provider: &str, model: &str, prompt: &str) -> bool {
        self.cache
            .delete(response_key(provider, model, prompt).as_str())
            .is_some()
    }

    /// The underlying cache, e.g. to hand to a sweeper.
    pub fn inner(&self) -> &TtlCache<String, V, C> {
        &self.cache
    }

    /// Size and counters.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
