//! Background sweep of expired cache entries.
//!
//! Complements lazy expiry on read: entries nobody asks for again are still
//! dropped within one interval of expiring. The task never changes what a
//! reader observes, only when memory or disk space is reclaimed.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use algokit::OrderedMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{ExpiryKey, TtlCache};
use crate::clock::Clock;
use crate::disk::DiskCache;
use crate::error::CacheResult;

/// A cache that can drop its expired entries on demand.
pub trait Sweep: Send + Sync + 'static {
    /// Remove expired entries, returning how many were dropped.
    fn sweep(&self) -> CacheResult<usize>;
}

impl<K, V, C, M> Sweep for TtlCache<K, V, C, M>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: Clock + 'static,
    M: OrderedMap<Key = ExpiryKey, Value = K> + Send + Sync + 'static,
{
    fn sweep(&self) -> CacheResult<usize> {
        Ok(self.purge_expired())
    }
}

impl<V, C> Sweep for DiskCache<V, C>
where
    V: Serialize + DeserializeOwned + 'static,
    C: Clock + 'static,
{
    fn sweep(&self) -> CacheResult<usize> {
        self.purge_expired()
    }
}

/// Handle to a running sweeper.
///
/// Dropping the handle does not stop the task; call [`stop`](Self::stop) or
/// cancel the token.
#[derive(Debug)]
pub struct SweeperHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Token that stops the task when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the task and wait for it to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "cache sweeper task ended abnormally");
        }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn a task that sweeps `cache` every `every`.
///
/// Must be called from within a tokio runtime. Each sweep runs on the blocking
/// pool. Missed ticks are skipped, so a slow sweep never causes a burst of
/// catch-up sweeps.
pub fn spawn_sweeper<S: Sweep>(cache: Arc<S>, every: Duration) -> SweeperHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_sweeper(cache, every, cancel.clone()));
    SweeperHandle { cancel, task }
}

async fn run_sweeper<S: Sweep>(cache: Arc<S>, every: Duration, cancel: CancellationToken) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; there is nothing to sweep yet.
    ticker.tick().await;

    info!(interval_ms = every.as_millis() as u64, "cache sweeper started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("cache sweeper shutting down");
                break;
            }
            _ = ticker.tick() => {
                // Sweeps take locks and may touch the filesystem.
                let target = Arc::clone(&cache);
                match tokio::task::spawn_blocking(move || target.sweep()).await {
                    Ok(Ok(0)) => debug!("cache sweep: nothing expired"),
                    Ok(Ok(swept)) => info!(swept, "cache sweep completed"),
                    Ok(Err(e)) => warn!(error = %e, "cache sweep failed"),
                    Err(e) => warn!(error = %e, "cache sweep task panicked"),
                }
            }
        }
    }
}
