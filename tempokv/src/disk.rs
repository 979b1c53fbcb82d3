//! On-disk TTL cache, one JSON file per entry.
//!
//! An entry for key `k` lives in `<dir>/k.json`:
//!
//! ```json
//! {"value": ..., "expires_at": "2024-01-01T00:05:00Z"}
//! ```
//!
//! Writes go to `k.tmp` and are renamed into place, so readers never see a
//! torn file. A file that cannot be parsed is treated as a miss and is
//! overwritten by the next `set` of that key.
//!
//! Keys are restricted to `[A-Za-z0-9_.-]`, must be non-empty and must not
//! start with `.`; anything else is rejected rather than escaped.

use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{wall_after, Clock, SystemClock};
use crate::config::DiskCacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::store::{CacheStats, CacheStore, Counters};

const ENTRY_EXT: &str = "json";
const TEMP_EXT: &str = "tmp";

#[derive(Serialize)]
struct EntryRef<'a, V> {
    value: &'a V,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct EntryOwned<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Just the expiry, for scans that do not need the value.
#[derive(Deserialize)]
struct EntryExpiry {
    expires_at: DateTime<Utc>,
}

/// Reject keys that are not safe to use verbatim as a file stem.
pub fn validate_key(key: &str) -> CacheResult<()> {
    let reason = if key.is_empty() {
        "empty"
    } else if key.starts_with('.') {
        "starts with '.'"
    } else if !key
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
    {
        "only [A-Za-z0-9_.-] allowed"
    } else {
        return Ok(());
    };
    Err(CacheError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}

/// A TTL cache persisted as files in one directory.
pub struct DiskCache<V, C = SystemClock> {
    dir: PathBuf,
    default_ttl: Duration,
    capacity: Option<usize>,
    clock: C,
    /// Serialises writers in this process; readers share.
    lock: RwLock<()>,
    counters: Counters,
    _value: PhantomData<fn() -> V>,
}

impl<V> DiskCache<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Open (creating if needed) a cache on the system clock.
    pub fn open(config: DiskCacheConfig) -> CacheResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<V, C> DiskCache<V, C>
where
    V: Serialize + DeserializeOwned,
    C: Clock,
{
    /// Open (creating if needed) a cache on `clock`.
    pub fn with_clock(config: DiskCacheConfig, clock: C) -> CacheResult<Self> {
        if config.default_ttl.is_zero() {
            return Err(CacheError::ZeroTtl);
        }
        if config.capacity == Some(0) {
            return Err(CacheError::ZeroCapacity);
        }
        fs::create_dir_all(&config.dir).map_err(|e| CacheError::io(&config.dir, e))?;

        Ok(Self {
            dir: config.dir,
            default_ttl: config.default_ttl,
            capacity: config.capacity,
            clock,
            lock: RwLock::new(()),
            counters: Counters::default(),
            _value: PhantomData,
        })
    }

    /// Directory holding the entry files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXT}"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{TEMP_EXT}"))
    }

    /// Raw file contents, `None` if the file does not exist.
    fn read_file(path: &Path) -> CacheResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Remove `path`; `false` if it was already gone.
    fn remove_file(path: &Path) -> CacheResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// The value for `key` if present, parseable and unexpired.
    pub fn get(&self, key: &str) -> CacheResult<Option<V>> {
        validate_key(key)?;
        let path = self.entry_path(key);

        let entry = {
            let _read = self.lock.read();
            let Some(bytes) = Self::read_file(&path)? else {
                self.counters.miss();
                return Ok(None);
            };
            match serde_json::from_slice::<EntryOwned<V>>(&bytes) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(key, error = %e, "unreadable disk cache entry, treating as miss");
                    self.counters.miss();
                    return Ok(None);
                }
            }
        };

        let now = self.clock.wall();
        if now < entry.expires_at {
            self.counters.hit();
            return Ok(Some(entry.value));
        }

        let _write = self.lock.write();
        // A writer may have refreshed the entry since we read it.
        let still_expired = match Self::read_file(&path)? {
            Some(bytes) => serde_json::from_slice::<EntryExpiry>(&bytes)
                .map_or(true, |e| now >= e.expires_at),
            None => false,
        };
        if still_expired && Self::remove_file(&path)? {
            self.counters.expired(1);
        }
        self.counters.miss();
        Ok(None)
    }

    /// Store with the default TTL.
    pub fn set(&self, key: &str, value: &V) -> CacheResult<()> {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    /// Store `value`, expiring `ttl` from now.
    pub fn set_with_ttl(&self, key: &str, value: &V, ttl: Duration) -> CacheResult<()> {
        if ttl.is_zero() {
            return Err(CacheError::ZeroTtl);
        }
        validate_key(key)?;

        let expires_at = wall_after(self.clock.wall(), ttl);
        let bytes = serde_json::to_vec(&EntryRef { value, expires_at })?;
        let path = self.entry_path(key);

        let _write = self.lock.write();
        if let Some(cap) = self.capacity {
            if !path.exists() {
                self.make_room(cap)?;
            }
        }

        let tmp = self.temp_path(key);
        let written = fs::write(&tmp, &bytes)
            .map_err(|e| CacheError::io(&tmp, e))
            .and_then(|()| fs::rename(&tmp, &path).map_err(|e| CacheError::io(&path, e)));
        if written.is_err() {
            if let Err(e) = Self::remove_file(&tmp) {
                warn!(error = %e, "failed to remove temp file after failed write");
            }
        }
        written
    }

    /// With the write lock held: bring the entry count below `cap`.
    fn make_room(&self, cap: usize) -> CacheResult<()> {
        let mut entries = self.scan()?;
        if entries.len() < cap {
            return Ok(());
        }

        let now = self.clock.wall();
        let mut purged = 0;
        entries.retain(|(path, expires_at)| {
            let dead = expires_at.map_or(true, |t| now >= t);
            if dead {
                match fs::remove_file(path) {
                    Ok(()) => purged += 1,
                    Err(e) => warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to drop expired disk entry"
                    ),
                }
            }
            !dead
        });
        self.counters.expired(purged);

        while entries.len() >= cap {
            let Some(pos) = entries
                .iter()
                .enumerate()
                .min_by_key(|(_, (_, t))| *t)
                .map(|(i, _)| i)
            else {
                break;
            };
            let (path, _) = entries.swap_remove(pos);
            Self::remove_file(&path)?;
            self.counters.evicted(1);
            debug!(
                path = %path.display(),
                capacity = cap,
                "disk cache full, evicted earliest expiry"
            );
        }
        Ok(())
    }

    /// Every entry file with its expiry; `None` for files that do not parse.
    fn scan(&self) -> CacheResult<Vec<(PathBuf, Option<DateTime<Utc>>)>> {
        let mut out = Vec::new();
        for dirent in fs::read_dir(&self.dir).map_err(|e| CacheError::io(&self.dir, e))? {
            let dirent = dirent.map_err(|e| CacheError::io(&self.dir, e))?;
            let path = dirent.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            let Some(bytes) = Self::read_file(&path)? else {
                continue;
            };
            let expires_at = serde_json::from_slice::<EntryExpiry>(&bytes)
                .ok()
                .map(|e| e.expires_at);
            out.push((path, expires_at));
        }
        Ok(out)
    }

    /// Remove `key`. Returns whether a file was present.
    pub fn delete(&self, key: &str) -> CacheResult<bool> {
        validate_key(key)?;
        let _write = self.lock.write();
        Self::remove_file(&self.entry_path(key))
    }

    /// Remove every entry file and any leftover temp files.
    pub fn clear(&self) -> CacheResult<()> {
        let _write = self.lock.write();
        for dirent in fs::read_dir(&self.dir).map_err(|e| CacheError::io(&self.dir, e))? {
            let path = dirent.map_err(|e| CacheError::io(&self.dir, e))?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if ext == Some(ENTRY_EXT) || ext == Some(TEMP_EXT) {
                Self::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Remove expired and unreadable entries. Returns how many were dropped.
    ///
    /// Temp files left by interrupted writes are removed too but not counted.
    pub fn purge_expired(&self) -> CacheResult<usize> {
        let _write = self.lock.write();
        self.remove_temp_files()?;
        let now = self.clock.wall();
        let mut purged = 0;
        for (path, expires_at) in self.scan()? {
            if expires_at.map_or(true, |t| now >= t) && Self::remove_file(&path)? {
                purged += 1;
            }
        }
        if purged > 0 {
            self.counters.expired(purged);
            debug!(purged, dir = %self.dir.display(), "disk cache purged expired entries");
        }
        Ok(purged)
    }

    /// With the write lock held no write is in flight, so every temp file is
    /// stale.
    fn remove_temp_files(&self) -> CacheResult<()> {
        for dirent in fs::read_dir(&self.dir).map_err(|e| CacheError::io(&self.dir, e))? {
            let path = dirent.map_err(|e| CacheError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(TEMP_EXT)
                && Self::remove_file(&path)?
            {
                debug!(path = %path.display(), "removed stale temp file");
            }
        }
        Ok(())
    }

    /// Number of entry files, expired or not.
    pub fn len(&self) -> CacheResult<usize> {
        let _read = self.lock.read();
        let mut n = 0;
        for dirent in fs::read_dir(&self.dir).map_err(|e| CacheError::io(&self.dir, e))? {
            let path = dirent.map_err(|e| CacheError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXT) {
                n += 1;
            }
        }
        Ok(n)
    }

    /// Whether there are no entry files.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Size and counters.
    pub fn stats(&self) -> CacheResult<CacheStats> {
        Ok(self.counters.snapshot(self.len()?, self.default_ttl, self.capacity))
    }
}

impl<V, C> CacheStore<V> for DiskCache<V, C>
where
    V: Serialize + DeserializeOwned,
    C: Clock,
{
    fn get(&self, key: &str) -> CacheResult<Option<V>> {
        DiskCache::get(self, key)
    }

    fn set(&self, key: &str, value: V) -> CacheResult<()> {
        DiskCache::set(self, key, &value)
    }

    fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) -> CacheResult<()> {
        DiskCache::set_with_ttl(self, key, &value, ttl)
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        DiskCache::delete(self, key)
    }

    fn clear(&self) -> CacheResult<()> {
        DiskCache::clear(self)
    }

    fn stats(&self) -> CacheResult<CacheStats> {
        DiskCache::stats(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::check_contract;

    fn open(dir: &Path) -> (DiskCache<String, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let cache = DiskCache::with_clock(DiskCacheConfig::new(dir), clock.clone()).unwrap();
        (cache, clock)
    }

    #[test]
    fn test_contract_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, clock) = open(dir.path());
        check_contract(&cache, |d| clock.advance(d));
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, clock) = open(dir.path());
        cache
            .set_with_ttl("forecast-london", &"rain".to_string(), Duration::from_secs(60))
            .unwrap();

        let raw = fs::read_to_string(dir.path().join("forecast-london.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["value"], "rain");
        let expires_at: DateTime<Utc> = json["expires_at"].as_str().unwrap().parse().unwrap();
        assert_eq!(expires_at, clock.wall() + chrono::Duration::seconds(60));
        assert!(!dir.path().join("forecast-london.tmp").exists());
    }

    #[test]
    fn test_invalid_keys() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, _) = open(dir.path());
        for key in ["", ".hidden", "../escape", "a/b", "sp ace", "naïve"] {
            assert!(
                matches!(cache.get(key), Err(CacheError::InvalidKey { .. })),
                "{key:?} must be rejected"
            );
            assert!(cache.set(key, &"v".to_string()).is_err());
        }
        assert!(validate_key("api.weather_v2-London").is_ok());
    }

    #[test]
    fn test_corrupt_file_is_miss_then_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, _) = open(dir.path());
        fs::write(dir.path().join("k.json"), b"{not json").unwrap();

        assert_eq!(cache.get("k").unwrap(), None);
        cache.set("k", &"fresh".to_string()).unwrap();
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache: DiskCache<Vec<u32>> =
                DiskCache::open(DiskCacheConfig::new(dir.path())).unwrap();
            cache.set("nums", &vec![1, 2, 3]).unwrap();
        }
        let cache: DiskCache<Vec<u32>> =
            DiskCache::open(DiskCacheConfig::new(dir.path())).unwrap();
        assert_eq!(cache.get("nums").unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_unbounded_ttl_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, clock) = open(dir.path());
        cache.set_with_ttl("forever", &"v".to_string(), Duration::MAX).unwrap();

        let raw = fs::read_to_string(dir.path().join("forever.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let expires_at: DateTime<Utc> = json["expires_at"].as_str().unwrap().parse().unwrap();
        assert!(expires_at > clock.wall());

        clock.advance(Duration::from_secs(365 * 24 * 60 * 60));
        assert_eq!(cache.get("forever").unwrap().as_deref(), Some("v"));
        assert_eq!(cache.purge_expired().unwrap(), 0);
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, _) = open(dir.path());
        let blocker = dir.path().join("k.json");
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("inner"), b"x").unwrap();

        assert!(matches!(cache.set("k", &"v".to_string()), Err(CacheError::Io { .. })));
        assert!(!dir.path().join("k.tmp").exists());

        fs::remove_dir_all(&blocker).unwrap();
        cache.set("k", &"v".to_string()).unwrap();
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_capacity_evicts_earliest_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new();
        let cache: DiskCache<String, _> =
            DiskCache::with_clock(DiskCacheConfig::new(dir.path()).with_capacity(2), clock.clone())
                .unwrap();

        cache.set_with_ttl("a", &"1".into(), Duration::from_secs(30)).unwrap();
        cache.set_with_ttl("b", &"2".into(), Duration::from_secs(10)).unwrap();
        cache.set_with_ttl("c", &"3".into(), Duration::from_secs(20)).unwrap();

        assert_eq!(cache.len().unwrap(), 2);
        assert_eq!(cache.get("b").unwrap(), None);
        assert!(cache.get("a").unwrap().is_some());
        assert_eq!(cache.stats().unwrap().evictions, 1);

        // Expired entries make room before anything live is evicted.
        clock.advance(Duration::from_secs(25));
        cache.set("d", &"4".into()).unwrap();
        assert!(cache.get("a").unwrap().is_some());
        assert!(cache.get("d").unwrap().is_some());
        assert_eq!(cache.stats().unwrap().evictions, 1);
    }

    #[test]
    fn test_purge_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, clock) = open(dir.path());
        cache.set_with_ttl("short", &"s".into(), Duration::from_secs(1)).unwrap();
        cache.set_with_ttl("long", &"l".into(), Duration::from_secs(100)).unwrap();
        fs::write(dir.path().join("junk.json"), b"[]").unwrap();
        fs::write(dir.path().join("stale.tmp"), b"partial").unwrap();

        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.purge_expired().unwrap(), 2);
        assert_eq!(cache.len().unwrap(), 1);
        assert!(!dir.path().join("stale.tmp").exists());

        fs::write(dir.path().join("stale.tmp"), b"partial").unwrap();

        cache.clear().unwrap();
        assert!(cache.is_empty().unwrap());
        assert!(!dir.path().join("stale.tmp").exists());
    }
}
