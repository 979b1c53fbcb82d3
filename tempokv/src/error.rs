//! Error types for the caches and the rate limiter.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by cache operations.
///
/// A missing or expired key is never an error; lookups report it as `None`.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A TTL of zero would expire the entry before it could be read.
    #[error("ttl must be positive")]
    ZeroTtl,

    /// A configured capacity of zero could never admit an entry.
    #[error("capacity must be positive")]
    ZeroCapacity,

    /// The key cannot be used as a file name.
    #[error("invalid cache key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A filesystem operation failed.
    #[error("cache i/o on {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An entry could not be serialized.
    #[error("cache entry encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors returned by rate limiter operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitError {
    /// A limit of zero refuses everything.
    #[error("limit must be positive")]
    InvalidLimit,

    /// The window must have a positive length.
    #[error("window must be positive")]
    ZeroWindow,

    /// The bucket store could not serve the request.
    #[error("bucket store unavailable: {0}")]
    Store(String),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Result alias for rate limiter operations.
pub type LimitResult<T> = Result<T, LimitError>;
