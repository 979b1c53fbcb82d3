//! Error type shared by the containers.
//!
//! Lookups never fail: a missing key is `None` or `false`. Errors are reserved
//! for malformed arguments.

use thiserror::Error;

/// Errors returned by container operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An element index was outside `0..len`.
    #[error("index {index} out of range for length {len}")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// Number of elements in the container.
        len: usize,
    },

    /// An inclusive range `[l, r]` had `l > r` or ended past the last element.
    #[error("invalid range [{l}, {r}] for length {len}")]
    InvalidRange {
        /// Left bound (inclusive).
        l: usize,
        /// Right bound (inclusive).
        r: usize,
        /// Number of elements in the container.
        len: usize,
    },

    /// A pattern handed to the Aho–Corasick builder was empty.
    #[error("pattern {id} is empty")]
    EmptyPattern {
        /// Position of the pattern in insertion order.
        id: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[inline]
pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::OutOfRange { index, len })
    }
}

#[inline]
pub(crate) fn check_range(l: usize, r: usize, len: usize) -> Result<()> {
    if l <= r && r < len {
        Ok(())
    } else {
        Err(Error::InvalidRange { l, r, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = Error::OutOfRange { index: 7, len: 3 };
        assert_eq!(e.to_string(), "index 7 out of range for length 3");
        let e = Error::InvalidRange { l: 4, r: 2, len: 6 };
        assert_eq!(e.to_string(), "invalid range [4, 2] for length 6");
    }

    #[test]
    fn test_checks() {
        assert!(check_index(0, 1).is_ok());
        assert_eq!(check_index(1, 1), Err(Error::OutOfRange { index: 1, len: 1 }));
        assert!(check_range(2, 2, 3).is_ok());
        assert!(check_range(3, 2, 3).is_err());
        assert!(check_range(0, 3, 3).is_err());
    }
}
