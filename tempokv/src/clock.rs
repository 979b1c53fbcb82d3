//! Time sources.
//!
//! Expiry and windows are measured on the monotonic clock (`Instant`). The
//! wall clock is only used where a timestamp leaves the process: disk entries
//! and rate-limit reset headers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// A source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Monotonic now.
    fn now(&self) -> Instant;

    /// Wall-clock now.
    fn wall(&self) -> DateTime<Utc>;

    /// Wall-clock time corresponding to the monotonic instant `at`.
    fn wall_at(&self, at: Instant) -> DateTime<Utc> {
        let now = self.now();
        let wall = self.wall();
        if at >= now {
            wall_after(wall, at - now)
        } else {
            wall.checked_sub_signed(to_chrono(now - at)).unwrap_or(DateTime::<Utc>::MIN_UTC)
        }
    }
}

/// Longest lifetime a deadline can be set to; longer TTLs and windows are
/// clamped to it.
pub const MAX_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d.min(MAX_LIFETIME)).unwrap_or(chrono::Duration::MAX)
}

/// `at + d`, with `d` clamped to [`MAX_LIFETIME`] and further halved until
/// the sum is representable.
pub(crate) fn instant_after(at: Instant, d: Duration) -> Instant {
    let mut d = d.min(MAX_LIFETIME);
    loop {
        if let Some(t) = at.checked_add(d) {
            return t;
        }
        d /= 2;
    }
}

/// `wall + d`, with `d` clamped to [`MAX_LIFETIME`].
pub(crate) fn wall_after(wall: DateTime<Utc>, d: Duration) -> DateTime<Utc> {
    wall.checked_add_signed(to_chrono(d)).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// The operating system clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give another
/// to the component under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    base_wall: DateTime<Utc>,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Start at the current system time.
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Start with the wall clock reading `wall`.
    pub fn starting_at(wall: DateTime<Utc>) -> Self {
        Self {
            base: Instant::now(),
            base_wall: wall,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move time forward by `d`.
    pub fn advance(&self, d: Duration) {
        *self.offset.lock() += d;
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }

    fn wall(&self) -> DateTime<Utc> {
        wall_after(self.base_wall, *self.offset.lock())
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn wall(&self) -> DateTime<Utc> {
        (**self).wall()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advances_both() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start);
        let t0 = clock.now();

        let shared = clock.clone();
        shared.advance(Duration::from_millis(1_500));

        assert_eq!(clock.now() - t0, Duration::from_millis(1_500));
        assert_eq!(clock.wall(), start + chrono::Duration::milliseconds(1_500));
        assert_eq!(clock.elapsed(), Duration::from_millis(1_500));
    }

    #[test]
    fn test_wall_at_maps_instants() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start);
        let later = clock.now() + Duration::from_secs(60);
        assert_eq!(clock.wall_at(later), start + chrono::Duration::seconds(60));

        clock.advance(Duration::from_secs(120));
        assert_eq!(clock.wall_at(later), start + chrono::Duration::seconds(60));
    }

    #[test]
    fn test_deadlines_clamp_instead_of_overflowing() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start);
        let now = clock.now();

        assert_eq!(instant_after(now, Duration::from_secs(5)), now + Duration::from_secs(5));
        let far = instant_after(now, Duration::MAX);
        assert!(far > now);
        assert!(far - now <= MAX_LIFETIME);

        let wall = wall_after(start, Duration::MAX);
        assert_eq!(wall, start + chrono::Duration::from_std(MAX_LIFETIME).unwrap());
        assert_eq!(clock.wall_at(far), wall_after(start, far - now));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let a = SystemClock.now();
        let b = SystemClock.now();
        assert!(b >= a);
    }
}
