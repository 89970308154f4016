//! Wall-clock abstraction for testability.
//!
//! Status derivation depends on whether a scheduled time is still in the
//! future, so every read asks a [`Clock`] for "now" instead of calling
//! `Utc::now()` directly.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use notifeed_core::time::{Clock, MockClock};
//!
//! let clock = MockClock::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
//! clock.advance(Duration::seconds(30));
//!
//! assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 30).unwrap());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Abstraction over wall-clock time.
///
/// In production, use [`SystemClock`]. In tests, use [`MockClock`] to pin
/// "now" to a known instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock that uses real time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for testing time-dependent code.
///
/// Stores milliseconds since the Unix epoch, so it can be shared across
/// threads and advanced while a feed holds a reference to it.
#[derive(Debug)]
pub struct MockClock {
    millis: AtomicI64,
}

impl Default for MockClock {
    fn default() -> Self {
        Self::at(DateTime::UNIX_EPOCH)
    }
}

impl MockClock {
    /// Creates a mock clock pinned to the given instant.
    #[must_use]
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(instant.timestamp_millis()),
        }
    }

    /// Creates a mock clock that can be shared with a feed.
    #[must_use]
    pub fn shared(instant: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self::at(instant))
    }

    /// Advances the clock by the given duration (negative moves it back).
    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    /// Sets the clock to a specific instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.millis.store(instant.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst))
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        self.as_ref().now()
    }
}

/// Formats `instant` relative to `now`, e.g. `"42s ago"` or `"3h ago"`.
///
/// Each unit is rounded before moving to the next one, so 90 seconds reads
/// as `"2m ago"`. Instants after `now` read as `"in 5m"`.
#[must_use]
pub fn relative_time(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_ms = (now - instant).num_milliseconds();
    let (future, diff_ms) = if diff_ms < 0 {
        (true, -diff_ms)
    } else {
        (false, diff_ms)
    };

    let text = humanize_millis(diff_ms);
    if future {
        format!("in {text}")
    } else {
        format!("{text} ago")
    }
}

fn humanize_millis(ms: i64) -> String {
    let s = div_round(ms, 1000);
    if s < 60 {
        return format!("{s}s");
    }
    let m = div_round(s, 60);
    if m < 60 {
        return format!("{m}m");
    }
    let h = div_round(m, 60);
    if h < 24 {
        return format!("{h}h");
    }
    format!("{}d", div_round(h, 24))
}

/// Rounds half away from zero for non-negative inputs.
const fn div_round(value: i64, divisor: i64) -> i64 {
    (value + divisor / 2) / divisor
}
