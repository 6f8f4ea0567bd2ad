//! Interval clock
//!
//! Minute-grid arithmetic relative to a fixed epoch. Every allocation instant
//! of a property schedule lies on this grid.

use crate::constants::ALLOCATION_INTERVAL_SECS;
use chrono::{DateTime, Duration, Utc};

/// Largest instant `epoch + k·interval` that is `<= t`
pub fn preceding_boundary(
    t: DateTime<Utc>,
    epoch: DateTime<Utc>,
    interval: Duration,
) -> DateTime<Utc> {
    let step = interval.num_seconds();
    assert!(step > 0, "interval must be positive");

    let elapsed = t.timestamp() - epoch.timestamp();
    epoch + Duration::seconds(elapsed.div_euclid(step) * step)
}

/// Smallest instant `epoch + k·interval` that is strictly `> t`
pub fn next_boundary(t: DateTime<Utc>, epoch: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    preceding_boundary(t, epoch, interval) + interval
}

/// Fixed epoch plus interval length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalClock {
    epoch: DateTime<Utc>,
    interval: Duration,
}

impl IntervalClock {
    pub fn new(epoch: DateTime<Utc>, interval: Duration) -> Self {
        assert!(interval.num_seconds() > 0, "interval must be positive");
        Self { epoch, interval }
    }

    /// The chain clock: Unix epoch, one-minute grid
    pub fn chain() -> Self {
        Self::new(DateTime::UNIX_EPOCH, Duration::seconds(ALLOCATION_INTERVAL_SECS))
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn interval_secs(&self) -> i64 {
        self.interval.num_seconds()
    }

    pub fn next_boundary(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        next_boundary(t, self.epoch, self.interval)
    }

    pub fn preceding_boundary(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        preceding_boundary(t, self.epoch, self.interval)
    }

    pub fn is_aligned(&self, t: DateTime<Utc>) -> bool {
        self.preceding_boundary(t) == t
    }

    /// Whole intervals in `[from, to)`, zero when `to <= from`
    pub fn intervals_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
        let secs = (to - from).num_seconds();
        if secs <= 0 {
            return 0;
        }
        (secs / self.interval_secs()) as u64
    }
}

impl Default for IntervalClock {
    fn default() -> Self {
        Self::chain()
    }
}
