//! Wall-clock abstraction.
//!
//! The timer engine never samples time itself; the driver reads a [`Clock`]
//! and passes `now` into every transition. Calendar-day arithmetic (streaks,
//! daily aggregates) goes through [`Clock::local_date`] so the user's time
//! zone decides where a day starts.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date of `at` in the clock's time zone.
    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&Local).date_naive()
    }

    fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }
}

/// System time in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock with a fixed UTC offset.
///
/// Clones share the same instant, so a test can hand one clone to the driver
/// and advance another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
    offset: FixedOffset,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::with_offset(start, Utc.fix())
    }

    pub fn with_offset(start: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
            offset,
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.lock() = at;
    }

    /// Move the clock by `by`. Negative durations simulate clock anomalies.
    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid instant.
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_clones_share_time() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let handle = clock.clone();
        handle.advance_secs(90);
        assert_eq!(clock.now(), start + Duration::seconds(90));
    }

    #[test]
    fn local_date_respects_offset() {
        // 23:30 UTC is already the next day at UTC+2.
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        let east = ManualClock::with_offset(at, FixedOffset::east_opt(2 * 3600).unwrap());
        let utc = ManualClock::new(at);
        assert_eq!(east.today(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(utc.today(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
