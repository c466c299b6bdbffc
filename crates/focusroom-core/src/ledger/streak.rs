//! Study-streak accounting on calendar days.

use chrono::{DateTime, Utc};

use super::settings::StreakSettings;
use crate::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Already studied today.
    Unchanged,
    /// Studied yesterday; streak grew by one.
    Extended,
    /// First study day, or a gap of two or more days.
    Restarted,
}

impl StreakChange {
    pub fn is_changed(self) -> bool {
        self != StreakChange::Unchanged
    }
}

/// Count a study session at `now` toward the streak.
///
/// Days are calendar dates in the clock's time zone, not 24-hour windows.
pub fn register_study(streak: &mut StreakSettings, now: DateTime<Utc>, clock: &dyn Clock) -> StreakChange {
    let today = clock.local_date(now);
    let last = streak.last_study_date.map(|d| clock.local_date(d));

    if last == Some(today) {
        return StreakChange::Unchanged;
    }

    let change = match (last, today.pred_opt()) {
        (Some(last), Some(yesterday)) if last == yesterday => {
            streak.current_streak_days = streak.current_streak_days.saturating_add(1);
            StreakChange::Extended
        }
        _ => {
            streak.current_streak_days = 1;
            StreakChange::Restarted
        }
    };
    streak.last_study_date = Some(now);
    change
}

/// The streak as it stands on `now`'s date: a streak whose last study day is
/// before yesterday has lapsed and reads as zero.
pub fn effective_streak(streak: &StreakSettings, now: DateTime<Utc>, clock: &dyn Clock) -> u32 {
    let Some(last) = streak.last_study_date.map(|d| clock.local_date(d)) else {
        return 0;
    };
    let today = clock.local_date(now);
    if last == today || Some(last) == today.pred_opt() {
        streak.current_streak_days
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn clock_at(y: i32, m: u32, d: u32, h: u32) -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
    }

    #[test]
    fn first_session_starts_streak() {
        let clock = clock_at(2024, 6, 10, 9);
        let mut s = StreakSettings::default();
        assert_eq!(register_study(&mut s, clock.now(), &clock), StreakChange::Restarted);
        assert_eq!(s.current_streak_days, 1);
        assert_eq!(s.last_study_date, Some(clock.now()));
    }

    #[test]
    fn same_day_is_idempotent() {
        let clock = clock_at(2024, 6, 10, 9);
        let mut s = StreakSettings::default();
        register_study(&mut s, clock.now(), &clock);
        let first = s.clone();
        clock.advance(Duration::hours(12));
        assert_eq!(register_study(&mut s, clock.now(), &clock), StreakChange::Unchanged);
        assert_eq!(s, first);
    }

    #[test]
    fn consecutive_day_extends() {
        let clock = clock_at(2024, 6, 10, 23);
        let mut s = StreakSettings {
            current_streak_days: 4,
            last_study_date: Some(clock.now()),
            ..StreakSettings::default()
        };
        // Two hours later is already the next calendar day.
        clock.advance(Duration::hours(2));
        assert_eq!(register_study(&mut s, clock.now(), &clock), StreakChange::Extended);
        assert_eq!(s.current_streak_days, 5);
    }

    #[test]
    fn gap_of_two_days_restarts() {
        let clock = clock_at(2024, 6, 10, 8);
        let mut s = StreakSettings {
            current_streak_days: 9,
            last_study_date: Some(clock.now()),
            ..StreakSettings::default()
        };
        clock.advance(Duration::days(2));
        assert_eq!(register_study(&mut s, clock.now(), &clock), StreakChange::Restarted);
        assert_eq!(s.current_streak_days, 1);
    }

    #[test]
    fn time_zone_decides_the_day() {
        // 22:00 UTC on the 10th and 01:00 UTC on the 11th: different UTC days,
        // but the same day at UTC-5.
        let start = Utc.with_ymd_and_hms(2024, 6, 10, 22, 0, 0).unwrap();
        let clock = ManualClock::with_offset(start, FixedOffset::west_opt(5 * 3600).unwrap());
        let mut s = StreakSettings::default();
        register_study(&mut s, clock.now(), &clock);
        clock.advance(Duration::hours(3));
        assert_eq!(register_study(&mut s, clock.now(), &clock), StreakChange::Unchanged);
    }

    #[test]
    fn future_last_date_restarts() {
        let clock = clock_at(2024, 6, 10, 8);
        let mut s = StreakSettings {
            current_streak_days: 3,
            last_study_date: Some(clock.now() + Duration::days(5)),
            ..StreakSettings::default()
        };
        assert_eq!(register_study(&mut s, clock.now(), &clock), StreakChange::Restarted);
        assert_eq!(s.last_study_date, Some(clock.now()));
    }

    #[test]
    fn lapsed_streak_reads_as_zero() {
        let clock = clock_at(2024, 6, 10, 8);
        let s = StreakSettings {
            current_streak_days: 6,
            last_study_date: Some(clock.now()),
            ..StreakSettings::default()
        };
        assert_eq!(effective_streak(&s, clock.now() + Duration::days(1), &clock), 6);
        assert_eq!(effective_streak(&s, clock.now() + Duration::days(2), &clock), 0);
        assert_eq!(effective_streak(&StreakSettings::default(), clock.now(), &clock), 0);
    }
}
