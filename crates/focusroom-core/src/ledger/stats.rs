//! Aggregates over session records for dashboards and statistics.
//!
//! All functions are pure over a slice of records; calendar days come from
//! the supplied clock's time zone.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::record::SessionRecord;
use crate::clock::Clock;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsRange {
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
    All,
}

impl StatsRange {
    /// Number of days covered, `None` for all time.
    pub fn days(self) -> Option<i64> {
        match self {
            StatsRange::Week => Some(7),
            StatsRange::Month => Some(30),
            StatsRange::All => None,
        }
    }

    /// Days shown in the per-day breakdown.
    pub fn chart_days(self) -> u32 {
        match self {
            StatsRange::Week => 7,
            StatsRange::Month => 30,
            StatsRange::All => 90,
        }
    }
}

impl std::str::FromStr for StatsRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(StatsRange::Week),
            "month" => Ok(StatsRange::Month),
            "all" => Ok(StatsRange::All),
            other => Err(ValidationError::UnknownRange(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMinutes {
    pub date: NaiveDate,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub range: StatsRange,
    pub total_minutes: u32,
    /// Rounded to one decimal.
    pub total_hours: f64,
    pub sessions: usize,
    /// Whole minutes, rounded.
    pub average_minutes: u32,
    pub daily: Vec<DailyMinutes>,
}

pub fn total_minutes<'a>(records: impl IntoIterator<Item = &'a SessionRecord>) -> u32 {
    records
        .into_iter()
        .fold(0u32, |acc, r| acc.saturating_add(r.duration_minutes))
}

/// Minutes logged on `now`'s calendar day.
pub fn today_minutes(records: &[SessionRecord], now: DateTime<Utc>, clock: &dyn Clock) -> u32 {
    let today = clock.local_date(now);
    total_minutes(
        records
            .iter()
            .filter(|r| clock.local_date(r.occurred_at) == today),
    )
}

/// One entry per calendar day, oldest first, ending today. Days without
/// sessions are zero.
pub fn daily_breakdown(
    records: &[SessionRecord],
    now: DateTime<Utc>,
    days: u32,
    clock: &dyn Clock,
) -> Vec<DailyMinutes> {
    let today = clock.local_date(now);
    let mut buckets: BTreeMap<NaiveDate, u32> = (0..i64::from(days))
        .filter_map(|back| today.checked_sub_signed(Duration::days(back)))
        .map(|d| (d, 0))
        .collect();

    for r in records {
        if let Some(minutes) = buckets.get_mut(&clock.local_date(r.occurred_at)) {
            *minutes = minutes.saturating_add(r.duration_minutes);
        }
    }

    buckets
        .into_iter()
        .map(|(date, minutes)| DailyMinutes { date, minutes })
        .collect()
}

/// The last seven calendar days.
pub fn weekly(records: &[SessionRecord], now: DateTime<Utc>, clock: &dyn Clock) -> Vec<DailyMinutes> {
    daily_breakdown(records, now, 7, clock)
}

/// Totals over a rolling window ending at `now`.
pub fn summarize(
    records: &[SessionRecord],
    range: StatsRange,
    now: DateTime<Utc>,
    clock: &dyn Clock,
) -> RangeSummary {
    let cutoff = range.days().map(|d| now - Duration::days(d));
    let in_range: Vec<&SessionRecord> = records
        .iter()
        .filter(|r| cutoff.map_or(true, |c| r.occurred_at >= c))
        .collect();

    let total = total_minutes(in_range.iter().copied());
    let sessions = in_range.len();
    let average_minutes = if sessions == 0 {
        0
    } else {
        (f64::from(total) / sessions as f64).round() as u32
    };

    RangeSummary {
        range,
        total_minutes: total,
        total_hours: (f64::from(total) / 6.0).round() / 10.0,
        sessions,
        average_minutes,
        daily: daily_breakdown(records, now, range.chart_days(), clock),
    }
}

/// The `n` most recent records, newest first.
pub fn recent(records: &[SessionRecord], n: usize) -> Vec<SessionRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    sorted.truncate(n);
    sorted
}

/// Percentage of the daily goal reached, capped at 100.
pub fn goal_progress_pct(today_minutes: u32, goal_minutes: u32) -> u32 {
    if goal_minutes == 0 {
        return 100;
    }
    let pct = (f64::from(today_minutes) / f64::from(goal_minutes) * 100.0).round();
    (pct as u32).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::timer::TimerMode;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap()
    }

    fn rec(days_ago: i64, hour: u32, minutes: u32) -> SessionRecord {
        let day = now().date_naive() - Duration::days(days_ago);
        let at = Utc.from_utc_datetime(&day.and_hms_opt(hour, 0, 0).unwrap());
        SessionRecord::new("u1", at, minutes, TimerMode::Work, "classic")
    }

    fn sample() -> Vec<SessionRecord> {
        vec![
            rec(0, 9, 25),
            rec(0, 11, 25),
            rec(1, 10, 50),
            rec(6, 10, 15),
            rec(7, 10, 40),
            rec(40, 10, 30),
        ]
    }

    #[test]
    fn today_counts_calendar_day_only() {
        let clock = ManualClock::new(now());
        assert_eq!(today_minutes(&sample(), now(), &clock), 50);
    }

    #[test]
    fn weekly_is_zero_filled_oldest_first() {
        let clock = ManualClock::new(now());
        let week = weekly(&sample(), now(), &clock);
        let minutes: Vec<u32> = week.iter().map(|d| d.minutes).collect();
        assert_eq!(minutes, [15, 0, 0, 0, 0, 50, 50]);
        assert_eq!(week[6].date, now().date_naive());
    }

    #[test]
    fn summaries_use_rolling_windows() {
        let clock = ManualClock::new(now());
        let week = summarize(&sample(), StatsRange::Week, now(), &clock);
        // rec(7, 10, ..) is 7 days and 8 hours ago: outside the window.
        assert_eq!(week.total_minutes, 115);
        assert_eq!(week.sessions, 4);
        assert_eq!(week.average_minutes, 29);
        assert!((week.total_hours - 1.9).abs() < 1e-9);
        assert_eq!(week.daily.len(), 7);

        let month = summarize(&sample(), StatsRange::Month, now(), &clock);
        assert_eq!(month.total_minutes, 155);

        let all = summarize(&sample(), StatsRange::All, now(), &clock);
        assert_eq!(all.total_minutes, 185);
        assert_eq!(all.sessions, 6);
        assert_eq!(all.daily.len(), 90);
    }

    #[test]
    fn empty_summary() {
        let clock = ManualClock::new(now());
        let s = summarize(&[], StatsRange::Week, now(), &clock);
        assert_eq!(s.total_minutes, 0);
        assert_eq!(s.average_minutes, 0);
        assert_eq!(s.total_hours, 0.0);
    }

    #[test]
    fn recent_is_newest_first() {
        let r = recent(&sample(), 2);
        assert_eq!(r.len(), 2);
        assert!(r[0].occurred_at > r[1].occurred_at);
        assert_eq!(r[0].occurred_at.date_naive(), now().date_naive());
    }

    #[test]
    fn goal_progress_is_capped() {
        assert_eq!(goal_progress_pct(60, 120), 50);
        assert_eq!(goal_progress_pct(200, 120), 100);
        assert_eq!(goal_progress_pct(1, 120), 1);
        assert_eq!(goal_progress_pct(0, 120), 0);
    }

    #[test]
    fn range_parses() {
        assert_eq!("month".parse::<StatsRange>().unwrap(), StatsRange::Month);
        assert!("year".parse::<StatsRange>().is_err());
    }
}
