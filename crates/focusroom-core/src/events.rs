use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerMode;

/// Every state change in the system produces an Event.
/// Display surfaces drain them from the driver; `StateSnapshot` is the
/// polling view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_secs: u64,
        /// Whole minutes credited to the ledger, if any.
        credited_min: Option<u32>,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        mode: TimerMode,
        next_mode: TimerMode,
        sessions_completed: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    PresetChanged {
        preset_id: String,
        at: DateTime<Utc>,
    },
    CustomDurationChanged {
        mode: TimerMode,
        minutes: u32,
        at: DateTime<Utc>,
    },
    SessionRecorded {
        session_id: String,
        duration_min: u32,
        streak_days: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        running: bool,
        remaining_secs: u64,
        total_secs: u64,
        sessions_completed: u32,
        preset_id: String,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}
