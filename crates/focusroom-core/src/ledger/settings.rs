use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Preset;

pub const DEFAULT_DAILY_GOAL_MIN: u32 = 120;
pub const MAX_DAILY_GOAL_MIN: u32 = 24 * 60;

/// Streak bookkeeping. Only the ledger's streak step mutates the streak
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSettings {
    #[serde(default = "default_daily_goal")]
    pub daily_goal_minutes: u32,
    #[serde(default)]
    pub current_streak_days: u32,
    #[serde(default)]
    pub last_study_date: Option<DateTime<Utc>>,
}

fn default_daily_goal() -> u32 {
    DEFAULT_DAILY_GOAL_MIN
}

impl Default for StreakSettings {
    fn default() -> Self {
        Self {
            daily_goal_minutes: DEFAULT_DAILY_GOAL_MIN,
            current_streak_days: 0,
            last_study_date: None,
        }
    }
}

/// The per-user settings document, stored under the user's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: String,
    #[serde(flatten)]
    pub streak: StreakSettings,
    /// User-defined presets only; built-ins are not stored.
    #[serde(default)]
    pub presets: Vec<Preset>,
}

impl UserSettings {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            streak: StreakSettings::default(),
            presets: Vec::new(),
        }
    }
}
