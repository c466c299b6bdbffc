use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::TimerMode;

/// A logged interval of work time, complete or partial. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub occurred_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub mode: TimerMode,
    pub preset_id: String,
}

impl SessionRecord {
    pub fn new(
        user_id: &str,
        occurred_at: DateTime<Utc>,
        duration_minutes: u32,
        mode: TimerMode,
        preset_id: &str,
    ) -> Self {
        Self {
            id: format!("session_{}", Uuid::new_v4().simple()),
            user_id: user_id.to_string(),
            occurred_at,
            duration_minutes,
            mode,
            preset_id: preset_id.to_string(),
        }
    }
}
