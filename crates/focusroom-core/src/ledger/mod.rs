//! Session ledger: appends session records and keeps the study streak.
//!
//! Every settings update re-reads the user's settings document before
//! writing it back. When a store write fails nothing is rolled back: the
//! failure is handed back to the caller.

mod record;
pub mod stats;
mod settings;
mod streak;

pub use record::SessionRecord;
pub use settings::{StreakSettings, UserSettings, DEFAULT_DAILY_GOAL_MIN, MAX_DAILY_GOAL_MIN};
pub use stats::{DailyMinutes, RangeSummary, StatsRange};
pub use streak::{effective_streak, register_study, StreakChange};

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CoreError, Result, StoreError, ValidationError};
use crate::identity::{self, Identity};
use crate::storage::{
    Document, DocumentStore, DocumentStoreExt, Filter, Subscription, SESSIONS, SETTINGS,
};
use crate::timer::{Durations, Preset, PresetBook, TimerMode};

/// Result of [`SessionLedger::record_session`].
#[derive(Debug)]
pub struct RecordOutcome {
    pub record: SessionRecord,
    pub streak: StreakChange,
    pub streak_days: u32,
    /// Store writes that failed. In-memory state was kept regardless.
    pub failures: Vec<StoreError>,
}

impl RecordOutcome {
    pub fn is_persisted(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Dashboard figures for today and the past week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub today_minutes: u32,
    pub daily_goal_minutes: u32,
    pub goal_progress_pct: u32,
    pub current_streak_days: u32,
    pub weekly: Vec<DailyMinutes>,
    pub recent: Vec<SessionRecord>,
}

pub struct SessionLedger<S> {
    store: S,
    clock: Arc<dyn Clock>,
    identity: Option<Identity>,
    settings: Option<UserSettings>,
}

impl<S: DocumentStore> SessionLedger<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, identity: Option<Identity>) -> Self {
        Self {
            store,
            clock,
            identity,
            settings: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn identity(&self) -> Result<&Identity> {
        identity::require(self.identity.as_ref())
    }

    /// Settings as of the last read or write.
    pub fn settings(&self) -> Option<&UserSettings> {
        self.settings.as_ref()
    }

    /// Read the settings document, creating it with defaults on first use.
    ///
    /// # Errors
    /// `Unauthenticated` without an identity; store errors if the read fails.
    /// A failed write of the defaults is only logged.
    pub fn load_settings(&mut self) -> Result<&UserSettings> {
        let user_id = self.identity()?.user_id().to_string();
        let settings = match self.store.get_as::<UserSettings>(SETTINGS, &user_id)? {
            Some(s) => s,
            None => {
                let defaults = UserSettings::new(&user_id);
                if let Err(e) = self.store.put_as(SETTINGS, &user_id, &defaults) {
                    tracing::warn!(error = %e, "failed to write default settings");
                }
                defaults
            }
        };
        Ok(self.settings.insert(settings))
    }

    /// Append a session record and count it toward the streak.
    ///
    /// # Errors
    /// Fails fast with `Unauthenticated` or a validation error for a zero
    /// duration. Store failures are reported in [`RecordOutcome::failures`].
    pub fn record_session(
        &mut self,
        duration_minutes: u32,
        mode: TimerMode,
        preset_id: &str,
    ) -> Result<RecordOutcome> {
        let user_id = self.identity()?.user_id().to_string();
        if duration_minutes == 0 {
            return Err(ValidationError::OutOfRange {
                field: "durationMinutes".into(),
                min: 1,
                max: u32::MAX,
                value: 0,
            }
            .into());
        }

        let now = self.clock.now();
        let mut failures = Vec::new();

        let record = SessionRecord::new(&user_id, now, duration_minutes, mode, preset_id);
        if let Err(e) = self.store.put_as(SESSIONS, &record.id, &record) {
            tracing::warn!(session = %record.id, error = %e, "failed to save session");
            failures.push(e);
        }

        // Another handle may have changed the settings since the last read.
        let mut settings = match self.load_settings() {
            Ok(settings) => settings.clone(),
            Err(e) => {
                // Without the stored streak any update would overwrite it.
                tracing::warn!(error = %e, "settings unavailable; streak not updated");
                failures.push(into_store_error(e));
                return Ok(RecordOutcome {
                    record,
                    streak: StreakChange::Unchanged,
                    streak_days: 0,
                    failures,
                });
            }
        };
        let streak = register_study(&mut settings.streak, now, self.clock.as_ref());
        let streak_days = settings.streak.current_streak_days;
        if streak.is_changed() {
            tracing::info!(?streak, days = streak_days, "streak updated");
            if let Err(e) = self.store.put_as(SETTINGS, &user_id, &settings) {
                tracing::warn!(error = %e, "failed to save streak");
                failures.push(e);
            }
        }
        self.settings = Some(settings);

        tracing::info!(
            session = %record.id,
            minutes = duration_minutes,
            %mode,
            preset = preset_id,
            "session recorded"
        );

        Ok(RecordOutcome {
            record,
            streak,
            streak_days,
            failures,
        })
    }

    /// All of the user's sessions, oldest first.
    pub fn sessions(&self) -> Result<Vec<SessionRecord>> {
        let user_id = self.identity()?.user_id();
        let mut records: Vec<SessionRecord> =
            self.store.query_as(SESSIONS, &Filter::eq("userId", user_id))?;
        records.sort_by_key(|r| r.occurred_at);
        Ok(records)
    }

    /// Delete one of the user's sessions. The streak is not recomputed.
    pub fn delete_session(&self, id: &str) -> Result<()> {
        let user_id = self.identity()?.user_id();
        let owned = self
            .store
            .get_as::<SessionRecord>(SESSIONS, id)?
            .is_some_and(|r| r.user_id == user_id);
        if !owned || !self.store.delete(SESSIONS, id)? {
            return Err(CoreError::NotFound {
                collection: SESSIONS.into(),
                id: id.into(),
            });
        }
        Ok(())
    }

    /// Watch the user's sessions. The callback gets the full list, oldest
    /// first, on subscribe and after every change.
    pub fn subscribe_sessions<F>(&self, callback: F) -> Result<Subscription>
    where
        F: Fn(Vec<SessionRecord>) + Send + Sync + 'static,
    {
        let user_id = self.identity()?.user_id();
        let sub = self.store.subscribe(
            SESSIONS,
            Filter::eq("userId", user_id),
            Arc::new(move |docs: &[Document]| {
                let mut records: Vec<SessionRecord> = docs
                    .iter()
                    .filter_map(|d| serde_json::from_value(d.clone()).ok())
                    .collect();
                records.sort_by_key(|r| r.occurred_at);
                callback(records);
            }),
        )?;
        Ok(sub)
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn set_daily_goal(&mut self, minutes: u32) -> Result<()> {
        if !(1..=MAX_DAILY_GOAL_MIN).contains(&minutes) {
            return Err(ValidationError::OutOfRange {
                field: "dailyGoalMinutes".into(),
                min: 1,
                max: MAX_DAILY_GOAL_MIN,
                value: minutes,
            }
            .into());
        }
        self.update_settings(|s| {
            s.streak.daily_goal_minutes = minutes;
            Ok(())
        })
    }

    /// Built-in presets plus the user's own. Falls back to built-ins only
    /// when settings cannot be loaded.
    pub fn preset_book(&mut self) -> PresetBook {
        match self.load_settings() {
            Ok(settings) => PresetBook::new(settings.presets.clone()),
            Err(e) => {
                tracing::debug!(error = %e, "using built-in presets only");
                PresetBook::default()
            }
        }
    }

    /// Add a user preset. A missing id is generated.
    pub fn add_preset(&mut self, id: Option<&str>, name: &str, durations: Durations) -> Result<Preset> {
        let preset = Preset {
            id: id
                .map(str::to_string)
                .unwrap_or_else(|| format!("preset_{}", Uuid::new_v4().simple())),
            name: name.trim().to_string(),
            durations,
            builtin: false,
        };
        self.update_settings(|s| {
            let mut book = PresetBook::new(s.presets.clone());
            let added = book.add(preset)?.clone();
            s.presets = book.user_presets();
            Ok(added)
        })
    }

    pub fn remove_preset(&mut self, id: &str) -> Result<Preset> {
        self.update_settings(|s| {
            let mut book = PresetBook::new(s.presets.clone());
            let removed = book.remove(id)?;
            s.presets = book.user_presets();
            Ok(removed)
        })
    }

    // ── Aggregates ───────────────────────────────────────────────────

    pub fn today_minutes(&self) -> Result<u32> {
        let now = self.clock.now();
        Ok(stats::today_minutes(&self.sessions()?, now, self.clock.as_ref()))
    }

    pub fn weekly(&self) -> Result<Vec<DailyMinutes>> {
        let now = self.clock.now();
        Ok(stats::weekly(&self.sessions()?, now, self.clock.as_ref()))
    }

    pub fn summary(&self, range: StatsRange) -> Result<RangeSummary> {
        let now = self.clock.now();
        Ok(stats::summarize(&self.sessions()?, range, now, self.clock.as_ref()))
    }

    pub fn recent(&self, n: usize) -> Result<Vec<SessionRecord>> {
        Ok(stats::recent(&self.sessions()?, n))
    }

    pub fn dashboard(&mut self) -> Result<Dashboard> {
        let now = self.clock.now();
        let clock = Arc::clone(&self.clock);
        let streak = self.load_settings()?.streak.clone();
        let records = self.sessions()?;
        let today = stats::today_minutes(&records, now, clock.as_ref());
        Ok(Dashboard {
            today_minutes: today,
            daily_goal_minutes: streak.daily_goal_minutes,
            goal_progress_pct: stats::goal_progress_pct(today, streak.daily_goal_minutes),
            current_streak_days: effective_streak(&streak, now, clock.as_ref()),
            weekly: stats::weekly(&records, now, clock.as_ref()),
            recent: stats::recent(&records, 5),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Apply `edit` to freshly read settings and persist them; the cache is
    /// only replaced once the write succeeded.
    fn update_settings<T, F>(&mut self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut UserSettings) -> Result<T, ValidationError>,
    {
        let user_id = self.identity()?.user_id().to_string();
        let mut updated = self.load_settings()?.clone();
        let out = edit(&mut updated)?;
        self.store.put_as(SETTINGS, &user_id, &updated)?;
        self.settings = Some(updated);
        Ok(out)
    }
}

fn into_store_error(e: CoreError) -> StoreError {
    match e {
        CoreError::Store(s) => s,
        other => StoreError::Unavailable(other.to_string()),
    }
}
