//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-anchored state machine. It does not read
//! the clock or perform I/O: every command carries `now`, and the engine
//! answers with a list of [`Effect`]s for the driver to execute.
//!
//! ## State Transitions
//!
//! ```text
//! (work | shortBreak | longBreak) x (running | paused)
//!
//! work      --complete--> shortBreak | longBreak (every Nth work session)
//! *Break    --complete--> work
//! running   --pause-----> paused (work: credit whole elapsed minutes)
//! any       --reset-----> work, paused
//! ```
//!
//! Remaining time is always recomputed from the deadline, so a throttled or
//! late tick never makes the countdown drift.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(PresetBook::default(), EngineOptions::default());
//! let effects = engine.apply(Command::Start, clock.now())?;
//! // On every interval tick:
//! let effects = engine.apply(Command::Tick, clock.now())?;
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::preset::{validate_minutes, Durations, PresetBook, TimerMode, CUSTOM_PRESET_ID};
use crate::error::ValidationError;
use crate::events::Event;
use crate::notify::{Notification, Severity};

/// Which durations drive the countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ActivePreset {
    Preset(String),
    /// The engine's inline custom triple.
    Custom,
}

impl ActivePreset {
    pub fn id(&self) -> &str {
        match self {
            ActivePreset::Preset(id) => id,
            ActivePreset::Custom => CUSTOM_PRESET_ID,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub remaining_secs: u64,
    pub running: bool,
    /// Work sessions completed in this process. Never decreases.
    pub sessions_completed: u32,
    pub active_preset: ActivePreset,
    /// Set while running: when the current run segment began.
    pub started_at: Option<DateTime<Utc>>,
    /// Set while running: when the countdown reaches zero.
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Tick,
    /// Pause and stop are the same transition.
    Pause,
    Toggle,
    Reset,
    ChangePreset(String),
    ChangeCustomDuration { mode: TimerMode, minutes: u32 },
}

/// Side effects requested by a transition, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RecordSession {
        duration_min: u32,
        mode: TimerMode,
        preset_id: String,
    },
    Notify(Notification),
    /// Begin periodic ticks.
    ArmTicker,
    /// Stop periodic ticks. Must be safe to repeat.
    DisarmTicker,
    Emit(Event),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Every Nth completed work session is followed by a long break.
    pub long_break_interval: u32,
    /// Start the next mode's countdown right after a completion.
    pub auto_start_next: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            long_break_interval: 4,
            auto_start_next: false,
        }
    }
}

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    state: TimerState,
    presets: PresetBook,
    custom: Durations,
    options: EngineOptions,
}

impl TimerEngine {
    /// Create an engine in work mode on the first built-in preset, paused.
    pub fn new(presets: PresetBook, options: EngineOptions) -> Self {
        let active = ActivePreset::Preset(presets.first().id.clone());
        let remaining_secs = presets.first().durations.secs_for(TimerMode::Work);
        Self {
            state: TimerState {
                mode: TimerMode::Work,
                remaining_secs,
                running: false,
                sessions_completed: 0,
                active_preset: active,
                started_at: None,
                deadline: None,
            },
            presets,
            custom: Durations::default(),
            options,
        }
    }

    /// Create an engine with `preset_id` selected, falling back to the first
    /// preset if the id does not resolve.
    pub fn with_preset(presets: PresetBook, options: EngineOptions, preset_id: &str) -> Self {
        let mut engine = Self::new(presets, options);
        if let Ok(active) = engine.resolve(preset_id) {
            engine.state.active_preset = active;
            engine.state.remaining_secs = engine.durations().secs_for(TimerMode::Work);
        }
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn presets(&self) -> &PresetBook {
        &self.presets
    }

    pub fn custom_durations(&self) -> Durations {
        self.custom
    }

    /// Durations of the active preset.
    pub fn durations(&self) -> Durations {
        match &self.state.active_preset {
            ActivePreset::Custom => self.custom,
            ActivePreset::Preset(id) => self
                .presets
                .get(id)
                .unwrap_or_else(|| self.presets.first())
                .durations,
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.durations().secs_for(self.state.mode)
    }

    /// 0.0 .. 100.0 progress within the current mode.
    pub fn progress_pct(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        let done = total.saturating_sub(self.state.remaining_secs);
        (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, at: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            mode: self.state.mode,
            running: self.state.running,
            remaining_secs: self.state.remaining_secs,
            total_secs: self.total_secs(),
            sessions_completed: self.state.sessions_completed,
            preset_id: self.state.active_preset.id().to_string(),
            progress_pct: self.progress_pct(),
            at,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply one command at wall-clock time `now`.
    ///
    /// Validation failures leave the state untouched.
    pub fn apply(&mut self, command: Command, now: DateTime<Utc>) -> Result<Vec<Effect>, ValidationError> {
        let mut effects = Vec::new();
        match command {
            Command::Start => self.start(now, &mut effects),
            Command::Tick => self.tick(now, &mut effects),
            Command::Pause => self.pause(now, &mut effects),
            Command::Toggle => {
                if self.state.running {
                    self.pause(now, &mut effects);
                } else {
                    self.start(now, &mut effects);
                }
            }
            Command::Reset => self.reset(now, &mut effects),
            Command::ChangePreset(id) => self.change_preset(&id, now, &mut effects)?,
            Command::ChangeCustomDuration { mode, minutes } => {
                self.change_custom_duration(mode, minutes, now, &mut effects)?
            }
        }
        Ok(effects)
    }

    /// Replace the preset book (after the user added or removed a preset).
    ///
    /// If the active preset disappeared the countdown falls back to the
    /// first preset the next time durations are read.
    pub fn set_presets(&mut self, presets: PresetBook) {
        self.presets = presets;
    }

    fn start(&mut self, now: DateTime<Utc>, effects: &mut Vec<Effect>) {
        if self.state.running {
            return;
        }
        if self.state.remaining_secs == 0 {
            self.state.remaining_secs = self.total_secs();
        }
        self.state.running = true;
        self.state.started_at = Some(now);
        self.state.deadline = Some(now + secs(self.state.remaining_secs));
        tracing::debug!(mode = %self.state.mode, remaining = self.state.remaining_secs, "timer started");
        effects.push(Effect::ArmTicker);
        effects.push(Effect::Emit(Event::TimerStarted {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            at: now,
        }));
    }

    fn tick(&mut self, now: DateTime<Utc>, effects: &mut Vec<Effect>) {
        if !self.state.running {
            return;
        }
        match self.remaining_at(now) {
            Some(0) => self.complete(now, effects),
            Some(remaining) => self.state.remaining_secs = remaining,
            None => {}
        }
    }

    fn pause(&mut self, now: DateTime<Utc>, effects: &mut Vec<Effect>) {
        if !self.state.running {
            return;
        }
        // A deadline that already passed completes the mode; the elapsed
        // credit path never runs for it.
        let Some(remaining) = self.remaining_at(now) else {
            return;
        };
        if remaining == 0 {
            self.complete(now, effects);
            return;
        }

        let elapsed_min = self
            .state
            .started_at
            .map(|started| (now - started).num_seconds().max(0) / 60)
            .unwrap_or(0);
        let credited = (self.state.mode == TimerMode::Work && elapsed_min >= 1)
            .then(|| u32::try_from(elapsed_min).unwrap_or(u32::MAX));

        self.state.remaining_secs = remaining;
        self.disarm();
        tracing::debug!(mode = %self.state.mode, remaining, ?credited, "timer paused");

        effects.push(Effect::DisarmTicker);
        if let Some(duration_min) = credited {
            effects.push(Effect::RecordSession {
                duration_min,
                mode: self.state.mode,
                preset_id: self.state.active_preset.id().to_string(),
            });
        }
        effects.push(Effect::Emit(Event::TimerPaused {
            mode: self.state.mode,
            remaining_secs: remaining,
            credited_min: credited,
            at: now,
        }));
    }

    fn complete(&mut self, now: DateTime<Utc>, effects: &mut Vec<Effect>) {
        let finished = self.state.mode;
        let durations = self.durations();
        self.disarm();
        effects.push(Effect::DisarmTicker);

        let (next, notification) = if finished == TimerMode::Work {
            self.state.sessions_completed += 1;
            effects.push(Effect::RecordSession {
                duration_min: durations.work,
                mode: TimerMode::Work,
                preset_id: self.state.active_preset.id().to_string(),
            });
            if self.state.sessions_completed % self.options.long_break_interval.max(1) == 0 {
                (
                    TimerMode::LongBreak,
                    Notification::new(
                        "Great work!",
                        format!("Time for a {} minute long break", durations.long_break),
                        Severity::Success,
                    ),
                )
            } else {
                (
                    TimerMode::ShortBreak,
                    Notification::new(
                        "Session complete!",
                        format!("Time for a {} minute break", durations.short_break),
                        Severity::Success,
                    ),
                )
            }
        } else {
            (
                TimerMode::Work,
                Notification::info("Break over!", "Ready to focus again?"),
            )
        };

        self.state.mode = next;
        self.state.remaining_secs = durations.secs_for(next);
        tracing::debug!(%finished, %next, sessions = self.state.sessions_completed, "mode completed");

        effects.push(Effect::Notify(notification));
        effects.push(Effect::Emit(Event::TimerCompleted {
            mode: finished,
            next_mode: next,
            sessions_completed: self.state.sessions_completed,
            at: now,
        }));

        if self.options.auto_start_next {
            self.start(now, effects);
        }
    }

    fn reset(&mut self, now: DateTime<Utc>, effects: &mut Vec<Effect>) {
        self.disarm();
        self.state.mode = TimerMode::Work;
        self.state.remaining_secs = self.durations().secs_for(TimerMode::Work);
        effects.push(Effect::DisarmTicker);
        effects.push(Effect::Emit(Event::TimerReset { at: now }));
    }

    fn change_preset(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
        effects: &mut Vec<Effect>,
    ) -> Result<(), ValidationError> {
        if self.state.running {
            return Err(ValidationError::TimerRunning);
        }
        let active = self.resolve(id)?;
        self.state.active_preset = active;
        self.state.mode = TimerMode::Work;
        self.state.remaining_secs = self.durations().secs_for(TimerMode::Work);
        effects.push(Effect::Emit(Event::PresetChanged {
            preset_id: id.to_string(),
            at: now,
        }));
        Ok(())
    }

    fn change_custom_duration(
        &mut self,
        mode: TimerMode,
        minutes: u32,
        now: DateTime<Utc>,
        effects: &mut Vec<Effect>,
    ) -> Result<(), ValidationError> {
        validate_minutes(mode, minutes)?;
        self.custom.set(mode, minutes);
        if !self.state.running && self.state.mode == mode {
            // Remaining time always derives from the active durations.
            self.state.active_preset = ActivePreset::Custom;
            self.state.remaining_secs = u64::from(minutes) * 60;
        }
        effects.push(Effect::Emit(Event::CustomDurationChanged {
            mode,
            minutes,
            at: now,
        }));
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn resolve(&self, id: &str) -> Result<ActivePreset, ValidationError> {
        if id == CUSTOM_PRESET_ID {
            return Ok(ActivePreset::Custom);
        }
        self.presets
            .get(id)
            .map(|p| ActivePreset::Preset(p.id.clone()))
            .ok_or_else(|| ValidationError::UnknownPreset(id.to_string()))
    }

    /// Whole seconds left at `now`, rounded up and clamped to
    /// `0..=armed duration`. `None` when not anchored.
    fn remaining_at(&self, now: DateTime<Utc>) -> Option<u64> {
        let deadline = self.state.deadline?;
        let left_ms = (deadline - now).num_milliseconds();
        if left_ms <= 0 {
            return Some(0);
        }
        let armed_secs = self
            .state
            .started_at
            .map(|s| (deadline - s).num_seconds().max(0) as u64)
            .unwrap_or(u64::MAX);
        let left = (left_ms as u64).div_ceil(1000);
        Some(left.min(armed_secs))
    }

    fn disarm(&mut self) {
        self.state.running = false;
        self.state.started_at = None;
        self.state.deadline = None;
    }
}

fn secs(s: u64) -> Duration {
    Duration::seconds(i64::try_from(s).unwrap_or(i64::MAX))
}
