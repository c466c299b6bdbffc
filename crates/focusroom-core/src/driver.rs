//! Timer driver: the single writer of timer state.
//!
//! The driver reads the clock, applies commands to the [`TimerEngine`] and
//! executes the resulting effects in order: ticker arm/disarm, session
//! recording through the [`SessionLedger`], notifications and events.
//! Display surfaces poll [`TimerDriver::snapshot`] or drain events.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::{CoreError, Result, StoreError, ValidationError};
use crate::events::Event;
use crate::ledger::SessionLedger;
use crate::notify::{Notification, Notifier};
use crate::storage::{Config, DocumentStore};
use crate::timer::{Command, Effect, EngineOptions, Ticker, TimerEngine, TimerMode, TimerState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    pub tick_interval: Duration,
    pub engine: EngineOptions,
    /// Preset selected at startup; unknown ids fall back to the first preset.
    pub default_preset: String,
    /// Deliver completion notifications. Error notifications are always sent.
    pub notifications_enabled: bool,
}

impl DriverOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            engine: config.engine_options(),
            default_preset: config.timer.default_preset.clone(),
            notifications_enabled: config.notifications.enabled,
        }
    }
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            engine: EngineOptions::default(),
            default_preset: "classic".into(),
            notifications_enabled: true,
        }
    }
}

pub struct TimerDriver<S, N> {
    engine: TimerEngine,
    ledger: SessionLedger<S>,
    notifier: N,
    clock: Arc<dyn Clock>,
    ticker: Ticker,
    notifications_enabled: bool,
    events: VecDeque<Event>,
    failures: Vec<StoreError>,
}

impl<S: DocumentStore, N: Notifier> TimerDriver<S, N> {
    /// Build a driver whose engine knows the ledger user's presets.
    pub fn new(
        mut ledger: SessionLedger<S>,
        notifier: N,
        clock: Arc<dyn Clock>,
        options: DriverOptions,
    ) -> Self {
        let engine =
            TimerEngine::with_preset(ledger.preset_book(), options.engine, &options.default_preset);
        Self {
            engine,
            ledger,
            notifier,
            clock,
            ticker: Ticker::new(options.tick_interval),
            notifications_enabled: options.notifications_enabled,
            events: VecDeque::new(),
            failures: Vec::new(),
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn state(&self) -> &TimerState {
        self.engine.state()
    }

    pub fn ledger(&self) -> &SessionLedger<S> {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut SessionLedger<S> {
        &mut self.ledger
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot(self.clock.now())
    }

    /// Apply `command` at the clock's current time.
    ///
    /// # Errors
    /// Returns the validation error after sending an error notification;
    /// timer state is unchanged in that case.
    pub fn dispatch(&mut self, command: Command) -> Result<()> {
        let now = self.clock.now();
        tracing::debug!(?command, "dispatch");
        match self.engine.apply(command, now) {
            Ok(effects) => {
                self.execute(effects);
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(&rejection_notice(&e));
                Err(CoreError::Validation(e))
            }
        }
    }

    pub fn tick(&mut self) -> Result<()> {
        self.dispatch(Command::Tick)
    }

    /// Resolves on the next interval tick; never resolves while disarmed.
    pub async fn next_tick(&mut self) {
        self.ticker.tick().await;
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    /// Store failures collected since the last call.
    pub fn take_failures(&mut self) -> Vec<StoreError> {
        std::mem::take(&mut self.failures)
    }

    /// Reload presets from the user's settings into the engine.
    pub fn sync_presets(&mut self) {
        let book = self.ledger.preset_book();
        self.engine.set_presets(book);
    }

    /// Stop a running countdown (crediting elapsed work time) and release
    /// the ticker.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.engine.state().running {
            self.dispatch(Command::Pause)?;
        }
        self.ticker.disarm();
        Ok(())
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ArmTicker => self.ticker.arm(),
                Effect::DisarmTicker => self.ticker.disarm(),
                Effect::Emit(event) => self.events.push_back(event),
                Effect::Notify(n) => {
                    if self.notifications_enabled {
                        self.notifier.notify(&n);
                    }
                }
                Effect::RecordSession {
                    duration_min,
                    mode,
                    preset_id,
                } => self.record(duration_min, mode, &preset_id),
            }
        }
    }

    fn record(&mut self, duration_min: u32, mode: TimerMode, preset_id: &str) {
        match self.ledger.record_session(duration_min, mode, preset_id) {
            Ok(outcome) => {
                self.events.push_back(Event::SessionRecorded {
                    session_id: outcome.record.id.clone(),
                    duration_min,
                    streak_days: outcome.streak_days,
                    at: outcome.record.occurred_at,
                });
                if !outcome.is_persisted() {
                    self.notifier
                        .notify(&Notification::error("Error", "Failed to save session"));
                    self.failures.extend(outcome.failures);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, minutes = duration_min, "session not recorded");
                self.notifier
                    .notify(&Notification::error("Error", "Failed to save session"));
            }
        }
    }
}

fn rejection_notice(e: &ValidationError) -> Notification {
    match e {
        ValidationError::TimerRunning => Notification::error(
            "Timer is running",
            "Please stop the timer before changing presets",
        ),
        ValidationError::OutOfRange { min, max, .. } => Notification::error(
            "Invalid time",
            format!("Please enter a value between {min} and {max} minutes"),
        ),
        other => Notification::error("Error", other.to_string()),
    }
}
