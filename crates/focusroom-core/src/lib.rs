//! # Focusroom Core Library
//!
//! Core logic for the Focusroom Pomodoro timer: the countdown state machine,
//! session and streak accounting, todos and per-user settings. The
//! `focusroom` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock-anchored state machine. Commands go in,
//!   effects come out; it never reads the clock or touches storage
//! - **Driver**: owns the engine, executes its effects and drives the ticker
//! - **Ledger**: appends session records and maintains the study streak
//! - **Storage**: document store trait with in-memory and SQLite backends,
//!   TOML configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`TimerDriver`]: single writer of timer state
//! - [`SessionLedger`]: session records, streak and aggregates
//! - [`DocumentStore`]: persistence contract
//! - [`Config`]: application configuration management

pub mod clock;
pub mod driver;
pub mod error;
pub mod events;
pub mod identity;
pub mod ledger;
pub mod notify;
pub mod storage;
pub mod timer;
pub mod todo;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{DriverOptions, TimerDriver};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use identity::Identity;
pub use ledger::{Dashboard, RecordOutcome, SessionLedger, SessionRecord, StatsRange};
pub use notify::{Notification, Notifier, Severity};
pub use storage::{Config, DocumentStore, MemoryStore, SqliteStore};
pub use timer::{Command, Durations, Preset, PresetBook, TimerEngine, TimerMode, TimerState};
pub use todo::{Todo, TodoList};
