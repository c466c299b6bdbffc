//! Integration tests for the timer-to-ledger workflow.
//!
//! Drives the timer through the driver with a manual clock and checks what
//! ends up in the document store: session records, streak and settings.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use focusroom_core::ledger::{StreakChange, UserSettings};
use focusroom_core::notify::CollectingNotifier;
use focusroom_core::storage::{DocumentStoreExt, SESSIONS, SETTINGS};
use focusroom_core::{
    Clock, Command, CoreError, DriverOptions, Event, Identity, ManualClock, MemoryStore, SessionLedger,
    TimerDriver, TimerMode,
};

fn start_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap())
}

fn driver_for(
    store: &MemoryStore,
    clock: &ManualClock,
    user: Option<&str>,
) -> (TimerDriver<MemoryStore, CollectingNotifier>, CollectingNotifier) {
    let notes = CollectingNotifier::new();
    let ledger = SessionLedger::new(
        store.clone(),
        Arc::new(clock.clone()),
        user.and_then(Identity::new),
    );
    let driver = TimerDriver::new(
        ledger,
        notes.clone(),
        Arc::new(clock.clone()),
        DriverOptions::default(),
    );
    (driver, notes)
}

fn run_mode(driver: &mut TimerDriver<MemoryStore, CollectingNotifier>, clock: &ManualClock) {
    let secs = driver.state().remaining_secs;
    driver.dispatch(Command::Start).unwrap();
    // A few throttled ticks along the way.
    clock.advance_secs(i64::try_from(secs / 2).unwrap());
    driver.tick().unwrap();
    clock.advance_secs(i64::try_from(secs - secs / 2).unwrap());
    driver.tick().unwrap();
}

#[test]
fn test_full_pomodoro_cycle() {
    let store = MemoryStore::new();
    let clock = start_clock();
    let (mut driver, notes) = driver_for(&store, &clock, Some("alice"));

    let mut modes = Vec::new();
    for _ in 0..8 {
        run_mode(&mut driver, &clock);
        modes.push(driver.state().mode);
    }

    assert_eq!(
        modes,
        [
            TimerMode::ShortBreak,
            TimerMode::Work,
            TimerMode::ShortBreak,
            TimerMode::Work,
            TimerMode::ShortBreak,
            TimerMode::Work,
            TimerMode::LongBreak,
            TimerMode::Work,
        ]
    );
    assert_eq!(driver.state().sessions_completed, 4);

    // Only work sessions are recorded, each for the full preset length.
    let sessions = driver.ledger().sessions().unwrap();
    assert_eq!(sessions.len(), 4);
    assert!(sessions.iter().all(|s| s.duration_minutes == 25 && s.mode == TimerMode::Work));
    assert!(sessions.iter().all(|s| s.preset_id == "classic"));

    let titles: Vec<String> = notes.take().into_iter().map(|n| n.title).collect();
    assert_eq!(titles[6], "Great work!");
    assert_eq!(titles[7], "Break over!");

    let completed = driver
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, Event::TimerCompleted { .. }))
        .count();
    assert_eq!(completed, 8);
}

#[test]
fn test_stop_before_first_minute_records_nothing() {
    let store = MemoryStore::new();
    let clock = start_clock();
    let (mut driver, _) = driver_for(&store, &clock, Some("alice"));

    driver.dispatch(Command::Start).unwrap();
    clock.advance_secs(59);
    driver.dispatch(Command::Pause).unwrap();
    assert_eq!(store.len(SESSIONS), 0);
    assert_eq!(driver.state().remaining_secs, 25 * 60 - 59);

    // Resuming starts a fresh run segment.
    driver.dispatch(Command::Toggle).unwrap();
    clock.advance_secs(60);
    driver.dispatch(Command::Toggle).unwrap();
    let sessions = driver.ledger().sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].duration_minutes, 1);
}

#[test]
fn test_streak_across_days() {
    let store = MemoryStore::new();
    let clock = start_clock();
    let identity = Identity::new("alice");
    let mut ledger = SessionLedger::new(store.clone(), Arc::new(clock.clone()), identity);

    let first = ledger.record_session(25, TimerMode::Work, "classic").unwrap();
    assert_eq!(first.streak, StreakChange::Restarted);

    clock.advance(Duration::days(1));
    let second = ledger.record_session(25, TimerMode::Work, "classic").unwrap();
    assert_eq!(second.streak, StreakChange::Extended);
    assert_eq!(second.streak_days, 2);

    clock.advance(Duration::days(2));
    let third = ledger.record_session(25, TimerMode::Work, "classic").unwrap();
    assert_eq!(third.streak, StreakChange::Restarted);
    assert_eq!(third.streak_days, 1);

    let stored: UserSettings = store.get_as(SETTINGS, "alice").unwrap().unwrap();
    assert_eq!(stored.streak.current_streak_days, 1);
    assert_eq!(stored.streak.last_study_date, Some(clock.now()));
}

#[test]
fn test_streak_survives_restart() {
    let store = MemoryStore::new();
    let clock = start_clock();

    let mut ledger =
        SessionLedger::new(store.clone(), Arc::new(clock.clone()), Identity::new("alice"));
    ledger.record_session(30, TimerMode::Work, "classic").unwrap();
    drop(ledger);

    clock.advance(Duration::days(1));
    let mut reopened =
        SessionLedger::new(store.clone(), Arc::new(clock.clone()), Identity::new("alice"));
    let out = reopened.record_session(30, TimerMode::Work, "classic").unwrap();
    assert_eq!(out.streak_days, 2);
    assert_eq!(reopened.sessions().unwrap().len(), 2);
}

#[test]
fn test_unauthenticated_ledger_writes_nothing() {
    let store = MemoryStore::new();
    let clock = start_clock();
    let mut ledger = SessionLedger::new(store.clone(), Arc::new(clock), None);

    assert!(matches!(
        ledger.record_session(25, TimerMode::Work, "classic"),
        Err(CoreError::Unauthenticated)
    ));
    assert!(matches!(ledger.load_settings(), Err(CoreError::Unauthenticated)));
    assert_eq!(store.len(SESSIONS), 0);
    assert_eq!(store.len(SETTINGS), 0);
}

#[test]
fn test_failed_writes_are_not_rolled_back() {
    let store = MemoryStore::new();
    let clock = start_clock();
    let (mut driver, notes) = driver_for(&store, &clock, Some("alice"));
    driver.ledger_mut().load_settings().unwrap();

    store.set_fail_writes(true);
    run_mode(&mut driver, &clock);

    // Timer state moved on even though nothing was saved.
    assert_eq!(driver.state().mode, TimerMode::ShortBreak);
    assert_eq!(driver.state().sessions_completed, 1);
    assert_eq!(store.len(SESSIONS), 0);
    assert!(!driver.take_failures().is_empty());
    assert!(notes
        .take()
        .iter()
        .any(|n| n.message == "Failed to save session"));

    // Recovers once the store accepts writes again.
    store.set_fail_writes(false);
    run_mode(&mut driver, &clock);
    run_mode(&mut driver, &clock);
    assert_eq!(store.len(SESSIONS), 1);
    assert!(driver.take_failures().is_empty());
}

#[test]
fn test_reset_mid_session_records_nothing() {
    let store = MemoryStore::new();
    let clock = start_clock();
    let (mut driver, _) = driver_for(&store, &clock, Some("alice"));

    driver.dispatch(Command::Start).unwrap();
    clock.advance_secs(10 * 60);
    driver.tick().unwrap();
    driver.dispatch(Command::Reset).unwrap();

    assert_eq!(store.len(SESSIONS), 0);
    assert!(!driver.state().running);
    assert!(!driver.ticker().is_armed());
    assert_eq!(driver.state().remaining_secs, 25 * 60);
}

#[test]
fn test_session_subscription_follows_driver() {
    let store = MemoryStore::new();
    let clock = start_clock();
    let (mut driver, _) = driver_for(&store, &clock, Some("alice"));

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = driver
        .ledger()
        .subscribe_sessions(move |records| sink.lock().unwrap().push(records.len()))
        .unwrap();

    run_mode(&mut driver, &clock);
    drop(sub);
    run_mode(&mut driver, &clock);
    run_mode(&mut driver, &clock);

    assert_eq!(*seen.lock().unwrap(), [0, 1]);
}
