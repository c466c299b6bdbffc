//! Property tests for the timer engine.

use chrono::{Duration, TimeZone, Utc};
use focusroom_core::timer::{builtin_presets, EngineOptions, Effect};
use focusroom_core::{Command, CoreError, PresetBook, TimerEngine, TimerMode, ValidationError};
use proptest::prelude::*;

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

fn engine() -> TimerEngine {
    TimerEngine::new(PresetBook::default(), EngineOptions::default())
}

fn recorded(effects: &[Effect]) -> Vec<u32> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::RecordSession { duration_min, .. } => Some(*duration_min),
            _ => None,
        })
        .collect()
}

/// Run the current mode to its deadline.
fn finish(engine: &mut TimerEngine, at: chrono::DateTime<Utc>) -> (Vec<Effect>, chrono::DateTime<Utc>) {
    let mut effects = engine.apply(Command::Start, at).unwrap();
    let deadline = engine.state().deadline.unwrap();
    effects.extend(engine.apply(Command::Tick, deadline).unwrap());
    (effects, deadline)
}

proptest! {
    #[test]
    fn preset_change_while_running_is_rejected(
        idx in 0usize..3,
        elapsed in 0i64..3600,
    ) {
        let id = builtin_presets()[idx].id.clone();
        let mut e = engine();
        e.apply(Command::Start, t0()).unwrap();
        e.apply(Command::Tick, t0() + Duration::seconds(elapsed)).unwrap();
        let before = e.state().clone();

        let result = e.apply(Command::ChangePreset(id), t0() + Duration::seconds(elapsed));
        prop_assert_eq!(result, Err(ValidationError::TimerRunning));
        prop_assert_eq!(e.state(), &before);
    }

    #[test]
    fn custom_work_duration_sets_remaining(d in 1u32..=180) {
        let mut e = engine();
        e.apply(Command::ChangePreset("custom".into()), t0()).unwrap();
        e.apply(Command::ChangeCustomDuration { mode: TimerMode::Work, minutes: d }, t0()).unwrap();
        prop_assert_eq!(e.state().remaining_secs, u64::from(d) * 60);
    }

    #[test]
    fn out_of_range_custom_duration_is_rejected(d in prop_oneof![Just(0u32), 181u32..10_000]) {
        let mut e = engine();
        let before = e.state().clone();
        let result = e.apply(Command::ChangeCustomDuration { mode: TimerMode::Work, minutes: d }, t0());
        let rejected = matches!(result, Err(ValidationError::OutOfRange { .. }));
        prop_assert!(rejected);
        prop_assert_eq!(e.state(), &before);
    }

    #[test]
    fn break_completion_returns_to_work(idx in 0usize..3, long in any::<bool>()) {
        let preset = builtin_presets()[idx].clone();
        let options = EngineOptions { long_break_interval: if long { 1 } else { 4 }, ..EngineOptions::default() };
        let mut e = TimerEngine::with_preset(PresetBook::default(), options, &preset.id);

        let (_, at) = finish(&mut e, t0());
        let expected_break = if long { TimerMode::LongBreak } else { TimerMode::ShortBreak };
        prop_assert_eq!(e.state().mode, expected_break);

        let (effects, _) = finish(&mut e, at);
        prop_assert_eq!(e.state().mode, TimerMode::Work);
        prop_assert_eq!(e.state().remaining_secs, u64::from(preset.durations.work) * 60);
        prop_assert!(recorded(&effects).is_empty());
    }

    #[test]
    fn pause_credits_whole_elapsed_minutes(secs in 1i64..(25 * 60)) {
        let mut e = engine();
        e.apply(Command::Start, t0()).unwrap();
        let effects = e.apply(Command::Pause, t0() + Duration::seconds(secs)).unwrap();
        let minutes = u32::try_from(secs / 60).unwrap();
        let expected: Vec<u32> = if minutes >= 1 { vec![minutes] } else { Vec::new() };
        prop_assert_eq!(recorded(&effects), expected);
        prop_assert_eq!(e.state().remaining_secs, u64::try_from(25 * 60 - secs).unwrap());
    }

    #[test]
    fn remaining_never_exceeds_armed_duration(offset in -7200i64..7200) {
        let mut e = engine();
        e.apply(Command::Start, t0()).unwrap();
        e.apply(Command::Tick, t0() + Duration::seconds(offset)).unwrap();
        prop_assert!(e.state().remaining_secs <= 25 * 60);
    }
}

#[test]
fn fourth_work_completion_is_a_long_break() {
    let mut e = engine();
    let mut at = t0();
    let mut work_completions = 0;
    while work_completions < 4 {
        let was_work = e.state().mode == TimerMode::Work;
        let (_, next) = finish(&mut e, at);
        at = next;
        if was_work {
            work_completions += 1;
        }
    }
    assert_eq!(e.state().mode, TimerMode::LongBreak);
    assert_eq!(e.state().remaining_secs, 15 * 60);
}

#[test]
fn engine_errors_convert_into_core_errors() {
    let err: CoreError = ValidationError::TimerRunning.into();
    assert!(matches!(err, CoreError::Validation(ValidationError::TimerRunning)));
}
