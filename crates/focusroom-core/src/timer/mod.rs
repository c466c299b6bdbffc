mod engine;
mod preset;
mod ticker;

pub use engine::{ActivePreset, Command, Effect, EngineOptions, TimerEngine, TimerState};
pub use preset::{
    builtin_presets, is_builtin_id, validate_minutes, Durations, Preset, PresetBook, TimerMode,
    CUSTOM_PRESET_ID, MAX_DURATION_MIN, MIN_DURATION_MIN,
};
pub use ticker::Ticker;
