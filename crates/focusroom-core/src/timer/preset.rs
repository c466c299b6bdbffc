use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Allowed range for any countdown duration, in minutes.
pub const MIN_DURATION_MIN: u32 = 1;
pub const MAX_DURATION_MIN: u32 = 180;

/// Id under which the inline custom triple is selected.
pub const CUSTOM_PRESET_ID: &str = "custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    Work,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::ShortBreak => "shortBreak",
            TimerMode::LongBreak => "longBreak",
        }
    }
}

impl std::str::FromStr for TimerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" | "focus" => Ok(TimerMode::Work),
            "shortBreak" | "short-break" | "short_break" => Ok(TimerMode::ShortBreak),
            "longBreak" | "long-break" | "long_break" => Ok(TimerMode::LongBreak),
            other => Err(ValidationError::InvalidMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work / short-break / long-break durations in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Durations {
    pub work: u32,
    pub short_break: u32,
    pub long_break: u32,
}

impl Durations {
    pub const fn new(work: u32, short_break: u32, long_break: u32) -> Self {
        Self {
            work,
            short_break,
            long_break,
        }
    }

    pub fn minutes_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Work => self.work,
            TimerMode::ShortBreak => self.short_break,
            TimerMode::LongBreak => self.long_break,
        }
    }

    /// Duration of `mode` in seconds.
    pub fn secs_for(&self, mode: TimerMode) -> u64 {
        u64::from(self.minutes_for(mode)).saturating_mul(60)
    }

    pub fn set(&mut self, mode: TimerMode, minutes: u32) {
        match mode {
            TimerMode::Work => self.work = minutes,
            TimerMode::ShortBreak => self.short_break = minutes,
            TimerMode::LongBreak => self.long_break = minutes,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_minutes(TimerMode::Work, self.work)?;
        validate_minutes(TimerMode::ShortBreak, self.short_break)?;
        validate_minutes(TimerMode::LongBreak, self.long_break)
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self::new(25, 5, 15)
    }
}

/// Reject durations outside `[MIN_DURATION_MIN, MAX_DURATION_MIN]`.
pub fn validate_minutes(mode: TimerMode, minutes: u32) -> Result<(), ValidationError> {
    if (MIN_DURATION_MIN..=MAX_DURATION_MIN).contains(&minutes) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: mode.as_str().to_string(),
            min: MIN_DURATION_MIN,
            max: MAX_DURATION_MIN,
            value: minutes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub durations: Durations,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub builtin: bool,
}

impl Preset {
    fn builtin(id: &str, name: &str, durations: Durations) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            durations,
            builtin: true,
        }
    }
}

/// The three presets every account starts with.
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::builtin("classic", "Classic", Durations::new(25, 5, 15)),
        Preset::builtin("short", "Short", Durations::new(15, 3, 10)),
        Preset::builtin("long", "Deep", Durations::new(50, 10, 30)),
    ]
}

pub fn is_builtin_id(id: &str) -> bool {
    builtin_presets().iter().any(|p| p.id == id)
}

/// Built-in presets followed by the user's own.
///
/// User presets are stored in the settings document; built-ins are never
/// persisted, so they cannot be edited or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetBook {
    presets: Vec<Preset>,
}

impl PresetBook {
    pub fn new(user_presets: Vec<Preset>) -> Self {
        let mut presets = builtin_presets();
        presets.extend(
            user_presets
                .into_iter()
                .filter(|p| !is_builtin_id(&p.id))
                .map(|mut p| {
                    p.builtin = false;
                    p
                }),
        );
        Self { presets }
    }

    pub fn all(&self) -> &[Preset] {
        &self.presets
    }

    pub fn user_presets(&self) -> Vec<Preset> {
        self.presets.iter().filter(|p| !p.builtin).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Preset to fall back on when a stored id no longer resolves.
    pub fn first(&self) -> &Preset {
        &self.presets[0]
    }

    pub fn add(&mut self, preset: Preset) -> Result<&Preset, ValidationError> {
        if preset.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name".into()));
        }
        if preset.id == CUSTOM_PRESET_ID || is_builtin_id(&preset.id) {
            return Err(ValidationError::BuiltinPreset(preset.id));
        }
        if self.get(&preset.id).is_some() {
            return Err(ValidationError::DuplicatePreset(preset.id));
        }
        preset.durations.validate()?;
        self.presets.push(Preset {
            builtin: false,
            ..preset
        });
        Ok(&self.presets[self.presets.len() - 1])
    }

    pub fn remove(&mut self, id: &str) -> Result<Preset, ValidationError> {
        let idx = self
            .presets
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ValidationError::UnknownPreset(id.to_string()))?;
        if self.presets[idx].builtin {
            return Err(ValidationError::BuiltinPreset(id.to_string()));
        }
        Ok(self.presets.remove(idx))
    }
}

impl Default for PresetBook {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
