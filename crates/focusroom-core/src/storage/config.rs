//! TOML-based application configuration.
//!
//! Stores:
//! - Timer behavior (tick interval, default preset, long-break cadence)
//! - Notification preferences
//! - The signed-in account
//! - Storage backend selection
//!
//! Configuration is stored at `~/.config/focusroom/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::EngineOptions;

const TICK_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 100..=1000;

/// Timer-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// How often a running countdown is re-evaluated, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_preset")]
    pub default_preset: String,
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default)]
    pub auto_start_next: bool,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Identity used for ledger operations. Unset means signed out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database file; defaults to `focusroom.db` in the data directory.
    #[serde(default)]
    pub path: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusroom/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_tick_interval_ms() -> u64 {
    250
}
fn default_preset() -> String {
    "classic".into()
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            default_preset: default_preset(),
            long_break_interval: default_long_break_interval(),
            auto_start_next: false,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional strings are unset as `null` and set as plain text.
                    serde_json::Value::Null | serde_json::Value::String(_) if value == "null" => {
                        serde_json::Value::Null
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()
            .map_err(|e| ConfigError::DataDir(e.to_string()))?
            .join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, validating the result. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid; the
    /// config is left unchanged in that case.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !TICK_INTERVAL_RANGE.contains(&self.timer.tick_interval_ms) {
            return Err(ConfigError::InvalidValue {
                key: "timer.tick_interval_ms".into(),
                message: format!(
                    "must be between {} and {}",
                    TICK_INTERVAL_RANGE.start(),
                    TICK_INTERVAL_RANGE.end()
                ),
            });
        }
        if self.timer.long_break_interval == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timer.long_break_interval".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.timer.tick_interval_ms)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            long_break_interval: self.timer.long_break_interval,
            auto_start_next: self.timer.auto_start_next,
        }
    }

    /// Resolved database path for the SQLite backend.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(data_dir()
                .map_err(|e| ConfigError::DataDir(e.to_string()))?
                .join("focusroom.db")),
        }
    }
}
