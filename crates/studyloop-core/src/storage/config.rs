//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Timer durations and the long-break cadence
//! - Notification preferences
//! - Session recorder endpoint
//!
//! Configuration is stored at `~/.config/studyloop/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::timer::TimerConfig;

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Session recorder configuration.
///
/// With an endpoint set, completed sessions are POSTed there; otherwise
/// they land in the local database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecorderConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studyloop/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// carries invalid timer values, or if the default config cannot be
    /// written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)
                    .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.timer.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "timer.work_secs" => Some(self.timer.work_secs.to_string()),
            "timer.short_break_secs" => Some(self.timer.short_break_secs.to_string()),
            "timer.long_break_secs" => Some(self.timer.long_break_secs.to_string()),
            "timer.sessions_before_long_break" => {
                Some(self.timer.sessions_before_long_break.to_string())
            }
            "notifications.enabled" => Some(self.notifications.enabled.to_string()),
            "recorder.endpoint" => Some(self.recorder.endpoint.clone().unwrap_or_default()),
            "recorder.auth_token" => Some(self.recorder.auth_token.clone().unwrap_or_default()),
            _ => None,
        }
    }

    /// Set a config value by dot-separated key. Timer values are
    /// re-validated as a whole, so an update that would break an invariant
    /// is rejected and the previous configuration kept.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown keys, unparseable values, or timer
    /// values violating the invariants.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "timer.work_secs"
            | "timer.short_break_secs"
            | "timer.long_break_secs"
            | "timer.sessions_before_long_break" => {
                let parsed: u32 = value.parse().map_err(|_| {
                    ConfigError::invalid(key, format!("cannot parse '{value}' as a number"))
                })?;
                let mut timer = self.timer;
                match key {
                    "timer.work_secs" => timer.work_secs = parsed,
                    "timer.short_break_secs" => timer.short_break_secs = parsed,
                    "timer.long_break_secs" => timer.long_break_secs = parsed,
                    _ => timer.sessions_before_long_break = parsed,
                }
                timer.validate()?;
                self.timer = timer;
            }
            "notifications.enabled" => {
                self.notifications.enabled = value.parse().map_err(|_| {
                    ConfigError::invalid(key, format!("cannot parse '{value}' as a bool"))
                })?;
            }
            "recorder.endpoint" => {
                self.recorder.endpoint = (!value.is_empty()).then(|| value.to_string());
            }
            "recorder.auth_token" => {
                self.recorder.auth_token = (!value.is_empty()).then(|| value.to_string());
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Load from disk, returning defaults on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

/// How the timer service reads and writes its durations.
///
/// The engine itself never touches a storage medium; it sees timer
/// settings only through this contract.
pub trait ConfigStore: Send + Sync {
    /// Load the timer configuration.
    fn load(&self) -> Result<TimerConfig>;

    /// Persist an accepted timer configuration.
    fn save(&self, config: &TimerConfig) -> Result<()>;
}

/// Config store backed by the application's TOML file. Timer updates are
/// merged into the file without disturbing the other sections.
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    /// Store at the default location.
    pub fn open() -> Result<Self> {
        Ok(Self {
            path: Config::path()?,
        })
    }

    /// Store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<TimerConfig> {
        Ok(Config::load_from(&self.path)?.timer)
    }

    fn save(&self, config: &TimerConfig) -> Result<()> {
        let mut full = Config::load_from(&self.path)?;
        full.timer = *config;
        full.save_to(&self.path)
    }
}
