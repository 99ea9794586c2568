use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The timer's current countdown mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_work(self) -> bool {
        self == Phase::Work
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }
}

/// Countdown durations and the long-break cadence.
///
/// All durations are in seconds and strictly positive;
/// `sessions_before_long_break` is at least 1 (a value of 1 means every
/// work session is followed by a long break).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_secs")]
    pub work_secs: u32,
    #[serde(default = "default_short_break_secs")]
    pub short_break_secs: u32,
    #[serde(default = "default_long_break_secs")]
    pub long_break_secs: u32,
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
}

fn default_work_secs() -> u32 {
    25 * 60
}
fn default_short_break_secs() -> u32 {
    5 * 60
}
fn default_long_break_secs() -> u32 {
    15 * 60
}
fn default_sessions_before_long_break() -> u32 {
    4
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_secs: default_work_secs(),
            short_break_secs: default_short_break_secs(),
            long_break_secs: default_long_break_secs(),
            sessions_before_long_break: default_sessions_before_long_break(),
        }
    }
}

impl TimerConfig {
    /// Check the positivity invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.work_secs == 0 {
            return Err(ConfigError::invalid("work_secs", "must be greater than 0"));
        }
        if self.short_break_secs == 0 {
            return Err(ConfigError::invalid(
                "short_break_secs",
                "must be greater than 0",
            ));
        }
        if self.long_break_secs == 0 {
            return Err(ConfigError::invalid(
                "long_break_secs",
                "must be greater than 0",
            ));
        }
        if self.sessions_before_long_break == 0 {
            return Err(ConfigError::invalid(
                "sessions_before_long_break",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Full duration of the given phase under this configuration.
    pub fn duration_secs(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_secs,
            Phase::ShortBreak => self.short_break_secs,
            Phase::LongBreak => self.long_break_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let cfg = TimerConfig::default();
        assert_eq!(cfg.work_secs, 25 * 60);
        assert_eq!(cfg.short_break_secs, 5 * 60);
        assert_eq!(cfg.long_break_secs, 15 * 60);
        assert_eq!(cfg.sessions_before_long_break, 4);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_durations() {
        for field in ["work_secs", "short_break_secs", "long_break_secs"] {
            let mut cfg = TimerConfig::default();
            match field {
                "work_secs" => cfg.work_secs = 0,
                "short_break_secs" => cfg.short_break_secs = 0,
                _ => cfg.long_break_secs = 0,
            }
            let err = cfg.validate().unwrap_err();
            assert!(err.to_string().contains(field), "wrong field in: {err}");
        }
    }

    #[test]
    fn validate_rejects_zero_cadence() {
        let cfg = TimerConfig {
            sessions_before_long_break: 0,
            ..TimerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn duration_lookup_per_phase() {
        let cfg = TimerConfig {
            work_secs: 5,
            short_break_secs: 2,
            long_break_secs: 10,
            sessions_before_long_break: 2,
        };
        assert_eq!(cfg.duration_secs(Phase::Work), 5);
        assert_eq!(cfg.duration_secs(Phase::ShortBreak), 2);
        assert_eq!(cfg.duration_secs(Phase::LongBreak), 10);
    }
}
