//! Settings loading for pomo
//!
//! Settings live in `~/.config/pomo/config.toml`. Every key is optional and
//! a missing file means defaults. Raw minute values are clamped into range
//! here; the engine validates them again on its own.

use anyhow::{Context, Result};
use pomo_core::Paths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::durations::{Durations, DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES};

/// Fastest accepted poll interval
pub const MIN_TICK_MS: u64 = 100;
/// Slowest accepted poll interval
pub const MAX_TICK_MS: u64 = 1000;
pub const DEFAULT_TICK_MS: u64 = 250;

/// User settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Work phase length in minutes (1-60)
    pub work_minutes: u32,

    /// Break phase length in minutes (1-30)
    pub break_minutes: u32,

    /// How often the driver polls the engine, in milliseconds
    pub tick_ms: u64,

    /// Send a desktop notification when a phase completes
    pub notify: bool,

    /// Start the next phase automatically instead of waiting
    pub auto_continue: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            tick_ms: DEFAULT_TICK_MS,
            notify: true,
            auto_continue: false,
        }
    }
}

impl Settings {
    /// Load settings from the standard location, or defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`, or defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Write these settings to `path`, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content).with_context(|| format!("Failed to write config: {}", path.display()))
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Paths::new().config_file()
    }

    /// Phase lengths, pulled into the accepted range
    pub fn durations(&self) -> Durations {
        Durations::clamped(self.work_minutes, self.break_minutes)
    }

    /// Poll interval, pulled into the accepted range
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.clamp(MIN_TICK_MS, MAX_TICK_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "work_minutes = 50\nauto_continue = true\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.work_minutes, 50);
        assert_eq!(settings.break_minutes, DEFAULT_BREAK_MINUTES);
        assert!(settings.auto_continue);
        assert!(settings.notify);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "work_minutes = \"lots\"").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = Paths::rooted(dir.path()).config_file();
        assert!(!path.parent().unwrap().exists());
        let settings = Settings {
            work_minutes: 45,
            break_minutes: 15,
            tick_ms: 500,
            notify: false,
            auto_continue: true,
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let settings = Settings {
            work_minutes: 0,
            break_minutes: 120,
            tick_ms: 5,
            ..Default::default()
        };

        let durations = settings.durations();
        assert_eq!(durations.work_minutes(), 1);
        assert_eq!(durations.break_minutes(), 30);
        assert_eq!(settings.tick(), Duration::from_millis(MIN_TICK_MS));
    }
}
