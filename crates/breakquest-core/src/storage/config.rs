//! TOML-based application configuration.
//!
//! Stores the user-configurable session durations. Configuration is
//! stored at `~/.config/breakquest/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::engine::SessionSettings;
use crate::error::ConfigError;

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breakquest/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionSettings,
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from disk, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "session.work_minutes" => Some(self.session.work_minutes.to_string()),
            "session.break_minutes" => Some(self.session.break_minutes.to_string()),
            _ => None,
        }
    }

    /// Set a config value by key and save.
    ///
    /// Durations must be positive integers.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be
    /// parsed or validated, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "session.work_minutes" => self.session.work_minutes = Self::parse_minutes(key, value)?,
            "session.break_minutes" => {
                self.session.break_minutes = Self::parse_minutes(key, value)?
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        self.save()
    }

    fn parse_minutes(key: &str, value: &str) -> Result<u32, ConfigError> {
        let minutes: u32 = value.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse '{value}' as a number of minutes"),
        })?;
        if minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "duration must be positive".to_string(),
            });
        }
        Ok(minutes)
    }
}
