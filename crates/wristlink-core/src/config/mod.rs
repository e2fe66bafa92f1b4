//! Configuration management for Wristlink.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/wristlink/config.toml` |
//! | macOS | `~/Library/Application Support/wristlink/config.toml` |
//! | Windows | `%APPDATA%\wristlink\config.toml` |
//!
//! Every section defaults, so a missing or partial file is fine.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration struct for Wristlink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Storage settings
    pub storage: StorageConfig,
    /// Demo pacing settings
    pub demo: DemoConfig,
}

/// General configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Display name for this device
    pub device_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            device_name: hostname::get().map_or_else(
                |_| "Wristlink Device".to_string(),
                |h| h.to_string_lossy().to_string(),
            ),
        }
    }
}

/// Storage configuration options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root for per-endpoint shared containers and inboxes.
    /// Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
}

/// Demo pacing options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Simulated latency per transfer progress step, in milliseconds
    pub transfer_step_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            transfer_step_ms: crate::DEFAULT_TRANSFER_STEP_MS,
        }
    }
}

impl DemoConfig {
    /// The per-step latency as a `Duration`.
    #[must_use]
    pub const fn transfer_step(&self) -> Duration {
        Duration::from_millis(self.transfer_step_ms)
    }
}

impl Config {
    /// Load configuration from the default path, or defaults if absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        toml::from_str(&raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to the default path, creating directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(&path, raw)?;
        Ok(())
    }

    /// The platform path of the configuration file.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "wristlink")
            .ok_or_else(|| Error::Config("cannot resolve a home directory".to_string()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Root directory for endpoint storage (containers and inboxes).
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage.data_dir {
            return Ok(dir.clone());
        }
        let dirs = ProjectDirs::from("", "", "wristlink")
            .ok_or_else(|| Error::Config("cannot resolve a home directory".to_string()))?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.general.device_name.is_empty());
        assert!(config.storage.data_dir.is_none());
        assert_eq!(
            config.demo.transfer_step(),
            Duration::from_millis(crate::DEFAULT_TRANSFER_STEP_MS)
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.general.device_name = "left wrist".to_string();
        config.demo.transfer_step_ms = 5;

        let raw = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.general.device_name, "left wrist");
        assert_eq!(parsed.demo.transfer_step_ms, 5);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[storage]\ndata_dir = \"/tmp/wl\"\n").unwrap();
        assert_eq!(parsed.storage.data_dir, Some(PathBuf::from("/tmp/wl")));
        assert_eq!(parsed.demo.transfer_step_ms, crate::DEFAULT_TRANSFER_STEP_MS);
        assert!(!parsed.general.device_name.is_empty());
    }
}
