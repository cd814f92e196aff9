//! Kiosk settings
//!
//! Read once at startup from a JSON file next to the executable. The
//! session keeps its own copy and never changes it at runtime.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::session::PlayZone;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read/write settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Kiosk tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Lock-in ===
    /// Seconds a candidate must stay in-zone before becoming primary
    pub lock_in_duration: f32,
    /// Show the progress ring while locking in
    pub visual_feedback: bool,

    // === Timeouts ===
    /// Seconds of absence before the kiosk returns to the menu.
    /// Also the hard ceiling on how long a result screen stays up.
    pub abandon_timeout: f32,
    /// Continuous tracking loss tolerated before it counts as absence
    pub recovery_grace_period: f32,
    /// Settle delay after startup before the warmup check
    pub warmup_duration: f32,

    // === Zone ===
    pub zone: PlayZone,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lock_in_duration: LOCK_IN_DURATION,
            visual_feedback: true,

            abandon_timeout: ABANDON_TIMEOUT,
            recovery_grace_period: RECOVERY_GRACE_PERIOD,
            warmup_duration: WARMUP_DURATION,

            zone: PlayZone::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults so the kiosk still boots
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("{err}; using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
