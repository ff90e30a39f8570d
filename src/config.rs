//! Runtime configuration for the input bus
//!
//! Loaded from a TOML file. Every field has a default, so a missing file or a
//! partial file both produce a usable configuration.
//!
//! ```toml
//! [native]
//! poll_interval_ms = 4
//! discover_on_startup = true
//! joystick_deadzone = 0.05
//!
//! [game]
//! tick_rate_hz = 60
//!
//! [events]
//! backlog_warning = 1024
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub native: NativeSettings,
    pub game: GameLoopSettings,
    pub events: EventSettings,
}

/// Settings for the thread that owns native input handles
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NativeSettings {
    /// Sleep between two native ticks (command drain + hardware poll)
    pub poll_interval_ms: u64,

    /// Run one discovery pass before the first tick
    pub discover_on_startup: bool,

    /// Analog stick deadzone as a fraction (0.0-1.0), applied by gamepad backends
    pub joystick_deadzone: f32,
}

impl Default for NativeSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 4,
            discover_on_startup: true,
            joystick_deadzone: 0.05,
        }
    }
}

impl NativeSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GameLoopSettings {
    pub tick_rate_hz: u32,
}

impl Default for GameLoopSettings {
    fn default() -> Self {
        Self { tick_rate_hz: 60 }
    }
}

impl GameLoopSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_rate_hz.max(1)))
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EventSettings {
    /// Queue length above which posting an event logs a warning.
    /// The queue itself is unbounded.
    pub backlog_warning: usize,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            backlog_warning: 1024,
        }
    }
}

impl InputConfig {
    /// Parses and validates a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading input configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        let config: InputConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/inputbus/input.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("inputbus").join("input.toml"))
    }

    /// Loads the file at [`InputConfig::default_path`], falling back to defaults
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(Self::default_path().as_deref())
    }

    /// Falls back to defaults when `path` is absent, missing or invalid
    pub fn load_or_default_from(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("No config directory available, using default input configuration");
            return Self::default();
        };

        if !path.exists() {
            info!(
                "No input configuration at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => {
                info!("Loaded input configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring input configuration {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.tick_rate_hz == 0 {
            return Err(ConfigError::Invalid(
                "game.tick_rate_hz must be greater than zero".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.native.joystick_deadzone) {
            return Err(ConfigError::Invalid(format!(
                "native.joystick_deadzone must be in [0, 1), got {}",
                self.native.joystick_deadzone
            )));
        }
        if self.events.backlog_warning == 0 {
            return Err(ConfigError::Invalid(
                "events.backlog_warning must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
