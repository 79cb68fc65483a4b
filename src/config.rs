use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SETTINGS_FILE: &str = "settings.toml";
pub const PROFILE_FILE: &str = "profile.toml";
pub const DEFAULT_ANALOG_LIMIT: f32 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Engine-wide knobs. Every field has a default, so an empty file is valid.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Raw analog components are clamped into [-analog_limit, analog_limit]
    pub analog_limit: f32,
    /// Deadzone applied by hardware backends to sticks and triggers
    pub joystick_deadzone: f32,
    /// Emit a statistics summary every n ticks, 0 disables it
    pub stats_interval_ticks: u64,
    pub log_level: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            analog_limit: DEFAULT_ANALOG_LIMIT,
            joystick_deadzone: 0.05,
            stats_interval_ticks: 0,
            log_level: "info".to_string(),
        }
    }
}

impl EngineSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks the numeric ranges that deserialization cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.analog_limit.is_finite() && self.analog_limit > 0.0) {
            return Err(SettingsError::Invalid {
                field: "analog_limit",
                reason: format!("must be a positive finite number, got {}", self.analog_limit),
            });
        }
        if !(0.0..1.0).contains(&self.joystick_deadzone) {
            return Err(SettingsError::Invalid {
                field: "joystick_deadzone",
                reason: format!("must be in [0, 1), got {}", self.joystick_deadzone),
            });
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        debug!("Loading engine settings from {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads `settings.toml` from `dir`, falling back to defaults when it does not exist.
    pub fn load_or_default(dir: &Path) -> Result<Self, SettingsError> {
        let path = dir.join(SETTINGS_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            info!("No settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

/// `<config dir>/padbind`, or the working directory when the platform has none.
pub fn default_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("padbind"))
        .unwrap_or_else(|| PathBuf::from("."))
}
