//! Configuration for the gaze session recorder.

use crate::gaze::frame::ReferenceFrameMode;
use crate::gaze::raycast::CollisionMask;
use crate::gaze::types::{ConfidencePolicy, DEFAULT_OUT_OF_SIGHT};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Main configuration for a recording session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory session files are written under
    pub log_root: PathBuf,

    /// Activity name, used as the session sub-directory
    pub activity: String,

    /// Period of the fixed tick (sync counter, continuous logging)
    #[serde(with = "duration_secs")]
    pub fixed_timestep: Duration,

    /// Period of the render tick (tracker polling, timers)
    #[serde(with = "duration_secs")]
    pub render_interval: Duration,

    /// Directory for cumulative recording statistics
    pub data_path: PathBuf,

    pub gaze: GazeConfig,

    pub loggers: LoggersConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gaze-session-recorder");

        Self {
            log_root: data_dir.join("logs"),
            activity: "session".to_string(),
            fixed_timestep: Duration::from_millis(20),
            render_interval: Duration::from_secs_f64(1.0 / 90.0),
            data_path: data_dir,
            gaze: GazeConfig::default(),
            loggers: LoggersConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, or the defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gaze-session-recorder")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.log_root).map_err(|e| ConfigError::Io(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fixed_timestep.is_zero() || self.render_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "tick intervals must be greater than zero".to_string(),
            ));
        }
        self.gaze.validate()?;
        for logger in [&self.loggers.gaze, &self.loggers.quiz, &self.loggers.rating] {
            logger.validate()?;
        }
        Ok(())
    }
}

/// Settings for the gaze sampler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Minimum per-eye confidence for a tick to be fused
    pub confidence_threshold: f32,
    pub confidence_policy: ConfidencePolicy,
    pub reference_frame: ReferenceFrameMode,
    /// Layers the gaze ray may hit
    pub collision_mask: CollisionMask,
    /// Blend weight toward a new hit point
    pub smoothing: f32,
    /// Target position reported when the ray hits nothing
    pub out_of_sight: Vec3,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            confidence_policy: ConfidencePolicy::Min,
            reference_frame: ReferenceFrameMode::WorldSpace,
            collision_mask: CollisionMask::ALL,
            smoothing: 0.5,
            out_of_sight: DEFAULT_OUT_OF_SIGHT,
        }
    }
}

impl GazeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(ConfigError::Invalid(format!(
                "smoothing {} is outside [0, 1]",
                self.smoothing
            )));
        }
        Ok(())
    }
}

/// Per-logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Overrides the session log root
    pub log_root: Option<PathBuf>,
    /// Overrides the session activity
    pub activity: Option<String>,
    /// Overrides the file-name user, which defaults to the subject id
    pub username: Option<String>,
    /// Tag appended to the file name
    pub data_type: String,
    #[serde(with = "duration_secs")]
    pub write_interval: Duration,
    /// Delay before the header and first recordable tick
    #[serde(with = "duration_secs")]
    pub start_delay: Duration,
    /// Log one line every fixed tick instead of on explicit events
    pub continuous: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_root: None,
            activity: None,
            username: None,
            data_type: "data".to_string(),
            write_interval: Duration::from_secs(1),
            start_delay: Duration::ZERO,
            continuous: false,
        }
    }
}

impl LoggerConfig {
    pub fn gaze() -> Self {
        Self {
            data_type: "gaze".to_string(),
            continuous: true,
            ..Default::default()
        }
    }

    pub fn quiz() -> Self {
        Self {
            data_type: "quiz".to_string(),
            ..Default::default()
        }
    }

    pub fn rating() -> Self {
        Self {
            data_type: "Rating".to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.write_interval.is_zero() {
            return Err(ConfigError::Invalid(format!(
                "{} logger write_interval must be greater than zero",
                self.data_type
            )));
        }
        if self.data_type.is_empty() {
            return Err(ConfigError::Invalid("data_type must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggersConfig {
    pub gaze: LoggerConfig,
    pub quiz: LoggerConfig,
    pub rating: LoggerConfig,
}

impl Default for LoggersConfig {
    fn default() -> Self {
        Self {
            gaze: LoggerConfig::gaze(),
            quiz: LoggerConfig::quiz(),
            rating: LoggerConfig::rating(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration as fractional seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "duration must be a non-negative number of seconds, got {secs}"
            )));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
