//! Configuration file support.
//!
//! Settings are stored as versioned JSON so hosts can export, import, and
//! persist them next to other per-user configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HISTORY_CAPACITY_BYTES, MAX_ZOOM, MIN_BOX_FRACTION, MIN_ZOOM, ZOOM_STEP,
};

/// Log level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// How the per-annotation commits of a save are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// One at a time, stopping at the first failure.
    #[default]
    Sequential,
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Zoom limits for the annotation canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f32,
}

fn default_min_zoom() -> f32 {
    MIN_ZOOM
}

fn default_max_zoom() -> f32 {
    MAX_ZOOM
}

fn default_zoom_step() -> f32 {
    ZOOM_STEP
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            zoom_step: default_zoom_step(),
        }
    }
}

impl ZoomConfig {
    /// Check that the zoom range is positive, finite, and ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom;
        if !(ordered && self.max_zoom.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "zoom",
                message: format!("bad range {}..{}", self.min_zoom, self.max_zoom),
            });
        }
        if !(self.zoom_step > 1.0 && self.zoom_step.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "zoom.zoom_step",
                message: format!("{} must be greater than 1", self.zoom_step),
            });
        }
        Ok(())
    }
}

/// Check that a minimum box side lies in `(0, 1)`.
fn validate_min_box_fraction(fraction: f32) -> Result<(), ConfigError> {
    if fraction > 0.0 && fraction < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: "min_box_fraction",
            message: format!("{} is not in (0, 1)", fraction),
        })
    }
}

/// Labeling configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelingConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Smallest accepted box side as a fraction of the image axis
    #[serde(default = "default_min_box_fraction")]
    pub min_box_fraction: f32,

    #[serde(default)]
    pub zoom: ZoomConfig,

    #[serde(default)]
    pub commit_policy: CommitPolicy,

    /// Byte budget for the labeling history cache
    #[serde(default = "default_history_capacity")]
    pub history_capacity_bytes: usize,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_min_box_fraction() -> f32 {
    MIN_BOX_FRACTION
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY_BYTES
}

impl LabelingConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            min_box_fraction: default_min_box_fraction(),
            zoom: ZoomConfig::default(),
            commit_policy: CommitPolicy::default(),
            history_capacity_bytes: default_history_capacity(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        config.validate()?;

        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_min_box_fraction(self.min_box_fraction)?;
        self.zoom.validate()
    }

    /// Get the default filename for config export.
    pub fn default_filename() -> &'static str {
        "weldlabel-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("weldlabel").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("weldlabel")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load_or_default(path: &std::path::Path) -> Self {
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Load configuration from the default path, or defaults.
    pub fn load_from_default_path() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to(&path)
    }
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// A value is outside its allowed range
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_defaults() {
        let config = LabelingConfig::default();
        let json = config.to_json().expect("serialize");
        assert_eq!(LabelingConfig::from_json(&json).expect("parse"), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = LabelingConfig::from_json(r#"{"version": 1}"#).expect("parse");
        assert_eq!(config.min_box_fraction, MIN_BOX_FRACTION);
        assert_eq!(config.commit_policy, CommitPolicy::Sequential);
        assert_eq!(config.zoom, ZoomConfig::default());
    }

    #[test]
    fn test_version_too_new() {
        let err = LabelingConfig::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::VersionTooNew {
                file_version: 99,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_min_box_fraction() {
        let err = LabelingConfig::from_json(r#"{"version": 1, "min_box_fraction": 0.0}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "min_box_fraction",
                ..
            }
        ));
    }

    #[test]
    fn test_zoom_range_checks() {
        assert!(ZoomConfig::default().validate().is_ok());
        let inverted = ZoomConfig {
            min_zoom: 5.0,
            max_zoom: 1.0,
            ..ZoomConfig::default()
        };
        assert!(inverted.validate().is_err());
        let nan = ZoomConfig {
            max_zoom: f32::NAN,
            ..ZoomConfig::default()
        };
        assert!(nan.validate().is_err());
        let flat_step = ZoomConfig {
            zoom_step: f32::NAN,
            ..ZoomConfig::default()
        };
        assert!(flat_step.validate().is_err());
    }

    #[test]
    fn test_log_level_parsing() {
        let config =
            LabelingConfig::from_json(r#"{"version": 1, "log_level": "debug"}"#).expect("parse");
        assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.json");
        let config = LabelingConfig {
            min_box_fraction: 0.02,
            ..LabelingConfig::default()
        };
        config.save_to(&path).expect("save");
        assert_eq!(LabelingConfig::load_or_default(&path), config);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").expect("write");
        assert_eq!(LabelingConfig::load_or_default(&path), LabelingConfig::default());
    }
}
