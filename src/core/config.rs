//! Project configuration from `.gtt/config.yaml`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::project::Project;

/// Written by `gtt init`
pub const DEFAULT_CONFIG: &str = r#"# Gauge tracking configuration
database: .gtt/gauges.db
blob_dir: .gtt/certificates
calibration:
  default_validity_days: 365
  expiry_warning_days: 30
"#;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Calibration program settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Validity applied when an upload gives no expiry
    pub default_validity_days: u32,

    /// Window used by the calibration-due report
    pub expiry_warning_days: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            default_validity_days: 365,
            expiry_warning_days: 30,
        }
    }
}

/// Top-level project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database path, relative to the project root
    pub database: PathBuf,

    /// Certificate file storage, relative to the project root
    pub blob_dir: PathBuf,

    /// Default actor when `--as` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    pub calibration: CalibrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(".gtt/gauges.db"),
            blob_dir: PathBuf::from(".gtt/certificates"),
            author: None,
            calibration: CalibrationConfig::default(),
        }
    }
}

impl Config {
    /// Load the project's config, falling back to defaults if absent
    pub fn load(project: &Project) -> Result<Self, ConfigError> {
        let path = project.gtt_dir().join("config.yaml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|message| ConfigError::Parse { path, message })
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(content).map_err(|e| e.to_string())
    }

    /// Resolve the actor: explicit flag, then config, then `$USER`
    pub fn actor(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| self.author.clone())
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "unknown".to_string())
    }
}
