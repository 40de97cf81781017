use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::DEFAULT_ATHLETE_ID;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::logging::LogConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Identifier sent with every export
    pub athlete_id: u32,

    /// Directory holding the local database and exports
    pub data_dir: PathBuf,

    /// Number of history entries retained
    pub history_capacity: usize,

    /// Remote prediction service settings
    pub predictor: PredictorSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Remote prediction service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorSettings {
    /// Submit exports to the prediction service
    pub enabled: bool,

    /// Full URL of the prediction endpoint
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            athlete_id: DEFAULT_ATHLETE_ID,
            data_dir: default_data_dir(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            predictor: PredictorSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for PredictorSettings {
    fn default() -> Self {
        PredictorSettings {
            enabled: true,
            endpoint: "http://127.0.0.1:8000/predict-risk".to_string(),
            timeout_secs: 10,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("riskradar")
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.check()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".riskradar")
            .join("config.toml")
    }

    /// Load configuration from `path`, falling back to defaults when it is missing or invalid
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                if config_path.exists() {
                    eprintln!("Ignoring invalid config {}: {:#}", config_path.display(), e);
                }
                Self::default()
            }
        }
    }

    /// Path of the SQLite database inside the data directory
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("riskradar.db")
    }

    fn check(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(anyhow!("history_capacity must be at least 1"));
        }
        if self.predictor.timeout_secs == 0 {
            return Err(anyhow!("predictor.timeout_secs must be at least 1"));
        }
        Ok(())
    }

    /// Read a setting by dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "athlete_id" => self.athlete_id.to_string(),
            "data_dir" => self.data_dir.display().to_string(),
            "history_capacity" => self.history_capacity.to_string(),
            "predictor.enabled" => self.predictor.enabled.to_string(),
            "predictor.endpoint" => self.predictor.endpoint.clone(),
            "predictor.timeout_secs" => self.predictor.timeout_secs.to_string(),
            "logging.level" => self.logging.level.as_str().to_string(),
            "logging.format" => self.logging.format.as_str().to_string(),
            "logging.file" => self
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => return Err(anyhow!("Unknown configuration key: {}", key)),
        };
        Ok(value)
    }

    /// Update a setting by dotted key
    ///
    /// The config is left unchanged when the value is rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        updated.apply(key, value)?;
        updated.check()?;
        *self = updated;
        Ok(())
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "athlete_id" => {
                self.athlete_id = value
                    .parse()
                    .with_context(|| format!("Invalid athlete_id: {}", value))?
            }
            "data_dir" => self.data_dir = PathBuf::from(value),
            "history_capacity" => {
                self.history_capacity = value
                    .parse()
                    .with_context(|| format!("Invalid history_capacity: {}", value))?
            }
            "predictor.enabled" => {
                self.predictor.enabled = value
                    .parse()
                    .with_context(|| format!("Invalid predictor.enabled: {}", value))?
            }
            "predictor.endpoint" => self.predictor.endpoint = value.to_string(),
            "predictor.timeout_secs" => {
                self.predictor.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid predictor.timeout_secs: {}", value))?
            }
            "logging.level" => self.logging.level = value.parse().map_err(|e: String| anyhow!(e))?,
            "logging.format" => self.logging.format = value.parse().map_err(|e: String| anyhow!(e))?,
            "logging.file" => {
                self.logging.file = (!value.is_empty()).then(|| PathBuf::from(value))
            }
            _ => return Err(anyhow!("Unknown configuration key: {}", key)),
        }
        Ok(())
    }

    /// All settable keys with their current values
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        [
            "athlete_id",
            "data_dir",
            "history_capacity",
            "predictor.enabled",
            "predictor.endpoint",
            "predictor.timeout_secs",
            "logging.level",
            "logging.format",
            "logging.file",
        ]
        .into_iter()
        .filter_map(|key| self.get(key).ok().map(|value| (key, value)))
        .collect()
    }
}
