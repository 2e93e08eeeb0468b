use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::provider::firebase::DEFAULT_NODE;
use crate::recommend::model::DEFAULT_MODEL_CONFIDENCE;
use crate::trends::forecast::DEFAULT_HORIZONS_HOURS;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_DATASTORE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_HISTORY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub classifier: Option<ClassifierSettings>,
    #[serde(default)]
    pub datastore: Option<DatastoreSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub forecast: Option<ForecastSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierSettings {
    /// Classifier artifact JSON; empty or missing runs the expert rules only
    pub path: Option<PathBuf>,
    /// Confidence reported when the classifier has no probabilities (default: 85)
    pub default_confidence: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatastoreSection {
    /// Base URL of the realtime database
    pub url: String,
    /// Node holding the sensor log (default: /sensor_logs.json)
    pub node: Option<String>,
    /// Timeout for the latest-reading query (default: 5)
    pub timeout_secs: Option<u64>,
    /// Timeout for the full-history query (default: 10)
    pub history_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
    /// Refresh interval in seconds for the datastore poll (default: 30)
    pub refresh_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastSection {
    /// Forecast horizons in hours (default: [24, 72])
    pub horizons_hours: Option<Vec<u32>>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    pub fn classifier_path(&self) -> Option<&Path> {
        let path = self.classifier.as_ref()?.path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    pub fn default_confidence(&self) -> f64 {
        self.classifier
            .as_ref()
            .and_then(|c| c.default_confidence)
            .filter(|c| c.is_finite())
            .unwrap_or(DEFAULT_MODEL_CONFIDENCE)
    }

    /// Returns the datastore URL, or None if not configured or empty
    pub fn datastore_url(&self) -> Option<&str> {
        self.datastore
            .as_ref()
            .map(|d| d.url.trim())
            .filter(|url| !url.is_empty())
    }

    pub fn datastore_node(&self) -> &str {
        self.datastore
            .as_ref()
            .and_then(|d| d.node.as_deref())
            .unwrap_or(DEFAULT_NODE)
    }

    pub fn datastore_timeout(&self) -> Duration {
        let secs = self
            .datastore
            .as_ref()
            .and_then(|d| d.timeout_secs)
            .unwrap_or(DEFAULT_DATASTORE_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn history_timeout(&self) -> Duration {
        let secs = self
            .datastore
            .as_ref()
            .and_then(|d| d.history_timeout_secs)
            .unwrap_or(DEFAULT_HISTORY_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Returns the refresh interval as Duration (default: 30 seconds)
    pub fn refresh_interval(&self) -> Duration {
        let secs = self
            .server
            .as_ref()
            .and_then(|s| s.refresh_interval_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    /// Returns the forecast horizons in hours, dropping zero entries
    pub fn forecast_horizons(&self) -> Vec<u32> {
        let horizons: Vec<u32> = self
            .forecast
            .as_ref()
            .and_then(|f| f.horizons_hours.clone())
            .unwrap_or_else(|| DEFAULT_HORIZONS_HOURS.to_vec())
            .into_iter()
            .filter(|hours| *hours > 0)
            .collect();
        if horizons.is_empty() {
            DEFAULT_HORIZONS_HOURS.to_vec()
        } else {
            horizons
        }
    }
}
