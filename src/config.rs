//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::chart::DEFAULT_CAPACITY;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub charts: ChartsConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sensor server connection
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_url")]
    pub url: String,

    /// Capacity of the event channel between connection and dashboard
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_url() -> String {
    "ws://127.0.0.1:8765/ws".to_string()
}

fn default_event_buffer() -> usize {
    crate::websocket::DEFAULT_EVENT_BUFFER
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Chart registry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChartsConfig {
    /// Series to chart, one chart each
    #[serde(default = "default_series")]
    pub series: Vec<String>,

    /// Samples kept per series
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Directory receiving the rendered charts
    #[serde(default = "default_container")]
    pub container: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_series() -> Vec<String> {
    ["heart_rate", "respiration_rate", "ecg", "breathing", "rr"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_container() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("sensordash").join("charts").to_string_lossy().to_string())
        .unwrap_or_else(|| "./charts".to_string())
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    240
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            series: default_series(),
            capacity: default_capacity(),
            container: default_container(),
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Simulated sensor feed server
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_host")]
    pub host: String,

    #[serde(default = "default_feed_port")]
    pub port: u16,

    /// Time between frames (ms)
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_feed_host() -> String {
    "127.0.0.1".to_string()
}

fn default_feed_port() -> u16 {
    8765
}

fn default_interval() -> u64 {
    1000 // 1 second, the Bioharness summary period
}

fn default_max_connections() -> usize {
    64
}

impl FeedConfig {
    /// Socket address to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            host: default_feed_host(),
            port: default_feed_port(),
            interval_ms: default_interval(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("sensordash").join("config.toml")),
            Some(PathBuf::from("/etc/sensordash/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SENSORDASH_URL") {
            self.connection.url = url;
        }

        if let Ok(series) = std::env::var("SENSORDASH_SERIES") {
            self.charts.series = parse_series_list(&series);
        }
        if let Ok(container) = std::env::var("SENSORDASH_CONTAINER") {
            self.charts.container = container;
        }

        if let Ok(host) = std::env::var("SENSORDASH_FEED_HOST") {
            self.feed.host = host;
        }
        if let Ok(port) = std::env::var("SENSORDASH_FEED_PORT") {
            if let Ok(p) = port.parse() {
                self.feed.port = p;
            }
        }

        if let Ok(level) = std::env::var("SENSORDASH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SENSORDASH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Split a comma-separated series list, dropping empty entries
pub fn parse_series_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# sensordash Configuration
#
# Environment variables override these settings:
# - SENSORDASH_URL
# - SENSORDASH_SERIES (comma separated)
# - SENSORDASH_CONTAINER
# - SENSORDASH_FEED_HOST
# - SENSORDASH_FEED_PORT
# - SENSORDASH_LOG_LEVEL
# - SENSORDASH_LOG_FORMAT

[connection]
# Sensor server WebSocket endpoint
url = "ws://127.0.0.1:8765/ws"

# Events buffered between the connection and the dashboard
event_buffer = 256

[charts]
# One chart per series name found in incoming frames
series = ["heart_rate", "respiration_rate", "ecg", "breathing", "rr"]

# Samples kept per chart
capacity = 1000

# Directory receiving <series>_chart.svg files
container = "./charts"

# Chart size in pixels
width = 800
height = 240

[feed]
# Simulated Bioharness feed server
host = "127.0.0.1"
port = 8765

# Time between frames (ms)
interval_ms = 1000

# Maximum connected dashboards
max_connections = 64

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
