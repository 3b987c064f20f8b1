//! Configuration system for dop
//!
//! Loads configuration from a TOML file; every section is optional.

mod types;

pub use types::*;

use crate::credentials::DEFAULT_MAX_ATTEMPTS;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

/// Default API host
pub const API_HOST: &str = "api.digitalocean.com";

/// Default API port
pub const API_PORT: u16 = 443;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main dop configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// API endpoint configuration
    pub api: ApiConfig,
    /// Credential file configuration
    pub credentials: CredentialsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Load an optional configuration file.
    ///
    /// A missing file gives the defaults. A file that fails to load also gives
    /// the defaults, along with the error so the caller can report it.
    pub async fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<ConfigError>) {
        match Self::load(path).await {
            Ok(config) => (config, None),
            Err(ConfigError::NotFound(_)) => (Self::default(), None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load configuration from a string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Self::from_raw(raw)
    }

    /// Convert from raw TOML config to validated config
    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            api: raw.api.unwrap_or_default().try_into()?,
            credentials: raw.credentials.unwrap_or_default().try_into()?,
            logging: raw.logging.unwrap_or_default().try_into()?,
        })
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dop")
            .join("config.toml")
    }

    /// Get the default credential file path
    pub fn default_credentials_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dop")
            .join("credentials.json")
    }
}

/// API endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Use https
    pub secure: bool,
    pub user_agent: String,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Scheme, host and (non-default) port, e.g. `https://api.digitalocean.com`
    pub fn base_url(&self) -> String {
        let protocol = if self.secure { "https://" } else { "http://" };
        let default_port = if self.secure { 443 } else { 80 };
        // 80 is never spelled out, even over https
        if self.port == default_port || self.port == 80 {
            format!("{}{}", protocol, self.host)
        } else {
            format!("{}{}:{}", protocol, self.host, self.port)
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: API_HOST.to_string(),
            port: API_PORT,
            secure: true,
            user_agent: "dop/client".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Credential file configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialsConfig {
    pub file_path: PathBuf,
    /// Password attempts before giving up
    pub max_attempts: u32,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            file_path: Config::default_credentials_path(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Format: "json" or "pretty"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format
    Pretty,
    /// JSON format
    Json,
}
