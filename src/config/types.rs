//! Raw configuration types for TOML parsing

use super::*;
use serde::Deserialize;

/// Raw configuration as parsed from TOML
#[derive(Debug, Deserialize)]
pub struct RawConfig {
    pub api: Option<RawApiConfig>,
    pub credentials: Option<RawCredentialsConfig>,
    pub logging: Option<RawLoggingConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawApiConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secure: Option<bool>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl TryFrom<RawApiConfig> for ApiConfig {
    type Error = ConfigError;

    fn try_from(raw: RawApiConfig) -> Result<Self, Self::Error> {
        let defaults = ApiConfig::default();

        let host = raw.host.unwrap_or(defaults.host);
        if host.trim().is_empty() {
            return Err(ConfigError::Invalid("api.host must not be empty".to_string()));
        }

        Ok(Self {
            host,
            port: raw.port.unwrap_or(defaults.port),
            secure: raw.secure.unwrap_or(defaults.secure),
            user_agent: raw.user_agent.unwrap_or(defaults.user_agent),
            timeout: raw
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawCredentialsConfig {
    pub path: Option<String>,
    pub max_attempts: Option<u32>,
}

impl TryFrom<RawCredentialsConfig> for CredentialsConfig {
    type Error = ConfigError;

    fn try_from(raw: RawCredentialsConfig) -> Result<Self, Self::Error> {
        let max_attempts = raw.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "credentials.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            file_path: raw
                .path
                .map(|p| expand_home(&p))
                .unwrap_or_else(Config::default_credentials_path),
            max_attempts,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawLoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl TryFrom<RawLoggingConfig> for LoggingConfig {
    type Error = ConfigError;

    fn try_from(raw: RawLoggingConfig) -> Result<Self, Self::Error> {
        let format = match raw.format.as_deref() {
            Some("pretty") | None => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown log format: {}",
                    other
                )))
            }
        };

        Ok(Self {
            level: raw.level.unwrap_or_else(|| LoggingConfig::default().level),
            format,
        })
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
