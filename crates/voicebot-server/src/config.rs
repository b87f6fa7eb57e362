//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;
use voicebot_collekto::CollektoConfig;
use voicebot_llm::LlmConfig;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Azure OpenAI realtime settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Collekto backend settings, including the mock switch.
    #[serde(default)]
    pub collekto: CollektoConfig,

    /// In-memory call session settings.
    #[serde(default)]
    pub sessions: SessionsConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "voicebot_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionsConfig {
    /// Seconds an ended call stays queryable before eviction. `0` keeps
    /// sessions for the life of the process.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    9000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_retention_secs() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
        }
    }
}

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    /// A required secret is absent or blank.
    #[error("missing required secret {0}")]
    MissingSecret(&'static str),
}

pub const ENV_LLM_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_LLM_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_COLLEKTO_USERNAME: &str = "COLLEKTO_USERNAME";
pub const ENV_COLLEKTO_PASSWORD: &str = "COLLEKTO_PASSWORD";
pub const ENV_MOCK_COLLEKTO: &str = "MOCK_COLLEKTO_API";

/// Parses a boolean-like flag. Blank counts as `false`.
pub fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}

/// Loads configuration from a TOML file and the process environment.
///
/// See [`load_config_with_env`] for the override list.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// an override has an invalid value.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |name| std::env::var(name).ok())
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies overrides looked up through `env`.
///
/// Environment variable overrides:
/// - `VOICEBOT_HOST`, `VOICEBOT_PORT` override `server.host` / `server.port`
/// - `VOICEBOT_LOG_LEVEL`, `VOICEBOT_LOG_JSON` override `logging.*`
/// - `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`,
///   `AZURE_OPENAI_DEPLOYMENT`, `AZURE_OPENAI_API_VERSION` override `llm.*`
/// - `COLLEKTO_USERNAME`, `COLLEKTO_PASSWORD`, `COLLEKTO_BASE_URL`,
///   `COLLEKTO_MOCK_DATA_PATH` override `collekto.*`
/// - `MOCK_COLLEKTO_API` overrides `collekto.mock`
pub fn load_config_with_env<F>(path: Option<&str>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Some(host) = env("VOICEBOT_HOST") {
        config.server.host = host.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: "VOICEBOT_HOST",
            value: host.clone(),
        })?;
    }
    if let Some(port) = env("VOICEBOT_PORT") {
        config.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: "VOICEBOT_PORT",
            value: port.clone(),
        })?;
    }
    if let Some(level) = env("VOICEBOT_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("VOICEBOT_LOG_JSON") {
        config.logging.json = parse_flag("VOICEBOT_LOG_JSON", &json)?;
    }

    if let Some(endpoint) = env(ENV_LLM_ENDPOINT) {
        config.llm.endpoint = endpoint;
    }
    if let Some(key) = env(ENV_LLM_API_KEY) {
        config.llm.api_key = key;
    }
    if let Some(deployment) = env("AZURE_OPENAI_DEPLOYMENT") {
        config.llm.deployment = deployment;
    }
    if let Some(version) = env("AZURE_OPENAI_API_VERSION") {
        config.llm.api_version = version;
    }

    if let Some(username) = env(ENV_COLLEKTO_USERNAME) {
        config.collekto.username = username;
    }
    if let Some(password) = env(ENV_COLLEKTO_PASSWORD) {
        config.collekto.password = password;
    }
    if let Some(base_url) = env("COLLEKTO_BASE_URL") {
        config.collekto.base_url = base_url;
    }
    if let Some(path) = env("COLLEKTO_MOCK_DATA_PATH") {
        config.collekto.mock_data_path = Some(PathBuf::from(path));
    }
    if let Some(mock) = env(ENV_MOCK_COLLEKTO) {
        config.collekto.mock = parse_flag(ENV_MOCK_COLLEKTO, &mock)?;
    }

    Ok(config)
}

impl Config {
    /// Refuses configurations the server must not start with.
    ///
    /// The LLM endpoint and key are always required. Collekto credentials
    /// are required unless mock mode is on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingSecret(ENV_LLM_ENDPOINT));
        }
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::MissingSecret(ENV_LLM_API_KEY));
        }
        if self.llm.realtime_url().is_err() {
            return Err(ConfigError::InvalidValue {
                name: ENV_LLM_ENDPOINT,
                value: self.llm.endpoint.clone(),
            });
        }

        if !self.collekto.mock && !self.collekto.has_credentials() {
            let missing = if self.collekto.username.trim().is_empty() {
                ENV_COLLEKTO_USERNAME
            } else {
                ENV_COLLEKTO_PASSWORD
            };
            return Err(ConfigError::MissingSecret(missing));
        }

        Ok(())
    }
}
