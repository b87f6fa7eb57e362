use crate::error::LlmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o-realtime-preview";
pub const DEFAULT_API_VERSION: &str = "2025-04-01-preview";
pub const DEFAULT_VOICE: &str = "alloy";

const REALTIME_PATH: &str = "/openai/realtime";

fn default_deployment() -> String {
    DEFAULT_DEPLOYMENT.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Azure OpenAI resource endpoint, e.g. `https://<resource>.openai.azure.com`.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_deployment")]
    pub deployment: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    /// WebSocket handshake timeout in seconds. Default: 10.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: default_deployment(),
            api_version: default_api_version(),
            voice: default_voice(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("voice", &self.voice)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl LlmConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.api_key.trim().is_empty()
    }

    /// Builds the realtime WebSocket URL for this deployment.
    ///
    /// `https` maps to `wss` and `http` to `ws`; any path on the endpoint is
    /// replaced by the realtime path.
    pub fn realtime_url(&self) -> Result<Url, LlmError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(LlmError::Config("LLM endpoint is empty".to_string()));
        }

        let mut url = Url::parse(endpoint)
            .map_err(|e| LlmError::Config(format!("invalid LLM endpoint {:?}: {}", endpoint, e)))?;

        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(LlmError::Config(format!(
                    "unsupported LLM endpoint scheme: {}",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| LlmError::Config(format!("cannot use scheme {} for endpoint", scheme)))?;
        url.set_path(REALTIME_PATH);
        url.query_pairs_mut()
            .clear()
            .append_pair("api-version", &self.api_version)
            .append_pair("deployment", &self.deployment);

        Ok(url)
    }
}
