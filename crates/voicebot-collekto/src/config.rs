use crate::crypto::DEFAULT_ENCRYPTION_KEY;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default Collekto backend (UAT environment).
pub const DEFAULT_BASE_URL: &str = "https://backendcrmuat.ltfinance.com";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_encryption_key() -> String {
    DEFAULT_ENCRYPTION_KEY.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CollektoConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    /// AES-128 key shared with the Collekto front end for password encryption.
    #[serde(default = "default_encryption_key", skip_serializing)]
    pub encryption_key: String,
    /// Per-request timeout in seconds. Default: 10.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Serve canned data instead of calling the backend.
    #[serde(default)]
    pub mock: bool,
    /// CSV dataset for mock mode. The built-in dataset is used when unset.
    #[serde(default)]
    pub mock_data_path: Option<PathBuf>,
}

impl Default for CollektoConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: String::new(),
            password: String::new(),
            encryption_key: default_encryption_key(),
            timeout_secs: default_timeout_secs(),
            mock: false,
            mock_data_path: None,
        }
    }
}

impl fmt::Debug for CollektoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollektoConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("encryption_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .field("mock", &self.mock)
            .field("mock_data_path", &self.mock_data_path)
            .finish()
    }
}

impl CollektoConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Returns `true` when both login credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }
}
