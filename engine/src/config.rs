//! Client configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DATA_DIR: &str = "./budgetbox-data";
const DEFAULT_REMOTE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the client keeps its record and how it reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Directory of the file-backed local store
    pub data_dir: PathBuf,
    /// Base URL of the budget server
    pub remote_url: String,
    /// Bearer token presented to the budget server
    pub auth_token: Option<String>,
    /// Per-request timeout for remote calls
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            auth_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from `BUDGETBOX_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("BUDGETBOX_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let remote_url = lookup("BUDGETBOX_REMOTE_URL").unwrap_or(defaults.remote_url);
        if !remote_url.starts_with("http://") && !remote_url.starts_with("https://") {
            return Err(ConfigError::InvalidRemoteUrl(remote_url));
        }

        let auth_token = lookup("BUDGETBOX_AUTH_TOKEN").filter(|token| !token.is_empty());

        let timeout = match lookup("BUDGETBOX_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout(raw))?,
            None => defaults.timeout,
        };

        Ok(Self {
            data_dir,
            remote_url,
            auth_token,
            timeout,
        })
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("BUDGETBOX_REMOTE_URL must be an http(s) URL, got {0:?}")]
    InvalidRemoteUrl(String),

    #[error("BUDGETBOX_TIMEOUT_SECS must be a positive integer, got {0:?}")]
    InvalidTimeout(String),
}
