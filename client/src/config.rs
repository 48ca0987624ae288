use std::path::PathBuf;

use crate::retry::RetryPolicy;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Environment variable overriding the API base address
pub const API_URL_ENV: &str = "STEPIN_API_URL";

/// Environment variable overriding where the session entry is persisted
pub const SESSION_FILE_ENV: &str = "STEPIN_SESSION_FILE";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub session_file: PathBuf,
    /// Policy applied to per-item detail fetches inside collection refreshes
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            session_file: default_session_file(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults for
    /// missing or blank values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();
        if let Some(url) = value(API_URL_ENV) {
            config.base_url = url;
        }
        if let Some(path) = value(SESSION_FILE_ENV) {
            config.session_file = PathBuf::from(path);
        }
        config
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn default_session_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("stepin")
        .join("session.json")
}
