//! Runtime configuration shared by the connection and the store.

use crate::types::{
    AriaError, DEFAULT_API_URL, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY,
    DEFAULT_STATUS_POLL_INTERVAL, DEFAULT_TIMEOUT, DEFAULT_WS_URL, Result,
};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_API_URL: &str = "ARIA_API_URL";
pub const ENV_WS_URL: &str = "ARIA_WS_URL";
pub const ENV_TIMEOUT_MS: &str = "ARIA_TIMEOUT_MS";
pub const ENV_MAX_RECONNECT_ATTEMPTS: &str = "ARIA_MAX_RECONNECT_ATTEMPTS";
pub const ENV_RECONNECT_DELAY_MS: &str = "ARIA_RECONNECT_DELAY_MS";
pub const ENV_SETTINGS_PATH: &str = "ARIA_SETTINGS_PATH";

#[derive(Debug, Clone)]
pub struct AriaConfig {
    /// Backend base URL, without the `/api` prefix
    pub api_url: String,
    /// WebSocket base URL, without the event stream path
    pub ws_url: String,
    /// Bound on every REST call
    pub timeout: Duration,
    /// Reconnect attempts before the connection gives up
    pub max_reconnect_attempts: u32,
    /// Delay before the first reconnect attempt; doubles on each further one
    pub reconnect_delay: Duration,
    pub status_poll_interval: Duration,
    /// Settings file override. `None` resolves under the user config dir.
    pub settings_path: Option<PathBuf>,
}

impl Default for AriaConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY),
            status_poll_interval: Duration::from_millis(DEFAULT_STATUS_POLL_INTERVAL),
            settings_path: None,
        }
    }
}

impl AriaConfig {
    /// Build a config from `ARIA_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config.api_url = url;
        }
        if let Some(url) = lookup(ENV_WS_URL) {
            config.ws_url = url;
        }
        if let Some(ms) = lookup(ENV_TIMEOUT_MS) {
            config.timeout = Duration::from_millis(parse_number(ENV_TIMEOUT_MS, &ms)?);
        }
        if let Some(n) = lookup(ENV_MAX_RECONNECT_ATTEMPTS) {
            config.max_reconnect_attempts = parse_number(ENV_MAX_RECONNECT_ATTEMPTS, &n)?;
        }
        if let Some(ms) = lookup(ENV_RECONNECT_DELAY_MS) {
            config.reconnect_delay =
                Duration::from_millis(parse_number(ENV_RECONNECT_DELAY_MS, &ms)?);
        }
        if let Some(path) = lookup(ENV_SETTINGS_PATH) {
            config.settings_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    pub fn with_reconnect(mut self, delay: Duration, max_attempts: u32) -> Self {
        self.reconnect_delay = delay;
        self.max_reconnect_attempts = max_attempts;
        self
    }

    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AriaError::Connection(format!("{} must be a number, got '{}'", key, raw)))
}
