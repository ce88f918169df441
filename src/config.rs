//! Configuration management for the assistant stream client
//!
//! Configuration is loaded from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API base URL, e.g. `http://localhost:8000/api/v1`
    pub api_url: String,
    /// Bearer token attached to every request
    pub api_token: Option<String>,
    /// Tenant scope sent as `X-Tenant-ID`
    pub tenant_id: Option<String>,

    /// Connect timeout for new connections (in seconds)
    pub connect_timeout_seconds: u64,
    /// Inactivity window for a running stream (in seconds, 0 disables)
    pub stream_idle_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api/v1".to_string(),
            api_token: None,
            tenant_id: None,
            connect_timeout_seconds: 10,
            stream_idle_timeout_seconds: 120,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            api_url: env::var("ASSISTANT_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_token: env::var("ASSISTANT_API_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
            tenant_id: env::var("ASSISTANT_TENANT_ID")
                .ok()
                .filter(|v| !v.is_empty()),

            connect_timeout_seconds: env::var("ASSISTANT_CONNECT_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| defaults.connect_timeout_seconds.to_string())
                .parse()
                .context("Invalid ASSISTANT_CONNECT_TIMEOUT_SECONDS")?,
            stream_idle_timeout_seconds: env::var("ASSISTANT_STREAM_IDLE_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| defaults.stream_idle_timeout_seconds.to_string())
                .parse()
                .context("Invalid ASSISTANT_STREAM_IDLE_TIMEOUT_SECONDS")?,
        })
    }

    /// Create a config for the given base URL with all other defaults
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Idle timeout as a duration, `None` when disabled
    pub fn stream_idle_timeout(&self) -> Option<Duration> {
        match self.stream_idle_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}
