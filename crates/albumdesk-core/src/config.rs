//! Configuration module
//!
//! Environment-driven settings shared by the API client, the polling
//! synchronizer, and the CLI.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8001";
const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Runtime configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the order backend.
    pub api_base_url: String,
    /// Interval between order/user list refreshes. Observed production
    /// dashboards poll every 3-5 seconds.
    pub poll_interval_ms: u64,
    /// Per-request timeout for backend calls.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from the environment: `ALBUMDESK_API_URL`,
    /// `ALBUMDESK_POLL_INTERVAL_MS`, `ALBUMDESK_REQUEST_TIMEOUT_SECS`.
    /// Missing variables fall back to defaults; unparseable values are errors.
    pub fn from_env() -> Result<Self> {
        let api_base_url = env::var("ALBUMDESK_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let poll_interval_ms = match env::var("ALBUMDESK_POLL_INTERVAL_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("ALBUMDESK_POLL_INTERVAL_MS must be an integer")?,
            Err(_) => DEFAULT_POLL_INTERVAL_MS,
        };

        let request_timeout_secs = match env::var("ALBUMDESK_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("ALBUMDESK_REQUEST_TIMEOUT_SECS must be an integer")?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            api_base_url,
            poll_interval_ms,
            request_timeout_secs,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
