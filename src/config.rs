use crate::error::{FlyerError, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 40;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// `None` polls until the task completes or the session is torn down.
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: Some(DEFAULT_POLL_MAX_ATTEMPTS),
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.max_attempts = None;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: Option<String>,
    pub request_timeout: Duration,
    pub poll: PollConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            base_url: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll: PollConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let base_url = env::var("FLYERGEN_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let request_timeout = env::var("FLYERGEN_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));

        let mut poll = PollConfig::default();
        if let Some(secs) = env::var("FLYERGEN_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            poll.interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = env::var("FLYERGEN_POLL_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            poll.max_attempts = if attempts == 0 { None } else { Some(attempts) };
        }

        ServiceConfig {
            base_url,
            request_timeout,
            poll,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn validated_base_url(&self) -> Result<String> {
        let url = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                FlyerError::Config("Generation service base URL is required".into())
            })?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FlyerError::Config(format!(
                "Base URL must start with http:// or https://, got {}",
                url
            )));
        }

        Ok(url.trim_end_matches('/').to_string())
    }
}
