//! Engine configuration

use std::env;
use std::time::Duration;

use url::Url;

use crate::core::PovertyGuidelines;
use crate::error::{EngineError, EngineResult};

pub const DEFAULT_AFFORDABILITY_BASE_URL: &str = "https://api.ideonapi.com";

/// Settings for the external affordability service
#[derive(Debug, Clone, PartialEq)]
pub struct AffordabilityApiConfig {
    pub api_key: String,
    pub base_url: Url,
    /// Minimum spacing between two requests
    pub min_delay: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub request_timeout: Duration,
    /// How long a finished calculation stays reusable within its run
    pub calculation_ttl: Duration,
    /// Named rating-area location (e.g. "work"); the member's ZIP is sent otherwise
    pub rating_location: Option<String>,
}

impl AffordabilityApiConfig {
    pub fn new(api_key: impl Into<String>, base_url: Url) -> Self {
        Self {
            api_key: api_key.into(),
            base_url,
            min_delay: Duration::from_millis(700),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_millis(8000),
            poll_interval: Duration::from_millis(1500),
            poll_timeout: Duration::from_millis(60_000),
            request_timeout: Duration::from_millis(15_000),
            calculation_ttl: Duration::from_secs(15 * 60),
            rating_location: None,
        }
    }

    /// Read `AFFORDABILITY_*` variables. `Ok(None)` when no API key is set.
    pub fn from_env() -> EngineResult<Option<Self>> {
        let api_key = match env::var("AFFORDABILITY_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => return Ok(None),
        };

        let base_url = env::var("AFFORDABILITY_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_AFFORDABILITY_BASE_URL.to_string());
        let base_url = Url::parse(&base_url)
            .map_err(|e| EngineError::config(format!("AFFORDABILITY_BASE_URL: {e}")))?;

        let mut config = Self::new(api_key, base_url);
        config.min_delay = env_millis("AFFORDABILITY_MIN_DELAY_MS", config.min_delay)?;
        config.max_retries = env_number("AFFORDABILITY_MAX_RETRIES", config.max_retries)?;
        config.initial_backoff =
            env_millis("AFFORDABILITY_INITIAL_BACKOFF_MS", config.initial_backoff)?;
        config.poll_interval = env_millis("AFFORDABILITY_POLL_INTERVAL_MS", config.poll_interval)?;
        config.poll_timeout = env_millis("AFFORDABILITY_POLL_TIMEOUT_MS", config.poll_timeout)?;
        config.request_timeout =
            env_millis("AFFORDABILITY_REQUEST_TIMEOUT_MS", config.request_timeout)?;
        config.rating_location = env::var("AFFORDABILITY_RATING_LOCATION")
            .ok()
            .filter(|value| !value.trim().is_empty());

        Ok(Some(config))
    }
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> EngineResult<T> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| EngineError::config(format!("{name} = {value}"))),
        Err(_) => Ok(default),
    }
}

fn env_millis(name: &str, default: Duration) -> EngineResult<Duration> {
    let millis = env_number(name, default.as_millis() as u64)?;
    Ok(Duration::from_millis(millis))
}

/// Settings of the quote pipeline itself
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on one member's external affordability determination
    pub provider_timeout: Duration,
    /// Member pipelines run concurrently within one batch
    pub max_concurrency: usize,
    pub guidelines: PovertyGuidelines,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(90),
            max_concurrency: 8,
            guidelines: PovertyGuidelines::builtin(),
        }
    }
}

impl EngineConfig {
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_guidelines(mut self, guidelines: PovertyGuidelines) -> Self {
        self.guidelines = guidelines;
        self
    }
}
