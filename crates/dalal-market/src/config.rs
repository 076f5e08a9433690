//! Configuration for the market data pipeline

use crate::error::{DashError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// NSE listing of derivative-eligible underlyings and their market lots
pub const DEFAULT_FNO_LIST_URL: &str = "https://archives.nseindia.com/content/fo/fo_mktlots.csv";

/// Yahoo Finance query host used for quote summaries and fundamentals
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Upper bound on attempts per provider call
pub const MAX_RETRIES: u32 = 10;

/// Longest wait between two attempts
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// Configuration for the market data pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashConfig {
    /// Cache TTL for quote info, price history and financial statements
    pub cache_ttl_market: Duration,

    /// Cache TTL for the derivative-universe listing
    pub cache_ttl_universe: Duration,

    /// Maximum number of symbols processed per request
    pub max_symbols: usize,

    /// Allowed range for the custom indicator window
    pub custom_window_min: usize,
    pub custom_window_max: usize,

    /// Window substituted for `SMA_X` / `EMA_X` when none is given
    pub default_custom_window: usize,

    /// Maximum number of retries for provider calls
    pub max_retries: u32,

    /// Initial backoff duration for retries
    pub retry_backoff_base: Duration,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// Provider requests allowed per minute
    pub requests_per_minute: u32,

    /// Yahoo Finance query host
    pub yahoo_base_url: String,

    /// Derivative-universe CSV location
    pub fno_list_url: String,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            cache_ttl_market: Duration::from_secs(3600),     // 1 hour
            cache_ttl_universe: Duration::from_secs(86_400), // 1 day
            max_symbols: 10,
            custom_window_min: 10,
            custom_window_max: 200,
            default_custom_window: 30,
            max_retries: 3,
            retry_backoff_base: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
            requests_per_minute: 60,
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            fno_list_url: DEFAULT_FNO_LIST_URL.to_string(),
        }
    }
}

impl DashConfig {
    /// Create a new configuration builder
    pub fn builder() -> DashConfigBuilder {
        DashConfigBuilder::default()
    }

    /// Apply `DALAL_*` environment overrides
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("DALAL_FNO_URL") {
            self.fno_list_url = url;
        }
        if let Ok(rpm) = std::env::var("DALAL_REQUESTS_PER_MINUTE") {
            self.requests_per_minute = rpm.parse().map_err(|_| {
                DashError::ConfigError(format!("DALAL_REQUESTS_PER_MINUTE is not a number: {rpm}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_symbols == 0 {
            return Err(DashError::ConfigError(
                "max_symbols must be greater than 0".to_string(),
            ));
        }

        if self.custom_window_min == 0 || self.custom_window_min > self.custom_window_max {
            return Err(DashError::ConfigError(format!(
                "invalid custom window range {}..={}",
                self.custom_window_min, self.custom_window_max
            )));
        }

        if !self.custom_window_range().contains(&self.default_custom_window) {
            return Err(DashError::ConfigError(format!(
                "default custom window {} outside {}..={}",
                self.default_custom_window, self.custom_window_min, self.custom_window_max
            )));
        }

        if self.max_retries == 0 || self.max_retries > MAX_RETRIES {
            return Err(DashError::ConfigError(format!(
                "max_retries must be between 1 and {MAX_RETRIES}"
            )));
        }

        if self.requests_per_minute == 0 {
            return Err(DashError::ConfigError(
                "requests_per_minute must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn custom_window_range(&self) -> RangeInclusive<usize> {
        self.custom_window_min..=self.custom_window_max
    }

    /// Exponential backoff for attempt number, capped at [`MAX_RETRY_BACKOFF`]
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        2_u32
            .checked_pow(attempt)
            .and_then(|factor| self.retry_backoff_base.checked_mul(factor))
            .map_or(MAX_RETRY_BACKOFF, |backoff| backoff.min(MAX_RETRY_BACKOFF))
    }
}

/// Builder for DashConfig
#[derive(Debug, Default)]
pub struct DashConfigBuilder {
    cache_ttl_market: Option<Duration>,
    cache_ttl_universe: Option<Duration>,
    max_symbols: Option<usize>,
    default_custom_window: Option<usize>,
    max_retries: Option<u32>,
    retry_backoff_base: Option<Duration>,
    request_timeout: Option<Duration>,
    requests_per_minute: Option<u32>,
    yahoo_base_url: Option<String>,
    fno_list_url: Option<String>,
}

impl DashConfigBuilder {
    /// Set cache TTL for quotes, history and statements
    pub fn cache_ttl_market(mut self, duration: Duration) -> Self {
        self.cache_ttl_market = Some(duration);
        self
    }

    /// Set cache TTL for the derivative universe
    pub fn cache_ttl_universe(mut self, duration: Duration) -> Self {
        self.cache_ttl_universe = Some(duration);
        self
    }

    pub fn max_symbols(mut self, max: usize) -> Self {
        self.max_symbols = Some(max);
        self
    }

    pub fn default_custom_window(mut self, window: usize) -> Self {
        self.default_custom_window = Some(window);
        self
    }

    /// Set maximum retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set retry backoff base duration
    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.retry_backoff_base = Some(duration);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    pub fn requests_per_minute(mut self, rpm: u32) -> Self {
        self.requests_per_minute = Some(rpm);
        self
    }

    pub fn yahoo_base_url(mut self, url: impl Into<String>) -> Self {
        self.yahoo_base_url = Some(url.into());
        self
    }

    pub fn fno_list_url(mut self, url: impl Into<String>) -> Self {
        self.fno_list_url = Some(url.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<DashConfig> {
        let defaults = DashConfig::default();

        let config = DashConfig {
            cache_ttl_market: self.cache_ttl_market.unwrap_or(defaults.cache_ttl_market),
            cache_ttl_universe: self.cache_ttl_universe.unwrap_or(defaults.cache_ttl_universe),
            max_symbols: self.max_symbols.unwrap_or(defaults.max_symbols),
            custom_window_min: defaults.custom_window_min,
            custom_window_max: defaults.custom_window_max,
            default_custom_window: self
                .default_custom_window
                .unwrap_or(defaults.default_custom_window),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_backoff_base: self.retry_backoff_base.unwrap_or(defaults.retry_backoff_base),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            requests_per_minute: self.requests_per_minute.unwrap_or(defaults.requests_per_minute),
            yahoo_base_url: self.yahoo_base_url.unwrap_or(defaults.yahoo_base_url),
            fno_list_url: self.fno_list_url.unwrap_or(defaults.fno_list_url),
        };

        config.validate()?;
        Ok(config)
    }
}
