//! Error types for the market data pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw input that could not be matched to an index alias or an exchange listing
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Could not identify an Indian market ticker for '{input}'")]
pub struct ResolutionError {
    pub input: String,
}

impl ResolutionError {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Failure of a single provider call.
///
/// Gateway results are memoized, failures included, so this type is `Clone`
/// and carries only owned strings.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GatewayError {
    /// Provider call failed (network, unknown symbol, malformed response)
    #[error("Provider error for {symbol}: {reason}")]
    Provider { symbol: String, reason: String },

    /// Provider refused the call because of request throttling
    #[error("Rate limit exceeded while fetching {symbol}")]
    RateLimited { symbol: String },

    /// Call succeeded but returned nothing usable
    #[error("No {what} available for {symbol}")]
    EmptyResult { symbol: String, what: String },
}

impl GatewayError {
    pub fn provider(symbol: impl Into<String>, reason: impl ToString) -> Self {
        Self::Provider {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }

    pub fn empty(symbol: impl Into<String>, what: impl Into<String>) -> Self {
        Self::EmptyResult {
            symbol: symbol.into(),
            what: what.into(),
        }
    }

    /// Symbol the failed call was issued for
    pub fn symbol(&self) -> &str {
        match self {
            Self::Provider { symbol, .. }
            | Self::RateLimited { symbol }
            | Self::EmptyResult { symbol, .. } => symbol,
        }
    }
}

/// Result of a gateway call
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Crate-level errors
#[derive(Debug, Error)]
pub enum DashError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Indicator selection could not be parsed
    #[error("Invalid indicator '{token}': {reason}")]
    InvalidIndicator { token: String, reason: String },

    /// Request parameters rejected before any fetch
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, DashError>;
