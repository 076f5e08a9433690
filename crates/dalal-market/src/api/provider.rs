//! Market data provider abstraction

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::models::{FinancialStatement, Frequency, HistoricalSeries, Interval, Period, QuoteInfo, StatementKind};

/// Raw access to an external market data source.
///
/// Implementations do no caching; `MarketDataGateway` memoizes on top.
/// Symbols are canonical provider strings (`RELIANCE.NS`, `^NSEI`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Instrument description and latest pricing
    async fn fetch_info(&self, symbol: &str) -> GatewayResult<QuoteInfo>;

    /// OHLCV history over `period` with bars of width `interval`
    async fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> GatewayResult<HistoricalSeries>;

    /// One financial statement
    async fn fetch_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        frequency: Frequency,
    ) -> GatewayResult<FinancialStatement>;

    /// Canonical symbols of derivative-eligible stocks
    async fn fetch_derivative_universe(&self) -> GatewayResult<Vec<String>>;
}
