//! Memoized access to market data
//!
//! Every call is cached by its full argument tuple. Results are cached as
//! returned, failures included, so a failing call keeps failing until its
//! entry expires or is invalidated through [`MarketDataGateway::invalidate`].

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::MarketDataProvider;
use crate::api::nse;
use crate::cache::{CacheKey, TtlCache};
use crate::config::DashConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::models::{FinancialStatement, Frequency, HistoricalSeries, Interval, Period, QuoteInfo, StatementKind};
use crate::symbol::Symbol;

/// A gateway call for one symbol, minus the symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchRequest {
    Info,
    History { period: Period, interval: Interval },
    Statement { kind: StatementKind, frequency: Frequency },
}

impl FetchRequest {
    fn cache_key(&self, symbol: &Symbol) -> CacheKey {
        match self {
            FetchRequest::Info => CacheKey::new(symbol.as_canonical(), "info", json!({})),
            FetchRequest::History { period, interval } => CacheKey::new(
                symbol.as_canonical(),
                "history",
                json!({ "period": period, "interval": interval }),
            ),
            FetchRequest::Statement { kind, frequency } => CacheKey::new(
                symbol.as_canonical(),
                "statement",
                json!({ "kind": kind, "frequency": frequency }),
            ),
        }
    }
}

/// A gateway call that failed, kept so a refresh can target exactly it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub symbol: Symbol,
    pub request: FetchRequest,
    pub error: GatewayError,
}

impl FetchFailure {
    pub fn new(symbol: &Symbol, request: FetchRequest, error: GatewayError) -> Self {
        Self {
            symbol: symbol.clone(),
            request,
            error,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.symbol, self.error)
    }
}

/// Read-through cache over a `MarketDataProvider`
pub struct MarketDataGateway {
    provider: Arc<dyn MarketDataProvider>,
    info: TtlCache<GatewayResult<QuoteInfo>>,
    history: TtlCache<GatewayResult<HistoricalSeries>>,
    statements: TtlCache<GatewayResult<FinancialStatement>>,
    universe: TtlCache<Vec<String>>,
}

impl MarketDataGateway {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &DashConfig) -> Self {
        Self {
            provider,
            info: TtlCache::new(config.cache_ttl_market),
            history: TtlCache::new(config.cache_ttl_market),
            statements: TtlCache::new(config.cache_ttl_market),
            universe: TtlCache::new(config.cache_ttl_universe),
        }
    }

    pub async fn get_info(&self, symbol: &Symbol) -> GatewayResult<QuoteInfo> {
        let canonical = symbol.as_canonical();
        self.info
            .get_or_insert_with(FetchRequest::Info.cache_key(symbol), || {
                self.provider.fetch_info(&canonical)
            })
            .await
    }

    pub async fn get_history(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> GatewayResult<HistoricalSeries> {
        let canonical = symbol.as_canonical();
        let key = FetchRequest::History { period, interval }.cache_key(symbol);
        self.history
            .get_or_insert_with(key, || async {
                let series = self.provider.fetch_history(&canonical, period, interval).await?;
                if series.is_empty() {
                    return Err(GatewayError::empty(&canonical, "price history"));
                }
                Ok(series)
            })
            .await
    }

    pub async fn get_statement(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
        frequency: Frequency,
    ) -> GatewayResult<FinancialStatement> {
        let canonical = symbol.as_canonical();
        let key = FetchRequest::Statement { kind, frequency }.cache_key(symbol);
        self.statements
            .get_or_insert_with(key, || async {
                let statement = self.provider.fetch_statement(&canonical, kind, frequency).await?;
                if statement.is_empty() {
                    return Err(GatewayError::empty(&canonical, format!("{frequency} {kind}")));
                }
                Ok(statement)
            })
            .await
    }

    pub async fn get_balance_sheet(
        &self,
        symbol: &Symbol,
        frequency: Frequency,
    ) -> GatewayResult<FinancialStatement> {
        self.get_statement(symbol, StatementKind::BalanceSheet, frequency)
            .await
    }

    pub async fn get_income_statement(
        &self,
        symbol: &Symbol,
        frequency: Frequency,
    ) -> GatewayResult<FinancialStatement> {
        self.get_statement(symbol, StatementKind::IncomeStatement, frequency)
            .await
    }

    pub async fn get_cash_flow(
        &self,
        symbol: &Symbol,
        frequency: Frequency,
    ) -> GatewayResult<FinancialStatement> {
        self.get_statement(symbol, StatementKind::CashFlow, frequency)
            .await
    }

    /// Derivative-eligible symbols, or the fallback list when the listing is unavailable
    pub async fn derivative_universe(&self) -> Vec<String> {
        let key = CacheKey::new("*", "derivative_universe", json!({}));
        self.universe
            .get_or_insert_with(key, || async {
                match self.provider.fetch_derivative_universe().await {
                    Ok(symbols) if !symbols.is_empty() => symbols,
                    Ok(_) => {
                        warn!("Derivative listing is empty, using fallback symbols");
                        nse::fallback_symbols()
                    }
                    Err(e) => {
                        warn!("Derivative listing unavailable ({e}), using fallback symbols");
                        nse::fallback_symbols()
                    }
                }
            })
            .await
    }

    /// Drop the cached result of exactly one call. Returns whether an entry existed.
    pub async fn invalidate(&self, symbol: &Symbol, request: FetchRequest) -> bool {
        let key = request.cache_key(symbol);
        debug!(?key, "Invalidating cache entry");
        match request {
            FetchRequest::Info => self.info.invalidate(&key).await,
            FetchRequest::History { .. } => self.history.invalidate(&key).await,
            FetchRequest::Statement { .. } => self.statements.invalidate(&key).await,
        }
    }

    /// Drop every cached result
    pub async fn clear(&self) {
        self.info.clear().await;
        self.history.clear().await;
        self.statements.clear().await;
        self.universe.clear().await;
    }
}
