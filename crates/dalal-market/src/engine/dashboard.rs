//! Dashboard orchestration
//!
//! Wires resolver, gateway, indicator engine and performance calculator
//! together for the price, index and financials views. Per-symbol failures
//! are collected into the report; one failing symbol never aborts a view.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{MarketDataProvider, YahooProvider};
use crate::config::DashConfig;
use crate::engine::context::{INDEX_TREND_INTERVAL, INDEX_TREND_PERIOD, PriceRequest};
use crate::engine::financials::capital_structure;
use crate::engine::indicators::compute_indicators;
use crate::engine::performance::{self, DEFAULT_FRACTIONS};
use crate::engine::result::{
    ComparisonView, FinancialsReport, IndexOverview, IndexSnapshot, PriceReport, PriceView,
    SymbolView,
};
use crate::error::{DashError, GatewayResult, Result};
use crate::gateway::{FetchFailure, FetchRequest, MarketDataGateway};
use crate::indices;
use crate::models::{Frequency, QuoteInfo, StatementKind};
use crate::resolver::{PortfolioSelection, SymbolResolver};
use crate::symbol::Symbol;

/// Entry point for every view
pub struct Dashboard {
    config: Arc<DashConfig>,
    gateway: Arc<MarketDataGateway>,
    resolver: SymbolResolver,
}

impl Dashboard {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: DashConfig) -> Self {
        let gateway = Arc::new(MarketDataGateway::new(provider, &config));
        Self {
            config: Arc::new(config),
            resolver: SymbolResolver::new(Arc::clone(&gateway)),
            gateway,
        }
    }

    /// Dashboard backed by Yahoo Finance
    pub fn with_yahoo(config: DashConfig) -> Result<Self> {
        config.validate()?;
        let provider = YahooProvider::new(Arc::new(config.clone()))?;
        Ok(Self::new(Arc::new(provider), config))
    }

    pub fn config(&self) -> &DashConfig {
        &self.config
    }

    pub fn gateway(&self) -> &MarketDataGateway {
        &self.gateway
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    /// Resolve raw tickers into a selection capped at the configured limit
    pub async fn select<S: AsRef<str>>(&self, raw_tickers: &[S]) -> PortfolioSelection {
        let selection = self.resolver.select(raw_tickers, self.config.max_symbols).await;
        if let Some(notice) = &selection.truncated {
            warn!("{notice}");
        }
        for error in &selection.unresolved {
            warn!("{error}");
        }
        selection
    }

    /// Single-symbol view with indicators, or a normalized comparison
    pub async fn price_view(
        &self,
        selection: &PortfolioSelection,
        request: &PriceRequest,
    ) -> Result<PriceReport> {
        request.validate()?;
        match selection.symbols.as_slice() {
            [] => Err(DashError::InvalidRequest(
                "select or enter at least one ticker".to_string(),
            )),
            [symbol] => self.single_view(symbol, request).await,
            symbols => Ok(self.comparison_view(symbols, request).await),
        }
    }

    async fn single_view(&self, symbol: &Symbol, request: &PriceRequest) -> Result<PriceReport> {
        let history_request = FetchRequest::History {
            period: request.period,
            interval: request.interval,
        };

        let info = match self.gateway.get_info(symbol).await {
            Ok(info) => info,
            Err(error) => {
                return Ok(failed_report(FetchFailure::new(symbol, FetchRequest::Info, error)));
            }
        };

        let series = match self
            .gateway
            .get_history(symbol, request.period, request.interval)
            .await
        {
            Ok(series) => series,
            Err(error) => {
                return Ok(failed_report(FetchFailure::new(symbol, history_request, error)));
            }
        };

        let series = compute_indicators(series, &request.indicator_specs())?;
        let summary = performance::summarize(&series, DEFAULT_FRACTIONS);
        info!(%symbol, bars = series.len(), columns = series.columns().len(), "Built price view");

        Ok(PriceReport {
            view: Some(PriceView::Single(Box::new(SymbolView {
                symbol: symbol.clone(),
                info,
                series,
                summary,
            }))),
            failures: Vec::new(),
        })
    }

    async fn comparison_view(&self, symbols: &[Symbol], request: &PriceRequest) -> PriceReport {
        let history_request = FetchRequest::History {
            period: request.period,
            interval: request.interval,
        };

        let fetched = join_all(symbols.iter().map(|symbol| async move {
            let (info, history) = futures::join!(
                self.gateway.get_info(symbol),
                self.gateway
                    .get_history(symbol, request.period, request.interval)
            );
            (symbol, info, history)
        }))
        .await;

        let mut view = ComparisonView::default();
        let mut series = Vec::new();
        let mut failures = Vec::new();

        for (symbol, info, history) in fetched {
            match info {
                Ok(info) => view.infos.push((symbol.clone(), info)),
                Err(error) => {
                    failures.push(FetchFailure::new(symbol, FetchRequest::Info, error));
                    continue;
                }
            }
            match history {
                Ok(history) => {
                    view.summaries.push((
                        symbol.clone(),
                        performance::summarize(&history, DEFAULT_FRACTIONS),
                    ));
                    series.push(history);
                }
                Err(error) => failures.push(FetchFailure::new(symbol, history_request, error)),
            }
        }

        view.table = performance::compare(&series);
        log_failures(&failures);
        info!(
            requested = symbols.len(),
            compared = series.len(),
            "Built comparison view"
        );

        PriceReport {
            view: Some(PriceView::Comparison(view)),
            failures,
        }
    }

    /// Latest level, change and six-month trend of each index
    pub async fn index_overview(&self, codes: &[Symbol]) -> IndexOverview {
        let fetched = join_all(codes.iter().map(|code| async move {
            futures::join!(
                self.gateway.get_info(code),
                self.gateway
                    .get_history(code, INDEX_TREND_PERIOD, INDEX_TREND_INTERVAL)
            )
        }))
        .await;

        let mut overview = IndexOverview::default();
        for (code, (info, history)) in codes.iter().zip(fetched) {
            match info {
                Ok(info) => overview.snapshots.push(index_snapshot(code, &info)),
                Err(error) => overview
                    .failures
                    .push(FetchFailure::new(code, FetchRequest::Info, error)),
            }
            match history {
                Ok(history) => overview.trends.push(history),
                Err(error) => overview.failures.push(FetchFailure::new(
                    code,
                    FetchRequest::History {
                        period: INDEX_TREND_PERIOD,
                        interval: INDEX_TREND_INTERVAL,
                    },
                    error,
                )),
            }
        }

        log_failures(&overview.failures);
        overview
    }

    /// Derivative-eligible stock symbols
    pub async fn derivative_universe(&self) -> Vec<String> {
        self.gateway.derivative_universe().await
    }

    /// Statements and capital structure of one company
    pub async fn financials_view(&self, symbol: &Symbol, frequency: Frequency) -> FinancialsReport {
        let (info, balance_sheet, income_statement, cash_flow) = futures::join!(
            self.gateway.get_info(symbol),
            self.gateway.get_balance_sheet(symbol, frequency),
            self.gateway.get_income_statement(symbol, frequency),
            self.gateway.get_cash_flow(symbol, frequency),
        );

        let mut failures = Vec::new();
        let canonical = symbol.as_canonical();
        let (name, currency) = match info {
            Ok(info) => (
                info.display_name(&canonical).to_string(),
                info.financial_currency_or_default().to_string(),
            ),
            Err(error) => {
                failures.push(FetchFailure::new(symbol, FetchRequest::Info, error));
                (canonical, QuoteInfo::default().financial_currency_or_default().to_string())
            }
        };

        let mut keep = |kind: StatementKind, result: GatewayResult<_>| match result {
            Ok(statement) => Some(statement),
            Err(error) => {
                failures.push(FetchFailure::new(
                    symbol,
                    FetchRequest::Statement { kind, frequency },
                    error,
                ));
                None
            }
        };
        let balance_sheet = keep(StatementKind::BalanceSheet, balance_sheet);
        let income_statement = keep(StatementKind::IncomeStatement, income_statement);
        let cash_flow = keep(StatementKind::CashFlow, cash_flow);

        let capital_structure = balance_sheet
            .as_ref()
            .map(capital_structure)
            .unwrap_or_default();

        log_failures(&failures);
        FinancialsReport {
            symbol: symbol.clone(),
            name,
            currency,
            frequency,
            balance_sheet,
            income_statement,
            cash_flow,
            capital_structure,
            failures,
        }
    }

    /// Drop the cached results of exactly the failed calls so the next view retries them
    pub async fn refresh_failures(&self, failures: &[FetchFailure]) -> usize {
        let mut invalidated = 0;
        for failure in failures {
            if self.gateway.invalidate(&failure.symbol, failure.request).await {
                invalidated += 1;
            }
        }
        info!(invalidated, "Refreshed failed requests");
        invalidated
    }

    /// Drop every cached result
    pub async fn refresh_all(&self) {
        self.gateway.clear().await;
        info!("Cleared market data cache");
    }
}

fn failed_report(failure: FetchFailure) -> PriceReport {
    warn!("{failure}");
    PriceReport {
        view: None,
        failures: vec![failure],
    }
}

fn log_failures(failures: &[FetchFailure]) {
    for failure in failures {
        warn!("{failure}");
    }
}

fn index_snapshot(code: &Symbol, info: &QuoteInfo) -> IndexSnapshot {
    let code = code.as_canonical();
    IndexSnapshot {
        name: indices::index_name(&code).unwrap_or(&code).to_string(),
        price: info.price(),
        change_percent: info.change_percent(),
        code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::indicators::IndicatorSpec;
    use crate::error::GatewayError;
    use crate::models::series::fixtures::daily_series;
    use crate::models::{FinancialStatement, HistoricalSeries, Interval, Period};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Provider serving fixed closes per symbol; unknown symbols fail
    #[derive(Default)]
    struct FakeProvider {
        closes: HashMap<String, Vec<f64>>,
        broken_history: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn with(mut self, symbol: &str, closes: &[f64]) -> Self {
            self.closes.insert(symbol.to_string(), closes.to_vec());
            self
        }

        fn with_broken_history(mut self, symbol: &str) -> Self {
            self.broken_history.push(symbol.to_string());
            self.with(symbol, &[1.0])
        }

        fn calls(&self, prefix: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|call| call.starts_with(prefix))
                .count()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl MarketDataProvider for FakeProvider {
        async fn fetch_info(&self, symbol: &str) -> GatewayResult<QuoteInfo> {
            self.record(format!("info:{symbol}"));
            let closes = self
                .closes
                .get(symbol)
                .ok_or_else(|| GatewayError::provider(symbol, "404 Not Found"))?;
            Ok(QuoteInfo {
                symbol: Some(symbol.to_string()),
                short_name: Some(format!("{symbol} Ltd")),
                quote_type: Some(if symbol.starts_with('^') { "INDEX" } else { "EQUITY" }.to_string()),
                regular_market_price: closes.last().copied(),
                previous_close: closes.iter().rev().nth(1).copied(),
                ..Default::default()
            })
        }

        async fn fetch_history(
            &self,
            symbol: &str,
            _period: Period,
            _interval: Interval,
        ) -> GatewayResult<HistoricalSeries> {
            self.record(format!("history:{symbol}"));
            if self.broken_history.iter().any(|s| s == symbol) {
                return Err(GatewayError::provider(symbol, "connection reset"));
            }
            let closes = self
                .closes
                .get(symbol)
                .ok_or_else(|| GatewayError::provider(symbol, "404 Not Found"))?;
            Ok(daily_series(symbol, closes))
        }

        async fn fetch_statement(
            &self,
            symbol: &str,
            kind: StatementKind,
            frequency: Frequency,
        ) -> GatewayResult<FinancialStatement> {
            self.record(format!("statement:{symbol}"));
            if kind == StatementKind::CashFlow {
                return Err(GatewayError::empty(symbol, "cash flow"));
            }
            let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
            let observations = vec![
                ("TotalDebt".to_string(), date, 400.0),
                ("StockholdersEquity".to_string(), date, 800.0),
                ("TotalRevenue".to_string(), date, 2_000.0),
            ];
            Ok(FinancialStatement::from_observations(
                symbol,
                kind,
                frequency,
                &observations,
            ))
        }

        async fn fetch_derivative_universe(&self) -> GatewayResult<Vec<String>> {
            Ok(self.closes.keys().filter(|s| s.ends_with(".NS")).cloned().collect())
        }
    }

    fn dashboard(provider: FakeProvider) -> (Dashboard, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let dashboard = Dashboard::new(
            Arc::clone(&provider) as Arc<dyn MarketDataProvider>,
            DashConfig::default(),
        );
        (dashboard, provider)
    }

    fn rising(n: u32) -> Vec<f64> {
        (1..=n).map(|i| 100.0 + f64::from(i)).collect()
    }

    #[tokio::test]
    async fn test_single_view_with_indicators() {
        let (dashboard, provider) = dashboard(FakeProvider::default().with("RELIANCE.NS", &rising(40)));

        let selection = dashboard.select(&["reliance"]).await;
        let request = PriceRequest::default()
            .with_indicators(vec![IndicatorSpec::Sma(20), IndicatorSpec::Rsi])
            .with_volume(true);

        let report = dashboard.price_view(&selection, &request).await.unwrap();
        assert!(report.failures.is_empty());
        let Some(PriceView::Single(view)) = report.view else {
            panic!("expected a single view");
        };

        assert_eq!(view.name(), "RELIANCE.NS Ltd");
        assert_eq!(view.series.len(), 40);
        assert!(view.series.column("SMA_20").is_some());
        assert!(view.series.column("Volume_Change_%").is_some());
        let rsi = view.series.column("RSI").unwrap();
        assert_eq!(rsi.values.len(), 40);
        assert!(rsi.values.iter().all(Option::is_none));
        assert_eq!(view.summary.len(), DEFAULT_FRACTIONS);

        // resolver probe and view share one cached info call
        assert_eq!(provider.calls("info:"), 1);
    }

    #[tokio::test]
    async fn test_comparison_skips_failed_symbol() {
        let (dashboard, _) = dashboard(
            FakeProvider::default()
                .with("TCS.NS", &rising(10))
                .with("INFY.NS", &rising(10))
                .with_broken_history("WIPRO.NS"),
        );

        let selection = dashboard.select(&["TCS", "WIPRO", "INFY"]).await;
        assert_eq!(selection.symbols.len(), 3);

        let report = dashboard
            .price_view(&selection, &PriceRequest::default())
            .await
            .unwrap();
        let Some(PriceView::Comparison(view)) = report.view else {
            panic!("expected a comparison view");
        };

        assert_eq!(view.table.columns.len(), 2);
        assert!(view.table.column("TCS.NS").is_some());
        assert!(view.table.column("INFY.NS").is_some());
        assert_eq!(view.infos.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].symbol.as_canonical(), "WIPRO.NS");
    }

    #[tokio::test]
    async fn test_refresh_failures_retries_only_failed_calls() {
        let (dashboard, provider) = dashboard(
            FakeProvider::default()
                .with("TCS.NS", &rising(10))
                .with_broken_history("WIPRO.NS"),
        );

        let selection = dashboard.select(&["TCS", "WIPRO"]).await;
        let request = PriceRequest::default();
        let report = dashboard.price_view(&selection, &request).await.unwrap();
        assert_eq!(provider.calls("history:"), 2);

        // still cached: no new provider call
        dashboard.price_view(&selection, &request).await.unwrap();
        assert_eq!(provider.calls("history:"), 2);

        assert_eq!(dashboard.refresh_failures(&report.failures).await, 1);
        dashboard.price_view(&selection, &request).await.unwrap();
        assert_eq!(provider.calls("history:WIPRO.NS"), 2);
        assert_eq!(provider.calls("history:TCS.NS"), 1);

        dashboard.refresh_all().await;
        dashboard.price_view(&selection, &request).await.unwrap();
        assert_eq!(provider.calls("history:TCS.NS"), 2);
    }

    #[tokio::test]
    async fn test_refresh_failures_reaches_failed_probes() {
        let (dashboard, provider) = dashboard(FakeProvider::default());

        let selection = dashboard.select(&["GHOST"]).await;
        assert!(selection.is_empty());
        assert_eq!(selection.failures.len(), 2);
        assert_eq!(provider.calls("info:"), 2);

        dashboard.select(&["GHOST"]).await;
        assert_eq!(provider.calls("info:"), 2);

        assert_eq!(dashboard.refresh_failures(&selection.failures).await, 2);
        dashboard.select(&["GHOST"]).await;
        assert_eq!(provider.calls("info:GHOST.NS"), 2);
        assert_eq!(provider.calls("info:GHOST.BO"), 2);
    }

    #[tokio::test]
    async fn test_single_view_reports_missing_symbol() {
        let (dashboard, _) = dashboard(FakeProvider::default());
        let selection = PortfolioSelection {
            symbols: vec![Symbol::parse_canonical("GHOST.NS").unwrap()],
            ..Default::default()
        };

        let report = dashboard
            .price_view(&selection, &PriceRequest::default())
            .await
            .unwrap();
        assert!(report.view.is_none());
        assert_eq!(report.failures[0].request, FetchRequest::Info);
    }

    #[tokio::test]
    async fn test_empty_selection_and_bad_interval() {
        let (dashboard, _) = dashboard(FakeProvider::default());
        let empty = PortfolioSelection::default();
        assert!(dashboard.price_view(&empty, &PriceRequest::default()).await.is_err());

        let selection = PortfolioSelection {
            symbols: vec![Symbol::index("^NSEI")],
            ..Default::default()
        };
        let request = PriceRequest::new(Period::OneDay).with_interval(Interval::OneDay);
        assert!(dashboard.price_view(&selection, &request).await.is_err());
    }

    #[tokio::test]
    async fn test_index_overview() {
        let (dashboard, _) = dashboard(
            FakeProvider::default()
                .with("^NSEI", &[22_000.0, 22_220.0])
                .with("^BSESN", &[73_000.0]),
        );

        let selection = dashboard.select(&["NIFTY 50", "SENSEX", "INDIA VIX"]).await;
        let overview = dashboard.index_overview(&selection.symbols).await;

        assert_eq!(overview.snapshots.len(), 2);
        assert_eq!(overview.snapshots[0].name, "NIFTY 50");
        assert_eq!(overview.snapshots[0].price, Some(22_220.0));
        assert!((overview.snapshots[0].change_percent.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(overview.trends.len(), 2);
        // INDIA VIX has neither info nor history
        assert_eq!(overview.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_financials_view() {
        let (dashboard, _) = dashboard(FakeProvider::default().with("RELIANCE.NS", &[2_900.0]));
        let symbol = Symbol::parse_canonical("RELIANCE.NS").unwrap();

        let report = dashboard.financials_view(&symbol, Frequency::Annual).await;
        assert_eq!(report.name, "RELIANCE.NS Ltd");
        assert_eq!(report.currency, "INR");
        assert!(report.balance_sheet.is_some());
        assert!(report.cash_flow.is_none());
        assert_eq!(report.statements().count(), 2);
        assert_eq!(report.capital_structure[0].debt_to_equity, Some(0.5));
        assert_eq!(
            report.failures[0].request,
            FetchRequest::Statement {
                kind: StatementKind::CashFlow,
                frequency: Frequency::Annual
            }
        );
    }

    #[tokio::test]
    async fn test_derivative_universe() {
        let (dashboard, _) = dashboard(FakeProvider::default().with("SBIN.NS", &[800.0]));
        assert_eq!(dashboard.derivative_universe().await, vec!["SBIN.NS"]);
    }
}
