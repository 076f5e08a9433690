//! Ticker resolution
//!
//! Free-text input is mapped to a canonical [`Symbol`] in a fixed order:
//! index alias table, already-canonical input, NSE listing, BSE listing.
//! Exchange probes go through the memoized gateway, so the info record of an
//! accepted symbol is already cached when the view asks for it. Probes that
//! failed are cached too and reported in the selection so they can be
//! invalidated one by one.

use dalal_utils::dedup_preserving_order;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::ResolutionError;
use crate::gateway::{FetchFailure, FetchRequest, MarketDataGateway};
use crate::indices;
use crate::symbol::{Exchange, Symbol};

/// Uppercase and trim raw ticker input
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Split comma-separated ticker input, dropping blank entries
pub fn split_tickers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|ticker| !ticker.is_empty())
        .map(str::to_string)
        .collect()
}

/// Raised when more tickers were entered than a view displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationNotice {
    pub requested: usize,
    pub kept: usize,
}

impl fmt::Display for TruncationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Only the first {} of {} symbols are shown",
            self.kept, self.requested
        )
    }
}

/// Distinct resolved symbols of a multi-symbol request, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSelection {
    pub symbols: Vec<Symbol>,
    pub truncated: Option<TruncationNotice>,
    pub unresolved: Vec<ResolutionError>,
    /// Exchange probes whose info call failed
    pub failures: Vec<FetchFailure>,
}

impl PortfolioSelection {
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Maps user input to canonical symbols
pub struct SymbolResolver {
    gateway: Arc<MarketDataGateway>,
}

impl SymbolResolver {
    pub fn new(gateway: Arc<MarketDataGateway>) -> Self {
        Self { gateway }
    }

    pub async fn resolve(&self, raw: &str) -> Result<Symbol, ResolutionError> {
        self.resolve_with_failures(raw).await.0
    }

    /// Like [`Self::resolve`], also returning the probes that failed
    async fn resolve_with_failures(
        &self,
        raw: &str,
    ) -> (Result<Symbol, ResolutionError>, Vec<FetchFailure>) {
        let input = normalize(raw);
        if input.is_empty() {
            return (Err(ResolutionError::new(raw)), Vec::new());
        }

        if let Some(code) = indices::index_code(&input) {
            return (Ok(Symbol::index(code)), Vec::new());
        }

        if let Some(symbol) = Symbol::parse_canonical(&input) {
            return (Ok(symbol), Vec::new());
        }

        let mut failures = Vec::new();
        for exchange in Exchange::PROBE_ORDER {
            let candidate = Symbol::equity(input.as_str(), exchange);
            match self.gateway.get_info(&candidate).await {
                Ok(info) if info.is_valid_instrument() => {
                    debug!(%candidate, "Resolved {input}");
                    return (Ok(candidate), failures);
                }
                Ok(_) => debug!(%candidate, "Probe returned no instrument"),
                Err(e) => {
                    debug!(%candidate, "Probe failed: {e}");
                    failures.push(FetchFailure::new(&candidate, FetchRequest::Info, e));
                }
            }
        }

        (Err(ResolutionError::new(input)), failures)
    }

    /// Resolve a list of tickers into at most `max_symbols` distinct symbols.
    ///
    /// Raw tickers are deduplicated and truncated before any probe; entries
    /// that fail to resolve are reported instead of aborting the selection.
    pub async fn select<S: AsRef<str>>(
        &self,
        raw_tickers: &[S],
        max_symbols: usize,
    ) -> PortfolioSelection {
        let mut tickers = dedup_preserving_order(
            raw_tickers
                .iter()
                .map(|ticker| normalize(ticker.as_ref()))
                .filter(|ticker| !ticker.is_empty()),
        );

        let truncated = (tickers.len() > max_symbols).then(|| TruncationNotice {
            requested: tickers.len(),
            kept: max_symbols,
        });
        tickers.truncate(max_symbols);

        let resolved = join_all(
            tickers
                .iter()
                .map(|ticker| self.resolve_with_failures(ticker)),
        )
        .await;

        let mut symbols = Vec::new();
        let mut unresolved = Vec::new();
        let mut failures = Vec::new();
        for (outcome, probe_failures) in resolved {
            match outcome {
                Ok(symbol) => symbols.push(symbol),
                Err(e) => unresolved.push(e),
            }
            failures.extend(probe_failures);
        }

        PortfolioSelection {
            symbols: dedup_preserving_order(symbols),
            truncated,
            unresolved,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::provider::MockMarketDataProvider;
    use crate::config::DashConfig;
    use crate::error::GatewayError;
    use crate::models::QuoteInfo;

    fn equity_info() -> QuoteInfo {
        QuoteInfo {
            quote_type: Some("EQUITY".to_string()),
            ..Default::default()
        }
    }

    fn resolver(mock: MockMarketDataProvider) -> SymbolResolver {
        let gateway = MarketDataGateway::new(Arc::new(mock), &DashConfig::default());
        SymbolResolver::new(Arc::new(gateway))
    }

    /// Every `.NS` listing exists except `BOGUS`, nothing else does
    fn nse_only() -> MockMarketDataProvider {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_info().returning(|symbol| {
            if symbol.ends_with(".NS") && !symbol.starts_with("BOGUS") {
                Ok(equity_info())
            } else {
                Err(GatewayError::provider(symbol, "not found"))
            }
        });
        mock
    }

    #[test]
    fn test_split_tickers() {
        assert_eq!(
            split_tickers(" reliance, TCS ,,^NSEI, "),
            vec!["reliance", "TCS", "^NSEI"]
        );
        assert!(split_tickers(" , ").is_empty());
    }

    #[tokio::test]
    async fn test_index_alias_needs_no_provider() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_info().never();

        let resolver = resolver(mock);
        let nifty = resolver.resolve(" nifty ").await.unwrap();
        let nifty50 = resolver.resolve("NIFTY50").await.unwrap();
        assert_eq!(nifty, Symbol::index("^NSEI"));
        assert_eq!(nifty, nifty50);
        assert_eq!(
            resolver.resolve("banknifty").await.unwrap(),
            Symbol::index("^NSEBANK")
        );
    }

    #[tokio::test]
    async fn test_canonical_input_is_idempotent() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_info().never();

        let resolver = resolver(mock);
        for input in ["RELIANCE.NS", "500325.BO", "^CNXIT"] {
            let once = resolver.resolve(input).await.unwrap();
            let twice = resolver.resolve(&once.as_canonical()).await.unwrap();
            assert_eq!(once, twice);
            assert_eq!(once.as_canonical(), input);
        }
    }

    #[tokio::test]
    async fn test_nse_probe_accepted() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_info()
            .withf(|symbol| symbol == "RELIANCE.NS")
            .times(1)
            .returning(|_| Ok(equity_info()));

        let resolver = resolver(mock);
        let symbol = resolver.resolve("reliance").await.unwrap();
        assert_eq!(symbol, Symbol::equity("RELIANCE", Exchange::Nse));

        // second resolution is served by the gateway cache
        assert_eq!(resolver.resolve("RELIANCE").await.unwrap(), symbol);
    }

    #[tokio::test]
    async fn test_bse_fallback() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_info()
            .withf(|symbol| symbol == "SMALLCO.NS")
            .times(1)
            .returning(|_| Ok(QuoteInfo::default()));
        mock.expect_fetch_info()
            .withf(|symbol| symbol == "SMALLCO.BO")
            .times(1)
            .returning(|_| Ok(equity_info()));

        let resolver = resolver(mock);
        assert_eq!(
            resolver.resolve("smallco").await.unwrap(),
            Symbol::equity("SMALLCO", Exchange::Bse)
        );
    }

    #[tokio::test]
    async fn test_unknown_ticker_fails() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_info()
            .times(2)
            .returning(|symbol| Err(GatewayError::provider(symbol, "not found")));

        let resolver = resolver(mock);
        let err = resolver.resolve("xyz123").await.unwrap_err();
        assert_eq!(err.input, "XYZ123");
    }

    #[tokio::test]
    async fn test_empty_input_fails_without_probe() {
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_info().never();

        let resolver = resolver(mock);
        assert!(resolver.resolve("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_select_truncates_to_limit() {
        let resolver = resolver(nse_only());
        let tickers: Vec<String> = (1..=12).map(|i| format!("STOCK{i}")).collect();

        let selection = resolver.select(&tickers, 10).await;
        assert_eq!(selection.symbols.len(), 10);
        assert_eq!(selection.symbols[0].as_canonical(), "STOCK1.NS");
        assert_eq!(selection.symbols[9].as_canonical(), "STOCK10.NS");
        assert_eq!(
            selection.truncated,
            Some(TruncationNotice {
                requested: 12,
                kept: 10
            })
        );
    }

    #[tokio::test]
    async fn test_select_deduplicates_inputs_and_symbols() {
        let resolver = resolver(nse_only());
        let selection = resolver
            .select(&["tcs", "NIFTY", "TCS", "nifty50", "infy"], 10)
            .await;

        let canonical: Vec<String> = selection.symbols.iter().map(Symbol::as_canonical).collect();
        assert_eq!(canonical, vec!["TCS.NS", "^NSEI", "INFY.NS"]);
        assert!(selection.truncated.is_none());
        assert!(selection.unresolved.is_empty());
    }

    #[tokio::test]
    async fn test_select_reports_unresolved() {
        let resolver = resolver(nse_only());
        let selection = resolver.select(&["TCS", "bogus"], 10).await;

        assert_eq!(selection.symbols, vec![Symbol::equity("TCS", Exchange::Nse)]);
        assert_eq!(selection.unresolved, vec![ResolutionError::new("BOGUS")]);

        let probed: Vec<String> = selection
            .failures
            .iter()
            .map(|failure| failure.symbol.as_canonical())
            .collect();
        assert_eq!(probed, vec!["BOGUS.NS", "BOGUS.BO"]);
        assert!(selection.failures.iter().all(|f| f.request == FetchRequest::Info));
    }

    #[tokio::test]
    async fn test_failed_probes_can_be_invalidated() {
        let mut seq = mockall::Sequence::new();
        let mut mock = MockMarketDataProvider::new();
        mock.expect_fetch_info()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|symbol| Err(GatewayError::provider(symbol, "connection reset")));
        mock.expect_fetch_info()
            .withf(|symbol| symbol == "RELIANCE.NS")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(equity_info()));

        let gateway = Arc::new(MarketDataGateway::new(
            Arc::new(mock),
            &DashConfig::default(),
        ));
        let resolver = SymbolResolver::new(Arc::clone(&gateway));

        let first = resolver.select(&["RELIANCE"], 10).await;
        assert!(first.is_empty());
        assert_eq!(first.failures.len(), 2);

        // cached failures keep resolution failing without a provider call
        let cached = resolver.select(&["RELIANCE"], 10).await;
        assert_eq!(cached.unresolved, vec![ResolutionError::new("RELIANCE")]);

        for failure in &first.failures {
            assert!(gateway.invalidate(&failure.symbol, failure.request).await);
        }
        let retried = resolver.select(&["RELIANCE"], 10).await;
        assert_eq!(retried.symbols, vec![Symbol::equity("RELIANCE", Exchange::Nse)]);
        assert!(retried.failures.is_empty());
    }
}
