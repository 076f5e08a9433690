//! Indian market data pipeline
//!
//! Resolves free-text tickers to NSE/BSE listings or index codes, fetches
//! quotes, price history and financial statements through a memoized
//! gateway, and derives indicator and performance tables from them.
//!
//! - [`SymbolResolver`]: alias table, then `.NS`, then `.BO`
//! - [`MarketDataGateway`]: time-bounded cache over a [`MarketDataProvider`];
//!   failures are returned and cached as values
//! - [`engine`]: indicators (SMA, EMA, RSI, ATR, MACD, volume change),
//!   sub-period returns, normalized comparison, capital structure
//! - [`Dashboard`]: request-scoped assembly of the price, index and
//!   financials views
//!
//! # Example
//!
//! ```rust,ignore
//! use dalal_market::{Dashboard, DashConfig, PriceRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dashboard = Dashboard::with_yahoo(DashConfig::default())?;
//!
//!     let selection = dashboard.select(&["RELIANCE", "NIFTY"]).await;
//!     let report = dashboard.price_view(&selection, &PriceRequest::default()).await?;
//!     println!("{} failures", report.failures.len());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod indices;
pub mod models;
pub mod resolver;
pub mod symbol;

pub use api::{MarketDataProvider, YahooProvider};
pub use config::DashConfig;
pub use engine::{Dashboard, IndicatorSpec, PriceRequest};
pub use error::{DashError, GatewayError, GatewayResult, ResolutionError, Result};
pub use gateway::{FetchFailure, FetchRequest, MarketDataGateway};
pub use models::{
    FinancialStatement, Frequency, HistoricalSeries, Interval, Period, QuoteInfo, StatementKind,
};
pub use resolver::{PortfolioSelection, SymbolResolver};
pub use symbol::{Exchange, Symbol};
