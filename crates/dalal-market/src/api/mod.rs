//! Market data providers

pub mod nse;
pub mod provider;
pub mod yahoo;

pub use provider::MarketDataProvider;
pub use yahoo::YahooProvider;
