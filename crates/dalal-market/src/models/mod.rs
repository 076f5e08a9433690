//! Data types shared by the gateway and the pipeline

pub mod period;
pub mod quote;
pub mod series;
pub mod statement;

pub use period::{Interval, Period};
pub use quote::QuoteInfo;
pub use series::{Bar, HistoricalSeries, IndicatorColumn};
pub use statement::{FinancialStatement, Frequency, LineItem, StatementKind};
