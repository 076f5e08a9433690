//! Indicator, performance and view assembly
//!
//! Pure computations over fetched data plus the `Dashboard` that orchestrates
//! them per request.

pub mod context;
pub mod dashboard;
pub mod financials;
pub mod indicators;
pub mod performance;
pub mod result;

pub use context::PriceRequest;
pub use dashboard::Dashboard;
pub use financials::{CapitalStructure, capital_structure};
pub use indicators::{IndicatorSpec, compute_indicators};
pub use performance::{ComparisonTable, PeriodChange, compare, normalize, summarize};
pub use result::{
    ComparisonView, FinancialsReport, IndexOverview, IndexSnapshot, PriceReport,
    PriceView, SymbolView,
};
