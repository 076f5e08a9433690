//! View result types

use serde::{Deserialize, Serialize};

use crate::engine::financials::CapitalStructure;
use crate::engine::performance::{ComparisonTable, PeriodChange};
use crate::gateway::FetchFailure;
use crate::models::{FinancialStatement, Frequency, HistoricalSeries, QuoteInfo};
use crate::symbol::Symbol;

/// One instrument with its indicator columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolView {
    pub symbol: Symbol,
    pub info: QuoteInfo,
    pub series: HistoricalSeries,
    pub summary: Vec<PeriodChange>,
}

impl SymbolView {
    pub fn name(&self) -> String {
        let canonical = self.symbol.as_canonical();
        self.info.display_name(&canonical).to_string()
    }
}

/// Several instruments side by side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonView {
    /// Info of every symbol whose info call succeeded, in selection order
    pub infos: Vec<(Symbol, QuoteInfo)>,
    pub table: ComparisonTable,
    pub summaries: Vec<(Symbol, Vec<PeriodChange>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PriceView {
    Single(Box<SymbolView>),
    Comparison(ComparisonView),
}

/// A price view plus everything that went wrong building it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceReport {
    /// `None` when a single-symbol view could not be built at all
    pub view: Option<PriceView>,
    pub failures: Vec<FetchFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub name: String,
    pub code: String,
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexOverview {
    pub snapshots: Vec<IndexSnapshot>,
    pub trends: Vec<HistoricalSeries>,
    pub failures: Vec<FetchFailure>,
}

/// Statements and capital structure of one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialsReport {
    pub symbol: Symbol,
    pub name: String,
    /// Reporting currency
    pub currency: String,
    pub frequency: Frequency,
    pub balance_sheet: Option<FinancialStatement>,
    pub income_statement: Option<FinancialStatement>,
    pub cash_flow: Option<FinancialStatement>,
    pub capital_structure: Vec<CapitalStructure>,
    pub failures: Vec<FetchFailure>,
}

impl FinancialsReport {
    pub fn statements(&self) -> impl Iterator<Item = &FinancialStatement> {
        [&self.balance_sheet, &self.income_statement, &self.cash_flow]
            .into_iter()
            .flatten()
    }
}
