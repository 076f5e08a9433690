//! Financial statements

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DashError;

/// Which statement to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::BalanceSheet,
        StatementKind::IncomeStatement,
        StatementKind::CashFlow,
    ];

    /// Line items requested from the provider, in display order
    pub const fn line_items(self) -> &'static [&'static str] {
        match self {
            StatementKind::BalanceSheet => &[
                "TotalAssets",
                "CurrentAssets",
                "CashAndCashEquivalents",
                "TotalLiabilitiesNetMinorityInterest",
                "CurrentLiabilities",
                "TotalDebt",
                "LongTermDebt",
                "CurrentDebt",
                "NetDebt",
                "StockholdersEquity",
                "RetainedEarnings",
                "WorkingCapital",
                "InvestedCapital",
            ],
            StatementKind::IncomeStatement => &[
                "TotalRevenue",
                "CostOfRevenue",
                "GrossProfit",
                "OperatingExpense",
                "OperatingIncome",
                "EBITDA",
                "InterestExpense",
                "TaxProvision",
                "NetIncome",
                "BasicEPS",
                "DilutedEPS",
            ],
            StatementKind::CashFlow => &[
                "OperatingCashFlow",
                "InvestingCashFlow",
                "FinancingCashFlow",
                "CapitalExpenditure",
                "FreeCashFlow",
                "RepurchaseOfCapitalStock",
                "CashDividendsPaid",
            ],
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            StatementKind::BalanceSheet => "balance sheet",
            StatementKind::IncomeStatement => "income statement",
            StatementKind::CashFlow => "cash flow",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reporting frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Annual,
    Quarterly,
}

impl Frequency {
    /// Prefix of provider time-series type names
    pub const fn prefix(self) -> &'static str {
        match self {
            Frequency::Annual => "annual",
            Frequency::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Frequency {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "annual" | "yearly" | "a" => Ok(Frequency::Annual),
            "quarterly" | "quarter" | "q" => Ok(Frequency::Quarterly),
            other => Err(DashError::InvalidRequest(format!(
                "unknown frequency '{other}', expected annual or quarterly"
            ))),
        }
    }
}

/// One named row of a statement, aligned with the statement periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// A financial statement with periods in ascending order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub symbol: String,
    pub kind: StatementKind,
    pub frequency: Frequency,
    pub periods: Vec<NaiveDate>,
    pub items: Vec<LineItem>,
}

impl FinancialStatement {
    /// Assemble a statement from `(item, period end, value)` observations.
    ///
    /// Items keep the order of `StatementKind::line_items`; items never
    /// observed are omitted.
    pub fn from_observations(
        symbol: impl Into<String>,
        kind: StatementKind,
        frequency: Frequency,
        observations: &[(String, NaiveDate, f64)],
    ) -> Self {
        let mut periods: Vec<NaiveDate> = observations.iter().map(|(_, date, _)| *date).collect();
        periods.sort_unstable();
        periods.dedup();

        let items = kind
            .line_items()
            .iter()
            .filter_map(|name| {
                let mut values = vec![None; periods.len()];
                let mut seen = false;
                for (_, date, value) in observations.iter().filter(|(item, ..)| item == name) {
                    if let Ok(idx) = periods.binary_search(date) {
                        values[idx] = Some(*value);
                        seen = true;
                    }
                }
                seen.then(|| LineItem {
                    name: (*name).to_string(),
                    values,
                })
            })
            .collect();

        Self {
            symbol: symbol.into(),
            kind,
            frequency,
            periods,
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, name: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Value of `name` for the period at `idx`
    pub fn value(&self, name: &str, idx: usize) -> Option<f64> {
        self.item(name)
            .and_then(|item| item.values.get(idx).copied().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_observations_aligns_periods() {
        let observations = vec![
            ("TotalDebt".to_string(), date(2024, 3, 31), 300.0),
            ("StockholdersEquity".to_string(), date(2023, 3, 31), 900.0),
            ("StockholdersEquity".to_string(), date(2024, 3, 31), 1_000.0),
            ("NotRequested".to_string(), date(2024, 3, 31), 1.0),
        ];
        let statement = FinancialStatement::from_observations(
            "TCS.NS",
            StatementKind::BalanceSheet,
            Frequency::Annual,
            &observations,
        );

        assert_eq!(statement.periods, vec![date(2023, 3, 31), date(2024, 3, 31)]);
        assert_eq!(statement.items.len(), 2);
        // line_items order: TotalDebt before StockholdersEquity
        assert_eq!(statement.items[0].name, "TotalDebt");
        assert_eq!(statement.value("TotalDebt", 0), None);
        assert_eq!(statement.value("TotalDebt", 1), Some(300.0));
        assert_eq!(statement.value("StockholdersEquity", 0), Some(900.0));
        assert!(statement.item("NotRequested").is_none());
    }

    #[test]
    fn test_frequency_parse() {
        assert_eq!("Annual".parse::<Frequency>().unwrap(), Frequency::Annual);
        assert_eq!("q".parse::<Frequency>().unwrap(), Frequency::Quarterly);
        assert!("monthly".parse::<Frequency>().is_err());
    }
}
