//! Capital structure derived from a balance sheet

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::FinancialStatement;

/// Debt and equity of one statement period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalStructure {
    pub period: NaiveDate,
    pub total_debt: Option<f64>,
    pub equity: Option<f64>,
    pub total_capital: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

/// Total debt as reported, else long-term plus current debt
fn total_debt(balance_sheet: &FinancialStatement, idx: usize) -> Option<f64> {
    balance_sheet.value("TotalDebt", idx).or_else(|| {
        let long_term = balance_sheet.value("LongTermDebt", idx);
        let current = balance_sheet.value("CurrentDebt", idx);
        match (long_term, current) {
            (None, None) => None,
            (long_term, current) => Some(long_term.unwrap_or(0.0) + current.unwrap_or(0.0)),
        }
    })
}

/// Capital structure for every period of `balance_sheet`, oldest first
pub fn capital_structure(balance_sheet: &FinancialStatement) -> Vec<CapitalStructure> {
    balance_sheet
        .periods
        .iter()
        .enumerate()
        .map(|(idx, &period)| {
            let total_debt = total_debt(balance_sheet, idx);
            let equity = balance_sheet.value("StockholdersEquity", idx);
            let total_capital = match (total_debt, equity) {
                (Some(debt), Some(equity)) => Some(debt + equity),
                (debt, equity) => debt.or(equity),
            };
            let debt_to_equity = match (total_debt, equity) {
                (Some(debt), Some(equity)) if equity != 0.0 => Some(debt / equity),
                _ => None,
            };

            CapitalStructure {
                period,
                total_debt,
                equity,
                total_capital,
                debt_to_equity,
            }
        })
        .collect()
}
