//! Sub-period returns and normalized multi-symbol comparison

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{HistoricalSeries, IndicatorColumn};

/// Number of trailing fractions reported by default (whole, half, quarter)
pub const DEFAULT_FRACTIONS: usize = 3;

/// Close-to-close change over the trailing `1/fraction` of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodChange {
    pub label: String,
    pub fraction: usize,
    pub start: DateTime<Utc>,
    pub start_close: f64,
    pub end_close: f64,
    pub change_percent: f64,
}

pub fn fraction_label(fraction: usize) -> String {
    match fraction {
        1 => "Whole period".to_string(),
        2 => "Half period".to_string(),
        4 => "Quarter period".to_string(),
        k => format!("1/{k} period"),
    }
}

/// Percent change of Close over the whole series, its last half, last
/// quarter and so on, `num_fractions` entries in total.
///
/// Fraction `k` starts at bar `floor(len * (1 - 1/k))`. Series with fewer
/// than two bars give nothing; a fraction starting at a zero close is skipped.
pub fn summarize(series: &HistoricalSeries, num_fractions: usize) -> Vec<PeriodChange> {
    let bars = series.bars();
    let Some(last) = bars.last().filter(|_| bars.len() >= 2) else {
        return Vec::new();
    };

    let len = bars.len();
    (0..num_fractions)
        .filter_map(|exp| {
            let fraction = 1usize.checked_shl(u32::try_from(exp).ok()?)?;
            // floor(len * (1 - 1/k)) == len - ceil(len / k)
            let start_idx = len - len.div_ceil(fraction);
            let start = &bars[start_idx];
            if start.close == 0.0 {
                return None;
            }
            Some(PeriodChange {
                label: fraction_label(fraction),
                fraction,
                start: start.timestamp,
                start_close: start.close,
                end_close: last.close,
                change_percent: (last.close / start.close - 1.0) * 100.0,
            })
        })
        .collect()
}

/// Close as percent change from the first bar
pub fn normalize(series: &HistoricalSeries) -> Vec<Option<f64>> {
    let closes = series.closes();
    let Some(&base) = closes.first() else {
        return Vec::new();
    };
    closes
        .iter()
        .map(|&close| (base != 0.0).then(|| (close / base - 1.0) * 100.0))
        .collect()
}

/// Normalized series of several symbols on a shared time axis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    /// Union of every series' timestamps, ascending
    pub timestamps: Vec<DateTime<Utc>>,
    /// One column per symbol, named by symbol, `None` where it has no bar
    pub columns: Vec<IndicatorColumn>,
}

impl ComparisonTable {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, symbol: &str) -> Option<&IndicatorColumn> {
        self.columns.iter().find(|column| column.name == symbol)
    }
}

/// Align normalized series by timestamp
pub fn compare(series: &[HistoricalSeries]) -> ComparisonTable {
    let mut cells: BTreeMap<DateTime<Utc>, Vec<Option<f64>>> = BTreeMap::new();

    for (col, s) in series.iter().enumerate() {
        for (timestamp, value) in s.timestamps().into_iter().zip(normalize(s)) {
            cells
                .entry(timestamp)
                .or_insert_with(|| vec![None; series.len()])[col] = value;
        }
    }

    let mut columns: Vec<IndicatorColumn> = series
        .iter()
        .map(|s| IndicatorColumn::new(s.symbol(), Vec::with_capacity(cells.len())))
        .collect();
    let mut timestamps = Vec::with_capacity(cells.len());

    for (timestamp, row) in cells {
        timestamps.push(timestamp);
        for (column, value) in columns.iter_mut().zip(row) {
            column.values.push(value);
        }
    }

    ComparisonTable {
        timestamps,
        columns,
    }
}
