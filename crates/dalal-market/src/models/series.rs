//! Historical OHLCV series and derived columns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

/// A named column aligned one-to-one with the bars of its series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl IndicatorColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Column from a fully defined series of values
    pub fn dense(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, values.into_iter().map(Some).collect())
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }
}

/// Price history of one symbol, in strictly increasing timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    symbol: String,
    bars: Vec<Bar>,
    columns: Vec<IndicatorColumn>,
}

impl HistoricalSeries {
    /// Build a series, sorting bars and keeping the last bar of any duplicate timestamp
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|bar| bar.timestamp);
        bars.reverse();
        bars.dedup_by_key(|bar| bar.timestamp);
        bars.reverse();

        Self {
            symbol: symbol.into(),
            bars,
            columns: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|bar| bar.timestamp).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.low).collect()
    }

    /// Volume column, present only when every bar reports a volume
    pub fn volumes(&self) -> Option<Vec<f64>> {
        if self.bars.is_empty() {
            return None;
        }
        self.bars.iter().map(|bar| bar.volume).collect()
    }

    /// Derived columns in insertion order
    pub fn columns(&self) -> &[IndicatorColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&IndicatorColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Add a derived column, replacing any column of the same name
    pub(crate) fn set_column(&mut self, column: IndicatorColumn) {
        debug_assert_eq!(column.values.len(), self.bars.len(), "misaligned column {}", column.name);
        match self.columns.iter_mut().find(|existing| existing.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{Duration, TimeZone};

    /// Daily bars starting 2024-01-01 with the given closes
    pub fn daily_series(symbol: &str, closes: &[f64]) -> HistoricalSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 3, 45, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: Some(1_000.0 + i as f64 * 100.0),
            })
            .collect();
        HistoricalSeries::new(symbol, bars)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::daily_series;
    use super::*;
    use chrono::TimeZone;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: None,
        }
    }

    #[test]
    fn test_bars_sorted_and_deduplicated() {
        let series = HistoricalSeries::new(
            "SBIN.NS",
            vec![bar(3, 30.0), bar(1, 10.0), bar(2, 20.0), bar(1, 11.0)],
        );

        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![11.0, 20.0, 30.0]);
        assert!(
            series
                .timestamps()
                .windows(2)
                .all(|pair| pair[0] < pair[1])
        );
    }

    #[test]
    fn test_volume_requires_every_bar() {
        let mut bars = vec![bar(1, 10.0), bar(2, 11.0)];
        bars[0].volume = Some(5.0);
        let series = HistoricalSeries::new("^NSEI", bars);
        assert!(series.volumes().is_none());

        let series = daily_series("TCS.NS", &[1.0, 2.0]);
        assert_eq!(series.volumes(), Some(vec![1_000.0, 1_100.0]));
    }

    #[test]
    fn test_set_column_replaces_by_name() {
        let mut series = daily_series("TCS.NS", &[1.0, 2.0]);
        series.set_column(IndicatorColumn::dense("SMA_2", vec![1.0, 1.5]));
        series.set_column(IndicatorColumn::dense("SMA_2", vec![1.0, 1.6]));

        assert_eq!(series.columns().len(), 1);
        assert_eq!(series.column("SMA_2").unwrap().last(), Some(1.6));
    }
}
