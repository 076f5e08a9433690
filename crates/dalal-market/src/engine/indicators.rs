//! Technical indicators over a historical series
//!
//! Moving averages come from the `ta` crate. Its SMA divides by the number of
//! samples seen so far and its EMA seeds with the first input, so every
//! average here has a value from the first bar on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage, TrueRange};
use ta::{DataItem, Next};
use tracing::debug;

use crate::error::{DashError, Result};
use crate::models::{HistoricalSeries, IndicatorColumn};

/// Lookback of RSI and ATR
pub const OSCILLATOR_WINDOW: usize = 14;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Indicator tokens offered for selection, `_X` taking the custom window
pub const INDICATOR_MENU: &[&str] = &[
    "SMA_20", "SMA_50", "SMA_200", "SMA_X", "EMA_20", "EMA_50", "EMA_200", "EMA_X", "ATR",
    "MACD", "RSI",
];

/// One requested indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorSpec {
    Sma(usize),
    Ema(usize),
    Rsi,
    Atr,
    Macd,
    VolumeChange,
}

impl IndicatorSpec {
    /// Parse a selection token. `_X` windows take `custom_window`, which must
    /// lie in `custom_range`.
    pub fn parse(
        token: &str,
        custom_window: usize,
        custom_range: &RangeInclusive<usize>,
    ) -> Result<Self> {
        let normalized = token.trim().to_uppercase();
        let invalid = |reason: String| DashError::InvalidIndicator {
            token: token.to_string(),
            reason,
        };

        match normalized.as_str() {
            "RSI" => return Ok(Self::Rsi),
            "ATR" => return Ok(Self::Atr),
            "MACD" => return Ok(Self::Macd),
            "VOLUME" | "VOLUME_CHANGE" => return Ok(Self::VolumeChange),
            _ => {}
        }

        let Some((kind, window)) = normalized.split_once('_') else {
            return Err(invalid("unknown indicator".to_string()));
        };

        let window = if window == "X" {
            if !custom_range.contains(&custom_window) {
                return Err(invalid(format!(
                    "custom window {custom_window} outside {}..={}",
                    custom_range.start(),
                    custom_range.end()
                )));
            }
            custom_window
        } else {
            window
                .parse::<usize>()
                .map_err(|_| invalid(format!("'{window}' is not a window length")))?
        };

        if window == 0 {
            return Err(invalid("window must be at least 1".to_string()));
        }

        match kind {
            "SMA" => Ok(Self::Sma(window)),
            "EMA" => Ok(Self::Ema(window)),
            _ => Err(invalid("unknown indicator".to_string())),
        }
    }

    /// Names of the columns this indicator produces
    pub fn column_names(&self) -> Vec<String> {
        match self {
            Self::Sma(window) => vec![format!("SMA_{window}")],
            Self::Ema(window) => vec![format!("EMA_{window}")],
            Self::Rsi => vec!["RSI".to_string()],
            Self::Atr => vec!["TR".to_string(), "ATR".to_string()],
            Self::Macd => vec![
                "MACD".to_string(),
                "Signal".to_string(),
                "MACD_Hist".to_string(),
            ],
            Self::VolumeChange => vec!["Volume_Change_%".to_string()],
        }
    }
}

impl fmt::Display for IndicatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sma(window) => write!(f, "SMA_{window}"),
            Self::Ema(window) => write!(f, "EMA_{window}"),
            Self::Rsi => f.write_str("RSI"),
            Self::Atr => f.write_str("ATR"),
            Self::Macd => f.write_str("MACD"),
            Self::VolumeChange => f.write_str("Volume_Change_%"),
        }
    }
}

impl FromStr for IndicatorSpec {
    type Err = DashError;

    /// Parse a token with a fixed window; `_X` tokens need [`IndicatorSpec::parse`]
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, 0, &(1..=0))
    }
}

/// Add the columns of every requested indicator to `series`.
///
/// Each indicator is computed independently from the price columns, so the
/// request order does not matter and repeated entries produce one column
/// group. Volume change is skipped when the series has no volume.
pub fn compute_indicators(
    mut series: HistoricalSeries,
    requested: &[IndicatorSpec],
) -> Result<HistoricalSeries> {
    let closes = series.closes();

    for spec in requested {
        let columns = match spec {
            IndicatorSpec::Sma(window) => {
                vec![IndicatorColumn::dense(spec.to_string(), sma(&closes, *window)?)]
            }
            IndicatorSpec::Ema(window) => {
                vec![IndicatorColumn::dense(spec.to_string(), ema(&closes, *window)?)]
            }
            IndicatorSpec::Rsi => vec![IndicatorColumn::new("RSI", rsi(&closes)?)],
            IndicatorSpec::Atr => {
                let tr = true_range(&series)?;
                let atr = sma(&tr, OSCILLATOR_WINDOW)?;
                vec![
                    IndicatorColumn::dense("TR", tr),
                    IndicatorColumn::dense("ATR", atr),
                ]
            }
            IndicatorSpec::Macd => {
                let (macd, signal, hist) = macd(&closes)?;
                vec![
                    IndicatorColumn::dense("MACD", macd),
                    IndicatorColumn::dense("Signal", signal),
                    IndicatorColumn::dense("MACD_Hist", hist),
                ]
            }
            IndicatorSpec::VolumeChange => match series.volumes() {
                Some(volumes) => vec![IndicatorColumn::new(
                    "Volume_Change_%",
                    percent_change(&volumes),
                )],
                None => {
                    debug!(symbol = series.symbol(), "No volume, skipping volume change");
                    continue;
                }
            },
        };

        for column in columns {
            series.set_column(column);
        }
    }

    Ok(series)
}

fn ta_error(indicator: &str, window: usize, e: impl fmt::Display) -> DashError {
    DashError::InvalidIndicator {
        token: format!("{indicator}_{window}"),
        reason: e.to_string(),
    }
}

/// Rolling mean, minimum period 1
pub fn sma(values: &[f64], window: usize) -> Result<Vec<f64>> {
    let mut sma = SimpleMovingAverage::new(window).map_err(|e| ta_error("SMA", window, e))?;
    Ok(values.iter().map(|&value| sma.next(value)).collect())
}

/// Recursive exponential average with span `window`, seeded with the first value
pub fn ema(values: &[f64], window: usize) -> Result<Vec<f64>> {
    let mut ema =
        ExponentialMovingAverage::new(window).map_err(|e| ta_error("EMA", window, e))?;
    Ok(values.iter().map(|&value| ema.next(value)).collect())
}

/// Bar-to-bar change in percent. Undefined for the first bar and after a zero.
pub fn percent_change(values: &[f64]) -> Vec<Option<f64>> {
    std::iter::once(None)
        .chain(values.windows(2).map(|pair| {
            let (prev, current) = (pair[0], pair[1]);
            (prev != 0.0).then(|| (current / prev - 1.0) * 100.0)
        }))
        .take(values.len())
        .collect()
}

/// Relative strength index over [`OSCILLATOR_WINDOW`] bars.
///
/// Undefined changes count as no movement. A window without losses has no
/// defined ratio, so RSI is missing there.
pub fn rsi(closes: &[f64]) -> Result<Vec<Option<f64>>> {
    let changes: Vec<f64> = percent_change(closes)
        .into_iter()
        .map(|change| change.unwrap_or(0.0))
        .collect();
    let gains: Vec<f64> = changes.iter().map(|change| change.max(0.0)).collect();
    let losses: Vec<f64> = changes.iter().map(|change| (-change).max(0.0)).collect();

    let avg_gain = sma(&gains, OSCILLATOR_WINDOW)?;
    let avg_loss = sma(&losses, OSCILLATOR_WINDOW)?;

    Ok(avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| (loss > 0.0).then(|| 100.0 - 100.0 / (1.0 + gain / loss)))
        .collect())
}

/// True range per bar; the first bar uses high minus low
pub fn true_range(series: &HistoricalSeries) -> Result<Vec<f64>> {
    let mut tr = TrueRange::new();
    series
        .bars()
        .iter()
        .map(|bar| {
            let item = DataItem::builder()
                .open(bar.open)
                .high(bar.high)
                .low(bar.low)
                .close(bar.close)
                .volume(bar.volume.unwrap_or(0.0))
                .build()
                .map_err(|e| DashError::InvalidIndicator {
                    token: "ATR".to_string(),
                    reason: format!("bar at {}: {e}", bar.timestamp),
                })?;
            Ok(tr.next(&item))
        })
        .collect()
}

/// MACD line, signal line and histogram
pub fn macd(closes: &[f64]) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let fast = ema(closes, MACD_FAST)?;
    let slow = ema(closes, MACD_SLOW)?;
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema(&line, MACD_SIGNAL)?;
    let hist = line.iter().zip(&signal).map(|(m, s)| m - s).collect();
    Ok((line, signal, hist))
}
