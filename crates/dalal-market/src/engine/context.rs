//! Request-scoped view parameters

use dalal_utils::dedup_preserving_order;
use serde::{Deserialize, Serialize};

use crate::config::DashConfig;
use crate::engine::indicators::IndicatorSpec;
use crate::error::{DashError, Result};
use crate::models::{Interval, Period};

/// Period and interval of the index trend charts
pub const INDEX_TREND_PERIOD: Period = Period::SixMonths;
pub const INDEX_TREND_INTERVAL: Interval = Interval::OneDay;

/// Parameters of one price view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub period: Period,
    pub interval: Interval,
    pub indicators: Vec<IndicatorSpec>,
    pub show_volume: bool,
}

impl Default for PriceRequest {
    fn default() -> Self {
        Self::new(Period::default())
    }
}

impl PriceRequest {
    /// Request for `period` at its default interval, no indicators
    pub fn new(period: Period) -> Self {
        Self {
            period,
            interval: Interval::default_for(period),
            indicators: Vec::new(),
            show_volume: false,
        }
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_indicators(mut self, indicators: Vec<IndicatorSpec>) -> Self {
        self.indicators = dedup_preserving_order(indicators);
        self
    }

    pub fn with_volume(mut self, show_volume: bool) -> Self {
        self.show_volume = show_volume;
        self
    }

    /// Parse indicator tokens against the configured custom-window bounds
    pub fn parse_indicators<S: AsRef<str>>(
        tokens: &[S],
        custom_window: usize,
        config: &DashConfig,
    ) -> Result<Vec<IndicatorSpec>> {
        let range = config.custom_window_range();
        let specs = tokens
            .iter()
            .map(|token| IndicatorSpec::parse(token.as_ref(), custom_window, &range))
            .collect::<Result<Vec<_>>>()?;
        Ok(dedup_preserving_order(specs))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.interval.is_allowed_for(self.period) {
            return Err(DashError::InvalidRequest(format!(
                "interval {} is not available for period {}",
                self.interval, self.period
            )));
        }
        Ok(())
    }

    /// Indicators to compute, volume change included when volume is shown
    pub fn indicator_specs(&self) -> Vec<IndicatorSpec> {
        let mut specs = self.indicators.clone();
        if self.show_volume && !specs.contains(&IndicatorSpec::VolumeChange) {
            specs.push(IndicatorSpec::VolumeChange);
        }
        specs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request() {
        let request = PriceRequest::default();
        assert_eq!(request.period, Period::ThreeMonths);
        assert_eq!(request.interval, Interval::OneDay);
        assert!(request.validate().is_ok());
        assert!(request.indicator_specs().is_empty());
    }

    #[test]
    fn test_interval_must_fit_period() {
        let request = PriceRequest::new(Period::FiveDays).with_interval(Interval::OneWeek);
        assert!(matches!(
            request.validate(),
            Err(DashError::InvalidRequest(_))
        ));

        let request = PriceRequest::new(Period::OneYear).with_interval(Interval::ThreeMonths);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_parse_indicators_dedups() {
        let config = DashConfig::default();
        let specs = PriceRequest::parse_indicators(
            &["SMA_20", "sma_20", "SMA_X", "RSI"],
            30,
            &config,
        )
        .unwrap();
        assert_eq!(
            specs,
            vec![IndicatorSpec::Sma(20), IndicatorSpec::Sma(30), IndicatorSpec::Rsi]
        );

        assert!(PriceRequest::parse_indicators(&["EMA_X"], 500, &config).is_err());
    }

    #[test]
    fn test_volume_toggle_adds_volume_change() {
        let request = PriceRequest::default()
            .with_indicators(vec![IndicatorSpec::Macd])
            .with_volume(true);
        assert_eq!(
            request.indicator_specs(),
            vec![IndicatorSpec::Macd, IndicatorSpec::VolumeChange]
        );
    }
}
