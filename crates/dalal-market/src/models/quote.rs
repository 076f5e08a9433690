//! Quote information as reported by the provider

use serde::{Deserialize, Serialize};

/// Instrument description and latest pricing.
///
/// Every field is optional: providers omit fields freely (indices have no
/// sector, delisted listings have no price) and absence is not a failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteInfo {
    pub symbol: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    /// Instrument type, e.g. `EQUITY`, `INDEX`, `ETF`
    pub quote_type: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub financial_currency: Option<String>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub regular_market_change: Option<f64>,
    /// Change in percent (1.5 means +1.5%)
    pub regular_market_change_percent: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub long_business_summary: Option<String>,
}

impl QuoteInfo {
    /// Whether the record identifies a real instrument
    pub fn is_valid_instrument(&self) -> bool {
        self.quote_type
            .as_deref()
            .is_some_and(|quote_type| !quote_type.trim().is_empty())
    }

    /// Best available display name, falling back to `fallback`
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.short_name
            .as_deref()
            .or(self.long_name.as_deref())
            .unwrap_or(fallback)
    }

    /// Latest price, falling back to the previous close
    pub fn price(&self) -> Option<f64> {
        self.regular_market_price.or(self.previous_close)
    }

    /// Change percent, derived from price and previous close when not reported
    pub fn change_percent(&self) -> Option<f64> {
        self.regular_market_change_percent.or_else(|| {
            match (self.regular_market_price, self.previous_close) {
                (Some(price), Some(prev)) if prev != 0.0 => Some((price / prev - 1.0) * 100.0),
                _ => None,
            }
        })
    }

    /// Trading currency, INR when unreported
    pub fn currency_or_default(&self) -> &str {
        self.currency.as_deref().unwrap_or("INR")
    }

    /// Reporting currency of financial statements, INR when unreported
    pub fn financial_currency_or_default(&self) -> &str {
        self.financial_currency
            .as_deref()
            .or(self.currency.as_deref())
            .unwrap_or("INR")
    }

    /// Feature/value rows of the fields present, in display order
    pub fn to_table(&self) -> Vec<(&'static str, String)> {
        let mut rows = Vec::new();
        let mut text = |label: &'static str, value: &Option<String>| {
            if let Some(value) = value {
                rows.push((label, value.clone()));
            }
        };
        text("Name", &self.long_name.clone().or_else(|| self.short_name.clone()));
        text("Quote type", &self.quote_type);
        text("Exchange", &self.exchange);
        text("Currency", &self.currency);
        text("Sector", &self.sector);
        text("Industry", &self.industry);

        let numbers = [
            ("Price", self.price()),
            ("Previous close", self.previous_close),
            ("Change %", self.change_percent()),
            ("Day low", self.day_low),
            ("Day high", self.day_high),
            ("52-week low", self.fifty_two_week_low),
            ("52-week high", self.fifty_two_week_high),
            ("Volume", self.volume),
            ("Market cap", self.market_cap),
        ];
        rows.extend(
            numbers
                .into_iter()
                .filter_map(|(label, value)| value.map(|v| (label, format_number(v)))),
        );
        rows
    }
}

/// Format a number with two decimals, dropping them for large magnitudes
pub fn format_number(value: f64) -> String {
    if value.abs() >= 1e7 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reliance() -> QuoteInfo {
        QuoteInfo {
            symbol: Some("RELIANCE.NS".to_string()),
            short_name: Some("RELIANCE INDUSTRIES".to_string()),
            quote_type: Some("EQUITY".to_string()),
            currency: Some("INR".to_string()),
            regular_market_price: Some(2_950.0),
            previous_close: Some(2_900.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_instrument_requires_quote_type() {
        assert!(reliance().is_valid_instrument());
        assert!(!QuoteInfo::default().is_valid_instrument());

        let blank = QuoteInfo {
            quote_type: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(!blank.is_valid_instrument());
    }

    #[test]
    fn test_price_falls_back_to_previous_close() {
        let info = QuoteInfo {
            previous_close: Some(101.5),
            ..Default::default()
        };
        assert_eq!(info.price(), Some(101.5));
        assert_eq!(reliance().price(), Some(2_950.0));
    }

    #[test]
    fn test_change_percent_derived() {
        let pct = reliance().change_percent().unwrap();
        assert!((pct - 1.724_137_931).abs() < 1e-6);
    }

    #[test]
    fn test_table_skips_missing_fields() {
        let table = reliance().to_table();
        let labels: Vec<_> = table.iter().map(|(label, _)| *label).collect();
        assert!(labels.contains(&"Name"));
        assert!(labels.contains(&"Price"));
        assert!(!labels.contains(&"Sector"));
        assert!(!labels.contains(&"Market cap"));
    }

    #[test]
    fn test_defaults() {
        let info = QuoteInfo::default();
        assert_eq!(info.display_name("TCS.NS"), "TCS.NS");
        assert_eq!(info.currency_or_default(), "INR");
        assert_eq!(info.financial_currency_or_default(), "INR");
    }
}
