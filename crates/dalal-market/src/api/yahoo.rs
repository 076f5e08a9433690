//! Yahoo Finance provider

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use super::nse;
use super::provider::MarketDataProvider;
use crate::config::DashConfig;
use crate::error::{DashError, GatewayError, GatewayResult, Result};
use crate::models::{
    Bar, FinancialStatement, Frequency, HistoricalSeries, Interval, Period, QuoteInfo, StatementKind,
};
use crate::symbol::INDEX_PREFIX;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Quote summary modules carrying the fields of `QuoteInfo`
const QUOTE_MODULES: &str = "price,summaryDetail,assetProfile,financialData";

/// Start of the fundamentals window (2016-01-01)
const FUNDAMENTALS_START: i64 = 1_451_606_400;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Yahoo Finance provider, throttled and retried per `DashConfig`
#[derive(Clone)]
pub struct YahooProvider {
    client: Client,
    rate_limiter: SharedRateLimiter,
    config: Arc<DashConfig>,
}

impl YahooProvider {
    pub fn new(config: Arc<DashConfig>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let rpm = NonZeroU32::new(config.requests_per_minute).ok_or_else(|| {
            DashError::ConfigError("requests_per_minute must be greater than 0".to_string())
        })?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self {
            client,
            rate_limiter,
            config,
        })
    }

    /// GET a JSON document, retrying transient failures with exponential backoff
    async fn get_json(&self, symbol: &str, url: &str, query: &[(&str, String)]) -> GatewayResult<Value> {
        let mut attempt = 0;
        loop {
            self.rate_limiter.until_ready().await;

            // Only transient failures fall through to the retry below
            let reason = match self.client.get(url).query(query).send().await {
                Ok(response) => match response.status() {
                    StatusCode::TOO_MANY_REQUESTS => {
                        return Err(GatewayError::RateLimited {
                            symbol: symbol.to_string(),
                        });
                    }
                    status if status.is_server_error() => format!("HTTP error: {status}"),
                    status if !status.is_success() => {
                        return Err(GatewayError::provider(symbol, format!("HTTP error: {status}")));
                    }
                    _ => {
                        return response
                            .json::<Value>()
                            .await
                            .map_err(|e| GatewayError::provider(symbol, e));
                    }
                },
                Err(e) if e.is_timeout() || e.is_connect() => e.to_string(),
                Err(e) => return Err(GatewayError::provider(symbol, e)),
            };

            attempt += 1;
            if attempt >= self.config.max_retries {
                return Err(GatewayError::provider(symbol, reason));
            }
            let delay = self.config.retry_backoff(attempt - 1);
            warn!(symbol, attempt, ?delay, "Transient provider failure, retrying: {reason}");
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_info(&self, symbol: &str) -> GatewayResult<QuoteInfo> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{symbol}",
            self.config.yahoo_base_url
        );
        let body = self
            .get_json(symbol, &url, &[("modules", QUOTE_MODULES.to_string())])
            .await?;
        parse_quote_summary(symbol, &body)
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> GatewayResult<HistoricalSeries> {
        self.rate_limiter.until_ready().await;

        let provider =
            yahoo::YahooConnector::new().map_err(|e| GatewayError::provider(symbol, e))?;

        let response = provider
            .get_quote_range(symbol, interval.as_str(), period.as_str())
            .await
            .map_err(|e| GatewayError::provider(symbol, e))?;

        let quotes = response
            .quotes()
            .map_err(|e| GatewayError::provider(symbol, e))?;

        // Indices report zero traded volume
        let has_volume = !symbol.starts_with(INDEX_PREFIX);
        let bars: Vec<Bar> = quotes
            .iter()
            .filter_map(|q| {
                DateTime::from_timestamp(q.timestamp as i64, 0).map(|timestamp| Bar {
                    timestamp,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: has_volume.then_some(q.volume as f64),
                })
            })
            .collect();

        if bars.is_empty() {
            return Err(GatewayError::empty(symbol, "price history"));
        }

        debug!(symbol, %period, %interval, bars = bars.len(), "Fetched history");
        Ok(HistoricalSeries::new(symbol, bars))
    }

    async fn fetch_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        frequency: Frequency,
    ) -> GatewayResult<FinancialStatement> {
        let url = format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{symbol}",
            self.config.yahoo_base_url
        );
        let types = kind
            .line_items()
            .iter()
            .map(|item| format!("{}{item}", frequency.prefix()))
            .collect::<Vec<_>>()
            .join(",");
        let query = [
            ("symbol", symbol.to_string()),
            ("type", types),
            ("period1", FUNDAMENTALS_START.to_string()),
            ("period2", Utc::now().timestamp().to_string()),
        ];

        let body = self.get_json(symbol, &url, &query).await?;
        let observations = parse_timeseries(frequency, &body);
        let statement = FinancialStatement::from_observations(symbol, kind, frequency, &observations);

        if statement.is_empty() {
            return Err(GatewayError::empty(symbol, format!("{frequency} {kind}")));
        }
        Ok(statement)
    }

    async fn fetch_derivative_universe(&self) -> GatewayResult<Vec<String>> {
        const SOURCE: &str = "F&O universe";

        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .get(&self.config.fno_list_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| GatewayError::provider(SOURCE, e))?;
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::provider(SOURCE, e))?;

        let symbols = nse::parse_fno_csv(&text).map_err(|e| GatewayError::provider(SOURCE, e))?;
        if symbols.is_empty() {
            return Err(GatewayError::empty(SOURCE, "derivative symbols"));
        }
        Ok(symbols)
    }
}

/// Numeric field in either `{"raw": x, "fmt": ".."}` or plain form
fn raw_number(value: &Value) -> Option<f64> {
    value
        .get("raw")
        .and_then(Value::as_f64)
        .or_else(|| value.as_f64())
}

fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Map a `quoteSummary` response onto `QuoteInfo`
fn parse_quote_summary(symbol: &str, body: &Value) -> GatewayResult<QuoteInfo> {
    let summary = &body["quoteSummary"];

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let reason = error["description"]
            .as_str()
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(GatewayError::provider(symbol, reason));
    }

    let Some(result) = summary["result"].get(0) else {
        return Err(GatewayError::empty(symbol, "quote info"));
    };

    let price = &result["price"];
    let detail = &result["summaryDetail"];
    let profile = &result["assetProfile"];
    let financial = &result["financialData"];

    Ok(QuoteInfo {
        symbol: text(&price["symbol"]).or_else(|| Some(symbol.to_string())),
        short_name: text(&price["shortName"]),
        long_name: text(&price["longName"]),
        quote_type: text(&price["quoteType"]),
        exchange: text(&price["exchangeName"]),
        currency: text(&price["currency"]).or_else(|| text(&detail["currency"])),
        financial_currency: text(&financial["financialCurrency"]),
        regular_market_price: raw_number(&price["regularMarketPrice"]),
        previous_close: raw_number(&detail["previousClose"])
            .or_else(|| raw_number(&price["regularMarketPreviousClose"])),
        regular_market_change: raw_number(&price["regularMarketChange"]),
        // quoteSummary reports the change as a fraction
        regular_market_change_percent: raw_number(&price["regularMarketChangePercent"])
            .map(|fraction| fraction * 100.0),
        day_high: raw_number(&detail["dayHigh"])
            .or_else(|| raw_number(&price["regularMarketDayHigh"])),
        day_low: raw_number(&detail["dayLow"]).or_else(|| raw_number(&price["regularMarketDayLow"])),
        fifty_two_week_low: raw_number(&detail["fiftyTwoWeekLow"]),
        fifty_two_week_high: raw_number(&detail["fiftyTwoWeekHigh"]),
        volume: raw_number(&price["regularMarketVolume"]).or_else(|| raw_number(&detail["volume"])),
        market_cap: raw_number(&price["marketCap"]).or_else(|| raw_number(&detail["marketCap"])),
        sector: text(&profile["sector"]),
        industry: text(&profile["industry"]),
        long_business_summary: text(&profile["longBusinessSummary"]),
    })
}

/// Flatten a fundamentals time-series response into `(item, period end, value)`
fn parse_timeseries(frequency: Frequency, body: &Value) -> Vec<(String, NaiveDate, f64)> {
    let Some(results) = body["timeseries"]["result"].as_array() else {
        return Vec::new();
    };

    let mut observations = Vec::new();
    for result in results {
        let Some(series_type) = result["meta"]["type"].get(0).and_then(Value::as_str) else {
            continue;
        };
        let Some(item) = series_type.strip_prefix(frequency.prefix()) else {
            continue;
        };
        let Some(points) = result[series_type].as_array() else {
            continue;
        };

        observations.extend(points.iter().filter_map(|point| {
            let date = NaiveDate::parse_from_str(point["asOfDate"].as_str()?, "%Y-%m-%d").ok()?;
            let value = raw_number(&point["reportedValue"])?;
            Some((item.to_string(), date, value))
        }));
    }
    observations
}
