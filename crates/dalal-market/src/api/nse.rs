//! NSE derivative-universe listing

use std::collections::HashSet;

use crate::error::Result;
use crate::symbol::Exchange;

/// Large caps substituted when the NSE listing cannot be fetched
pub const FALLBACK_FNO_SYMBOLS: &[&str] = &[
    "RELIANCE.NS",
    "TCS.NS",
    "HDFCBANK.NS",
    "INFY.NS",
    "ICICIBANK.NS",
    "HINDUNILVR.NS",
    "ITC.NS",
    "SBIN.NS",
    "BHARTIARTL.NS",
    "KOTAKBANK.NS",
    "LT.NS",
    "AXISBANK.NS",
    "ASIANPAINT.NS",
    "MARUTI.NS",
    "BAJFINANCE.NS",
    "HCLTECH.NS",
    "SUNPHARMA.NS",
    "TITAN.NS",
    "WIPRO.NS",
    "ULTRACEMCO.NS",
    "NESTLEIND.NS",
    "TATAMOTORS.NS",
    "TATASTEEL.NS",
    "POWERGRID.NS",
    "NTPC.NS",
    "ONGC.NS",
    "M&M.NS",
    "ADANIENT.NS",
    "ADANIPORTS.NS",
    "JSWSTEEL.NS",
];

pub fn fallback_symbols() -> Vec<String> {
    FALLBACK_FNO_SYMBOLS.iter().map(|s| (*s).to_string()).collect()
}

/// Index underlyings listed alongside stocks in the market-lot file
fn is_index_underlying(symbol: &str) -> bool {
    symbol.contains("NIFTY") || matches!(symbol, "SENSEX" | "BANKEX")
}

/// Extract `.NS` symbols of stock underlyings from the F&O market-lot CSV.
///
/// The file has a `SYMBOL` column; rows for index underlyings and section
/// headers are dropped, duplicates keep their first position.
pub fn parse_fno_csv(text: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let symbol_idx = reader
        .headers()?
        .iter()
        .position(|header| header.eq_ignore_ascii_case("SYMBOL"))
        .unwrap_or(1);

    let mut seen = HashSet::new();
    let mut symbols = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(raw) = record.get(symbol_idx) else {
            continue;
        };
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() || symbol == "SYMBOL" || is_index_underlying(&symbol) {
            continue;
        }
        let canonical = format!("{symbol}{}", Exchange::Nse.suffix());
        if seen.insert(canonical.clone()) {
            symbols.push(canonical);
        }
    }

    Ok(symbols)
}
