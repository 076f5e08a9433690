//! Canonical market symbols

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange an equity listing trades on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// National Stock Exchange
    Nse,
    /// Bombay Stock Exchange
    Bse,
}

impl Exchange {
    /// Order in which listings are probed during resolution
    pub const PROBE_ORDER: [Exchange; 2] = [Exchange::Nse, Exchange::Bse];

    /// Provider suffix for listings on this exchange
    pub const fn suffix(self) -> &'static str {
        match self {
            Exchange::Nse => ".NS",
            Exchange::Bse => ".BO",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exchange::Nse => write!(f, "NSE"),
            Exchange::Bse => write!(f, "BSE"),
        }
    }
}

/// Index codes carry this prefix on the provider side
pub const INDEX_PREFIX: char = '^';

/// A resolved, provider-understood instrument identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// Stock or ETF listing, e.g. `RELIANCE.NS`
    Equity { base: String, exchange: Exchange },
    /// Index code, e.g. `^NSEI`
    Index { code: String },
}

impl Symbol {
    pub fn equity(base: impl Into<String>, exchange: Exchange) -> Self {
        Self::Equity {
            base: base.into(),
            exchange,
        }
    }

    pub fn index(code: impl Into<String>) -> Self {
        Self::Index { code: code.into() }
    }

    /// Parse input that already is in canonical form.
    ///
    /// Expects normalized (trimmed, uppercase) input. Returns `None` for bare
    /// codes that still need an exchange suffix.
    pub fn parse_canonical(input: &str) -> Option<Self> {
        if input.starts_with(INDEX_PREFIX) {
            return (input.len() > 1).then(|| Self::index(input));
        }

        Exchange::PROBE_ORDER.into_iter().find_map(|exchange| {
            input
                .strip_suffix(exchange.suffix())
                .filter(|base| !base.is_empty())
                .map(|base| Self::equity(base, exchange))
        })
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index { .. })
    }

    /// Exchange of an equity listing
    pub fn exchange(&self) -> Option<Exchange> {
        match self {
            Self::Equity { exchange, .. } => Some(*exchange),
            Self::Index { .. } => None,
        }
    }

    /// Provider symbol string
    pub fn as_canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equity { base, exchange } => write!(f, "{base}{}", exchange.suffix()),
            Self::Index { code } => write!(f, "{code}"),
        }
    }
}
