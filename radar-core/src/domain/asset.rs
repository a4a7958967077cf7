//! Tradable instruments: crypto pairs and foreign-exchange pairs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseError;

/// An instrument the radar can watch.
///
/// Crypto pairs are written `BASE/QUOTE` (`BTC/USDT`); forex pairs are six
/// letters (`EURUSD`). Both forms are normalised to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Asset {
    Crypto { base: String, quote: String },
    Forex { from: String, to: String },
}

impl Asset {
    pub fn crypto(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Asset::Crypto {
            base: base.into().to_ascii_uppercase(),
            quote: quote.into().to_ascii_uppercase(),
        }
    }

    pub fn forex(from: impl Into<String>, to: impl Into<String>) -> Self {
        Asset::Forex {
            from: from.into().to_ascii_uppercase(),
            to: to.into().to_ascii_uppercase(),
        }
    }

    /// Venue symbol without separator (`BTCUSDT`, `EURUSD`).
    pub fn exchange_symbol(&self) -> String {
        match self {
            Asset::Crypto { base, quote } => format!("{base}{quote}"),
            Asset::Forex { from, to } => format!("{from}{to}"),
        }
    }

    pub fn is_forex(&self) -> bool {
        matches!(self, Asset::Forex { .. })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Crypto { base, quote } => write!(f, "{base}/{quote}"),
            Asset::Forex { from, to } => write!(f, "{from}{to}"),
        }
    }
}

fn is_code(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

impl FromStr for Asset {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some((base, quote)) = trimmed.split_once('/') {
            if is_code(base) && is_code(quote) {
                return Ok(Asset::crypto(base, quote));
            }
        } else if trimmed.len() == 6 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Ok(Asset::forex(&trimmed[..3], &trimmed[3..]));
        }
        Err(ParseError::Asset(s.to_string()))
    }
}

impl TryFrom<String> for Asset {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_crypto_pair() {
        let asset: Asset = "btc/usdt".parse().unwrap();
        assert_eq!(asset, Asset::crypto("BTC", "USDT"));
        assert_eq!(asset.exchange_symbol(), "BTCUSDT");
        assert_eq!(asset.to_string(), "BTC/USDT");
        assert!(!asset.is_forex());
    }

    #[test]
    fn parses_forex_pair() {
        let asset: Asset = "EURUSD".parse().unwrap();
        assert_eq!(asset, Asset::forex("EUR", "USD"));
        assert_eq!(asset.exchange_symbol(), "EURUSD");
        assert!(asset.is_forex());
    }

    #[test]
    fn rejects_malformed_symbols() {
        for bad in ["", "BTC/", "/USDT", "EURUS", "EUR-USD", "BTC/US DT", "EURUSD1"] {
            assert!(bad.parse::<Asset>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn serde_uses_display_form() {
        let json = serde_json::to_string(&Asset::crypto("ETH", "USDT")).unwrap();
        assert_eq!(json, "\"ETH/USDT\"");
        let back: Asset = serde_json::from_str("\"GBPUSD\"").unwrap();
        assert_eq!(back, Asset::forex("GBP", "USD"));
        assert!(serde_json::from_str::<Asset>("\"nope\"").is_err());
    }
}
