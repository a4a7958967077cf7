//! Market data adapters.
//!
//! Every source implements [`DataProvider`]; [`ProviderFactory`] picks one per
//! watch and shares a circuit breaker per HTTP venue across all watches.

pub mod alpha_vantage;
pub mod binance;
pub mod circuit_breaker;
pub mod csv_replay;
pub mod provider;
pub mod synthetic;
pub mod timeout;

pub use alpha_vantage::AlphaVantageProvider;
pub use binance::BinanceProvider;
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_replay::{read_series, CsvProvider};
pub use provider::{DataProvider, FetchError};
pub use synthetic::SyntheticProvider;
pub use timeout::TimeoutProvider;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Asset;

/// Where a watch gets its bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Binance for crypto pairs, Alpha Vantage for forex pairs.
    #[default]
    Auto,
    Binance,
    AlphaVantage,
    Csv,
    Synthetic,
}

impl SourceKind {
    /// Concrete source for `asset` (`Auto` resolved by asset class).
    pub fn resolve(self, asset: &Asset) -> SourceKind {
        match self {
            SourceKind::Auto if asset.is_forex() => SourceKind::AlphaVantage,
            SourceKind::Auto => SourceKind::Binance,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Auto => "auto",
            SourceKind::Binance => "binance",
            SourceKind::AlphaVantage => "alpha_vantage",
            SourceKind::Csv => "csv",
            SourceKind::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(SourceKind::Auto),
            "binance" => Ok(SourceKind::Binance),
            "alpha_vantage" | "alphavantage" => Ok(SourceKind::AlphaVantage),
            "csv" => Ok(SourceKind::Csv),
            "synthetic" => Ok(SourceKind::Synthetic),
            other => Err(format!(
                "unknown source '{other}' (expected auto, binance, alpha_vantage, csv or synthetic)"
            )),
        }
    }
}

/// Builds providers for watches.
///
/// All Binance watches share one breaker, as do all Alpha Vantage watches, so
/// a ban seen by one watch stops the others from calling the same venue.
pub struct ProviderFactory {
    request_timeout: Duration,
    binance_breaker: Arc<CircuitBreaker>,
    alpha_vantage_breaker: Arc<CircuitBreaker>,
    synthetic_seed: u64,
}

impl ProviderFactory {
    /// HTTP clients time out after `request_timeout`, never less than 1s.
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            request_timeout: request_timeout.max(Duration::from_secs(1)),
            binance_breaker: Arc::new(CircuitBreaker::default_provider()),
            alpha_vantage_breaker: Arc::new(CircuitBreaker::default_provider()),
            synthetic_seed: 0,
        }
    }

    pub fn with_synthetic_seed(mut self, seed: u64) -> Self {
        self.synthetic_seed = seed;
        self
    }

    /// Provider serving `asset` from `source`.
    ///
    /// `csv_path` is required for [`SourceKind::Csv`] and ignored otherwise.
    pub fn build(
        &self,
        source: SourceKind,
        asset: &Asset,
        csv_path: Option<&Path>,
    ) -> Result<Arc<dyn DataProvider>, FetchError> {
        let provider: Arc<dyn DataProvider> = match source.resolve(asset) {
            SourceKind::Auto | SourceKind::Binance => Arc::new(BinanceProvider::new(
                Arc::clone(&self.binance_breaker),
                self.request_timeout,
            )?),
            SourceKind::AlphaVantage => Arc::new(AlphaVantageProvider::from_env(
                Arc::clone(&self.alpha_vantage_breaker),
                self.request_timeout,
            )?),
            SourceKind::Csv => {
                let path = csv_path.ok_or_else(|| {
                    FetchError::Unsupported("csv source needs a file path".into())
                })?;
                Arc::new(CsvProvider::new(path))
            }
            SourceKind::Synthetic => Arc::new(SyntheticProvider::new(self.synthetic_seed)),
        };
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_resolves_by_asset_class() {
        assert_eq!(
            SourceKind::Auto.resolve(&Asset::crypto("BTC", "USDT")),
            SourceKind::Binance
        );
        assert_eq!(
            SourceKind::Auto.resolve(&Asset::forex("EUR", "USD")),
            SourceKind::AlphaVantage
        );
        assert_eq!(
            SourceKind::Csv.resolve(&Asset::forex("EUR", "USD")),
            SourceKind::Csv
        );
    }

    #[test]
    fn parses_source_names() {
        assert_eq!("alpha-vantage".parse::<SourceKind>().unwrap(), SourceKind::AlphaVantage);
        assert_eq!(" Synthetic ".parse::<SourceKind>().unwrap(), SourceKind::Synthetic);
        assert!("yahoo".parse::<SourceKind>().is_err());
    }

    #[test]
    fn csv_without_path_is_rejected() {
        let factory = ProviderFactory::new(Duration::from_secs(5));
        let result = factory.build(SourceKind::Csv, &Asset::crypto("BTC", "USDT"), None);
        assert!(matches!(result, Err(FetchError::Unsupported(_))));
    }

    #[test]
    fn zero_request_timeout_is_raised_to_one_second() {
        let factory = ProviderFactory::new(Duration::ZERO);
        assert_eq!(factory.request_timeout, Duration::from_secs(1));
    }

    #[test]
    fn builds_named_providers() {
        let factory = ProviderFactory::new(Duration::from_secs(5));
        let btc = Asset::crypto("BTC", "USDT");
        let binance = factory.build(SourceKind::Auto, &btc, None).unwrap();
        assert_eq!(binance.name(), "binance");
        let synthetic = factory.build(SourceKind::Synthetic, &btc, None).unwrap();
        assert_eq!(synthetic.name(), "synthetic");
        let csv = factory
            .build(SourceKind::Csv, &btc, Some(Path::new("bars.csv")))
            .unwrap();
        assert_eq!(csv.name(), "csv");
    }
}
