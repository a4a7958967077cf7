//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (Binance, Alpha Vantage,
//! CSV replay, synthetic) so the polling driver never knows where bars come
//! from, and tests can script success and failure sequences.

use thiserror::Error;

use crate::domain::{Asset, Series, SeriesError, Timeframe};

/// Why a fetch produced no usable series.
///
/// Every variant is recoverable from the polling driver's point of view: the
/// cycle is skipped and the next one retries.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("fetch timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("HTTP {status} from {provider}")]
    Http { provider: String, status: u16 },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("no bars returned for {symbol}")]
    NoData { symbol: String },

    #[error("unsupported request: {0}")]
    Unsupported(String),

    #[error("missing credentials: set {0}")]
    MissingCredentials(&'static str),

    #[error("circuit breaker open (retry in {retry_in_secs}s)")]
    CircuitOpen { retry_in_secs: u64 },

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<SeriesError> for FetchError {
    fn from(err: SeriesError) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Io(err.to_string())
    }
}

/// Source of OHLCV bars.
///
/// Implementations return bars ascending by time, at most `limit` of them
/// (the most recent ones), or an explicit error. Never a partial series.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the most recent `limit` bars of `asset` at `timeframe`.
    fn fetch(&self, asset: &Asset, timeframe: Timeframe, limit: usize)
        -> Result<Series, FetchError>;

    /// Whether the provider currently accepts requests (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_errors_become_malformed() {
        let err: FetchError = SeriesError::NonFiniteClose { index: 4 }.into();
        assert!(matches!(err, FetchError::Malformed(ref m) if m.contains("bar 4")));
    }

    #[test]
    fn error_messages_are_displayable() {
        assert_eq!(
            FetchError::Http {
                provider: "binance".into(),
                status: 502
            }
            .to_string(),
            "HTTP 502 from binance"
        );
        assert_eq!(
            FetchError::MissingCredentials("ALPHA_VANTAGE_KEY").to_string(),
            "missing credentials: set ALPHA_VANTAGE_KEY"
        );
    }
}
