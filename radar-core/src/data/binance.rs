//! Binance spot klines provider.
//!
//! Fetches recent candles from the public `/api/v3/klines` endpoint (no API
//! key needed). Handles rate limiting, bans and payload parsing, and shares a
//! circuit breaker so a blocked client stops calling out.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataProvider, FetchError};
use crate::domain::{Asset, Bar, Series, Timeframe};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance caps a klines request at 1000 rows.
pub const MAX_LIMIT: usize = 1000;

/// Error body Binance returns alongside 4xx statuses.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    timeout: Duration,
}

impl BinanceProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("radar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            circuit_breaker,
            timeout,
        })
    }

    /// Point at a different host (testnet or a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn klines_url(&self) -> String {
        format!("{}/api/v3/klines", self.base_url)
    }

    /// Parse a klines payload: an array of rows
    /// `[open_time_ms, "open", "high", "low", "close", "volume", close_time_ms, ...]`.
    pub fn parse_klines(
        asset: &Asset,
        timeframe: Timeframe,
        body: &str,
    ) -> Result<Series, FetchError> {
        let rows: Vec<Vec<Value>> = serde_json::from_str(body)
            .map_err(|e| FetchError::Malformed(format!("klines payload: {e}")))?;

        if rows.is_empty() {
            return Err(FetchError::NoData {
                symbol: asset.exchange_symbol(),
            });
        }

        let bars = rows
            .iter()
            .enumerate()
            .map(|(i, row)| parse_row(i, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Series::new(asset.clone(), timeframe, bars)?)
    }

    fn fetch_klines(
        &self,
        asset: &Asset,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Series, FetchError> {
        self.circuit_breaker.guard()?;

        let symbol = asset.exchange_symbol();
        let limit = limit.clamp(1, MAX_LIMIT).to_string();
        let response = self
            .client
            .get(self.klines_url())
            .query(&[
                ("symbol", symbol.as_str()),
                ("interval", timeframe.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(|e| {
                self.circuit_breaker.record_failure();
                if e.is_timeout() {
                    FetchError::Timeout {
                        secs: self.timeout.as_secs(),
                    }
                } else {
                    FetchError::Network(e.to_string())
                }
            })?;

        let status = response.status();

        // 418 is Binance's auto-ban after ignoring 429s; 403 is a WAF block.
        if status == reqwest::StatusCode::FORBIDDEN || status.as_u16() == 418 {
            self.circuit_breaker.trip();
            return Err(FetchError::RateLimited(format!(
                "binance refused requests with HTTP {status}"
            )));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            self.circuit_breaker.record_failure();
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FetchError::RateLimited(format!(
                "binance asked to retry after {retry_after}s"
            )));
        }

        let body = response
            .text()
            .map_err(|e| FetchError::Network(format!("reading klines body: {e}")))?;

        if !status.is_success() {
            self.circuit_breaker.record_failure();
            return Err(match serde_json::from_str::<ApiError>(&body) {
                Ok(api) => FetchError::Provider(format!("binance {}: {}", api.code, api.msg)),
                Err(_) => FetchError::Http {
                    provider: "binance".into(),
                    status: status.as_u16(),
                },
            });
        }

        debug!(%symbol, bytes = body.len(), "binance klines received");
        let series = Self::parse_klines(asset, timeframe, &body)?;
        self.circuit_breaker.record_success();
        Ok(series)
    }
}

fn parse_price(row: &[Value], row_index: usize, col: usize) -> Result<f64, FetchError> {
    let raw = row.get(col).ok_or_else(|| {
        FetchError::Malformed(format!("kline {row_index} has only {} fields", row.len()))
    })?;
    let parsed = match raw {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| FetchError::Malformed(format!("kline {row_index} field {col}: {raw}")))
}

fn parse_row(row_index: usize, row: &[Value]) -> Result<Bar, FetchError> {
    let open_time = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| FetchError::Malformed(format!("kline {row_index} has no open time")))?;
    let timestamp = DateTime::from_timestamp_millis(open_time).ok_or_else(|| {
        FetchError::Malformed(format!("kline {row_index} open time out of range: {open_time}"))
    })?;

    Ok(Bar {
        timestamp,
        open: parse_price(row, row_index, 1)?,
        high: parse_price(row, row_index, 2)?,
        low: parse_price(row, row_index, 3)?,
        close: parse_price(row, row_index, 4)?,
        volume: parse_price(row, row_index, 5)?,
    })
}

impl DataProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch(
        &self,
        asset: &Asset,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Series, FetchError> {
        if asset.is_forex() {
            return Err(FetchError::Unsupported(format!(
                "binance does not list forex pair {asset}"
            )));
        }
        self.fetch_klines(asset, timeframe, limit)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ROWS: &str = r#"[
        [1704067200000,"42283.58","42554.57","42261.02","42475.23","1271.68108",1704067499999,"53957248.5",40130,"650.57",27610286.2,"0"],
        [1704067500000,"42475.23","42600.00","42400.10","42588.12","902.5",1704067799999,"38400000.1",30001,"450.2",19000000.0,"0"]
    ]"#;

    fn btc() -> Asset {
        Asset::crypto("BTC", "USDT")
    }

    #[test]
    fn parses_kline_rows() {
        let series = BinanceProvider::parse_klines(&btc(), Timeframe::M5, TWO_ROWS).unwrap();
        assert_eq!(series.len(), 2);
        let first = series.bars()[0];
        assert_eq!(first.timestamp.timestamp_millis(), 1_704_067_200_000);
        assert_eq!(first.open, 42283.58);
        assert_eq!(first.close, 42475.23);
        assert_eq!(first.volume, 1271.68108);
        assert!(series.volume_reported());
        assert_eq!(series.timeframe(), Timeframe::M5);
    }

    #[test]
    fn empty_payload_is_no_data() {
        let err = BinanceProvider::parse_klines(&btc(), Timeframe::M1, "[]").unwrap_err();
        assert!(matches!(err, FetchError::NoData { ref symbol } if symbol == "BTCUSDT"));
    }

    #[test]
    fn error_object_is_malformed() {
        let err = BinanceProvider::parse_klines(
            &btc(),
            Timeframe::M1,
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn short_row_is_malformed() {
        let err = BinanceProvider::parse_klines(&btc(), Timeframe::M1, r#"[[1704067200000,"1.0","2.0"]]"#)
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(ref m) if m.contains("3 fields")));
    }

    #[test]
    fn non_numeric_price_is_malformed() {
        let err = BinanceProvider::parse_klines(
            &btc(),
            Timeframe::M1,
            r#"[[1704067200000,"abc","2.0","0.5","1.0","10"]]"#,
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn out_of_order_rows_are_rejected() {
        let reversed = r#"[
            [1704067500000,"1","1","1","1","1"],
            [1704067200000,"1","1","1","1","1"]
        ]"#;
        let err = BinanceProvider::parse_klines(&btc(), Timeframe::M5, reversed).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn forex_is_unsupported_without_network() {
        let provider =
            BinanceProvider::new(Arc::new(CircuitBreaker::default_provider()), Duration::from_secs(1))
                .unwrap();
        let err = provider
            .fetch(&Asset::forex("EUR", "USD"), Timeframe::M5, 10)
            .unwrap_err();
        assert!(matches!(err, FetchError::Unsupported(_)));
    }

    #[test]
    fn open_breaker_refuses_without_network() {
        let breaker = Arc::new(CircuitBreaker::default_provider());
        breaker.trip();
        let provider = BinanceProvider::new(breaker, Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://127.0.0.1:9/");
        assert!(!provider.is_available());
        let err = provider.fetch(&btc(), Timeframe::M5, 10).unwrap_err();
        assert!(matches!(err, FetchError::CircuitOpen { .. }));
    }
}
