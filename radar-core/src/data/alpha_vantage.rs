//! Alpha Vantage `FX_INTRADAY` provider for forex pairs.
//!
//! Spot forex has no consolidated traded volume, so the series is marked as
//! volume-less instead of inventing numbers; the scorer skips its volume check.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataProvider, FetchError};
use crate::domain::{Asset, Bar, Series, Timeframe};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "ALPHA_VANTAGE_KEY";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct FxCandle {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
}

pub struct AlphaVantageProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: SecretString,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl AlphaVantageProvider {
    pub fn new(
        api_key: SecretString,
        circuit_breaker: Arc<CircuitBreaker>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            circuit_breaker,
        })
    }

    /// Reads the API key from `ALPHA_VANTAGE_KEY`.
    pub fn from_env(
        circuit_breaker: Arc<CircuitBreaker>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(FetchError::MissingCredentials(API_KEY_VAR))?;
        Self::new(SecretString::new(key.into()), circuit_breaker, timeout)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Alpha Vantage interval name for a timeframe.
    pub fn interval(timeframe: Timeframe) -> Result<&'static str, FetchError> {
        match timeframe {
            Timeframe::M1 => Ok("1min"),
            Timeframe::M5 => Ok("5min"),
            Timeframe::M15 => Ok("15min"),
            Timeframe::M3 => Err(FetchError::Unsupported(
                "alpha vantage has no 3m forex interval".into(),
            )),
        }
    }

    /// Parse an `FX_INTRADAY` JSON body into the most recent `limit` bars.
    ///
    /// Alpha Vantage reports quota exhaustion and bad requests with HTTP 200
    /// and a `Note`, `Information` or `Error Message` field instead of data.
    pub fn parse_intraday(
        asset: &Asset,
        timeframe: Timeframe,
        body: &str,
        limit: usize,
    ) -> Result<Series, FetchError> {
        let interval = Self::interval(timeframe)?;
        let root: Map<String, Value> = serde_json::from_str(body)
            .map_err(|e| FetchError::Malformed(format!("fx payload: {e}")))?;

        if let Some(msg) = root.get("Error Message").and_then(Value::as_str) {
            return Err(FetchError::Provider(format!("alpha vantage: {msg}")));
        }
        for key in ["Note", "Information"] {
            if let Some(msg) = root.get(key).and_then(Value::as_str) {
                return Err(FetchError::RateLimited(format!("alpha vantage: {msg}")));
            }
        }

        let series_key = format!("Time Series FX ({interval})");
        let raw = root
            .get(&series_key)
            .cloned()
            .ok_or_else(|| FetchError::Malformed(format!("missing '{series_key}'")))?;
        let candles: BTreeMap<String, FxCandle> = serde_json::from_value(raw)
            .map_err(|e| FetchError::Malformed(format!("{series_key}: {e}")))?;

        if candles.is_empty() {
            return Err(FetchError::NoData {
                symbol: asset.exchange_symbol(),
            });
        }

        // The timestamp format sorts lexicographically, so BTreeMap order is time order.
        let bars = candles
            .iter()
            .map(|(ts, candle)| parse_candle(ts, candle))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Series::new(asset.clone(), timeframe, bars)?
            .without_volume()
            .tail(limit))
    }
}

fn parse_field(ts: &str, name: &str, raw: &str) -> Result<f64, FetchError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| FetchError::Malformed(format!("{ts} {name}: '{raw}'")))
}

fn parse_candle(ts: &str, candle: &FxCandle) -> Result<Bar, FetchError> {
    let timestamp = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
        .map_err(|e| FetchError::Malformed(format!("timestamp '{ts}': {e}")))?
        .and_utc();
    Ok(Bar {
        timestamp,
        open: parse_field(ts, "open", &candle.open)?,
        high: parse_field(ts, "high", &candle.high)?,
        low: parse_field(ts, "low", &candle.low)?,
        close: parse_field(ts, "close", &candle.close)?,
        volume: 0.0,
    })
}

impl DataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch(
        &self,
        asset: &Asset,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Series, FetchError> {
        let Asset::Forex { from, to } = asset else {
            return Err(FetchError::Unsupported(format!(
                "alpha vantage FX_INTRADAY only serves forex pairs, not {asset}"
            )));
        };
        let interval = Self::interval(timeframe)?;
        self.circuit_breaker.guard()?;

        let response = self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&[
                ("function", "FX_INTRADAY"),
                ("from_symbol", from.as_str()),
                ("to_symbol", to.as_str()),
                ("interval", interval),
                ("outputsize", if limit > 100 { "full" } else { "compact" }),
                ("apikey", self.api_key.expose_secret()),
            ])
            .send()
            .map_err(|e| {
                self.circuit_breaker.record_failure();
                FetchError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            self.circuit_breaker.record_failure();
            return Err(FetchError::Http {
                provider: "alpha_vantage".into(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|e| FetchError::Network(format!("reading fx body: {e}")))?;
        debug!(pair = %asset, bytes = body.len(), "alpha vantage payload received");

        match Self::parse_intraday(asset, timeframe, &body, limit) {
            Ok(series) => {
                self.circuit_breaker.record_success();
                Ok(series)
            }
            Err(e) => {
                if matches!(e, FetchError::RateLimited(_)) {
                    self.circuit_breaker.record_failure();
                }
                Err(e)
            }
        }
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
