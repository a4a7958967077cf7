//! Poll configuration and the TOML watch list.
//!
//! Bounds are checked once, when a [`PollConfig`] is built; a config that
//! exists is valid, so the polling driver never re-validates.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::SourceKind;
use crate::domain::{Asset, ParseError, Timeframe};

pub const MIN_INTERVAL_SECS: u64 = 10;
pub const MAX_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

pub const MIN_THRESHOLD: u8 = 50;
pub const MAX_THRESHOLD: u8 = 100;
pub const DEFAULT_THRESHOLD: u8 = 75;

/// Bars requested per fetch.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;
pub const MAX_HISTORY_LIMIT: usize = 1000;

pub const MIN_FETCH_TIMEOUT_SECS: u64 = 1;
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("poll interval {0}s is outside 10..=600s")]
    IntervalOutOfRange(u64),

    #[error("alert threshold {0} is outside 50..=100")]
    ThresholdOutOfRange(u8),

    #[error("unknown timeframe '{0}' (expected 1m, 3m, 5m or 15m)")]
    UnknownTimeframe(String),

    #[error("invalid asset '{0}' (expected BASE/QUOTE or a six-letter forex pair)")]
    InvalidAsset(String),

    #[error("history limit {0} is outside 1..=1000")]
    HistoryLimit(usize),

    #[error("fetch timeout {0}s is outside 1..=120s")]
    FetchTimeoutOutOfRange(u64),

    #[error("watch {0} uses the csv source but has no csv_path")]
    MissingCsvPath(String),

    #[error("parse watch list: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("read watch list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ParseError> for ConfigError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Timeframe(s) => ConfigError::UnknownTimeframe(s),
            ParseError::Asset(s) => ConfigError::InvalidAsset(s),
        }
    }
}

/// Everything one polling driver needs to know.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollConfig {
    asset: Asset,
    timeframe: Timeframe,
    threshold: u8,
    auto_repeat: bool,
    interval_secs: u64,
    history_limit: usize,
    fetch_timeout_secs: u64,
}

impl PollConfig {
    pub fn builder(asset: Asset) -> PollConfigBuilder {
        PollConfigBuilder::new(asset)
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Minimum confidence that raises an alert.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn auto_repeat(&self) -> bool {
        self.auto_repeat
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct PollConfigBuilder {
    asset: Asset,
    timeframe: Timeframe,
    threshold: u8,
    auto_repeat: bool,
    interval_secs: u64,
    history_limit: usize,
    fetch_timeout_secs: u64,
}

impl PollConfigBuilder {
    fn new(asset: Asset) -> Self {
        Self {
            asset,
            timeframe: Timeframe::default(),
            threshold: DEFAULT_THRESHOLD,
            auto_repeat: true,
            interval_secs: DEFAULT_INTERVAL_SECS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }

    pub fn timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = timeframe;
        self
    }

    pub fn threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn auto_repeat(mut self, auto_repeat: bool) -> Self {
        self.auto_repeat = auto_repeat;
        self
    }

    pub fn interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<PollConfig, ConfigError> {
        if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&self.interval_secs) {
            return Err(ConfigError::IntervalOutOfRange(self.interval_secs));
        }
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&self.threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.threshold));
        }
        if !(1..=MAX_HISTORY_LIMIT).contains(&self.history_limit) {
            return Err(ConfigError::HistoryLimit(self.history_limit));
        }
        if !(MIN_FETCH_TIMEOUT_SECS..=MAX_FETCH_TIMEOUT_SECS).contains(&self.fetch_timeout_secs) {
            return Err(ConfigError::FetchTimeoutOutOfRange(self.fetch_timeout_secs));
        }
        Ok(PollConfig {
            asset: self.asset,
            timeframe: self.timeframe,
            threshold: self.threshold,
            auto_repeat: self.auto_repeat,
            interval_secs: self.interval_secs,
            history_limit: self.history_limit,
            fetch_timeout_secs: self.fetch_timeout_secs,
        })
    }
}

/// Values a `[[watch]]` entry inherits unless it sets its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchDefaults {
    pub timeframe: String,
    pub threshold: u8,
    pub auto_repeat: bool,
    pub interval_secs: u64,
    pub history_limit: usize,
    pub fetch_timeout_secs: u64,
    pub source: SourceKind,
}

impl Default for WatchDefaults {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::default().to_string(),
            threshold: DEFAULT_THRESHOLD,
            auto_repeat: true,
            interval_secs: DEFAULT_INTERVAL_SECS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            source: SourceKind::Auto,
        }
    }
}

/// One `[[watch]]` table as written in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchEntry {
    pub asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_repeat: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

impl WatchEntry {
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            timeframe: None,
            threshold: None,
            auto_repeat: None,
            interval_secs: None,
            history_limit: None,
            source: None,
            csv_path: None,
        }
    }
}

/// A validated watch: poll settings plus where its bars come from.
#[derive(Debug, Clone, PartialEq)]
pub struct Watch {
    pub config: PollConfig,
    pub source: SourceKind,
    pub csv_path: Option<PathBuf>,
}

/// Watch-list file: optional `[defaults]` and any number of `[[watch]]` tables.
///
/// ```toml
/// [defaults]
/// timeframe = "5m"
/// interval_secs = 60
///
/// [[watch]]
/// asset = "BTC/USDT"
/// threshold = 80
///
/// [[watch]]
/// asset = "EURUSD"
/// threshold = 70
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchList {
    #[serde(default)]
    pub defaults: WatchDefaults,
    #[serde(default, rename = "watch")]
    pub watches: Vec<WatchEntry>,
}

impl WatchList {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// The six crypto pairs and five forex majors the radar ships with.
    pub fn default_markets() -> Self {
        let crypto = ["BTC/USDT", "ETH/USDT", "BNB/USDT", "XRP/USDT", "SOL/USDT", "ADA/USDT"];
        let forex = ["EURUSD", "GBPUSD", "USDJPY", "AUDUSD", "USDCAD"];
        let watches = crypto
            .iter()
            .map(|a| WatchEntry::new(*a))
            .chain(forex.iter().map(|a| WatchEntry {
                threshold: Some(70),
                ..WatchEntry::new(*a)
            }))
            .collect();
        Self {
            defaults: WatchDefaults::default(),
            watches,
        }
    }

    /// Resolve every entry against the defaults and validate it.
    ///
    /// Fails on the first invalid entry; nothing is polled from a half-valid list.
    pub fn resolve(&self) -> Result<Vec<Watch>, ConfigError> {
        self.watches.iter().map(|w| self.resolve_entry(w)).collect()
    }

    fn resolve_entry(&self, entry: &WatchEntry) -> Result<Watch, ConfigError> {
        let d = &self.defaults;
        let asset: Asset = entry.asset.parse()?;
        let timeframe: Timeframe = entry.timeframe.as_deref().unwrap_or(&d.timeframe).parse()?;
        let source = entry.source.unwrap_or(d.source);
        if source == SourceKind::Csv && entry.csv_path.is_none() {
            return Err(ConfigError::MissingCsvPath(entry.asset.clone()));
        }

        let config = PollConfig::builder(asset)
            .timeframe(timeframe)
            .threshold(entry.threshold.unwrap_or(d.threshold))
            .auto_repeat(entry.auto_repeat.unwrap_or(d.auto_repeat))
            .interval_secs(entry.interval_secs.unwrap_or(d.interval_secs))
            .history_limit(entry.history_limit.unwrap_or(d.history_limit))
            .fetch_timeout_secs(d.fetch_timeout_secs)
            .build()?;

        Ok(Watch {
            config,
            source,
            csv_path: entry.csv_path.clone(),
        })
    }
}
