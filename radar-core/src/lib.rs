//! Radar Core: market-signal engine for crypto and forex pairs.
//!
//! - Domain types (bars, series, assets, timeframes)
//! - EMA / RSI / volume indicators over a fetched series
//! - Fixed-rule scorer producing a label, a confidence and its rationale
//! - Polling driver with cancellation, alerts and pluggable sinks
//! - Data adapters (Binance, Alpha Vantage, CSV replay, synthetic)

pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod poller;
pub mod signal;

pub use config::{ConfigError, PollConfig, WatchList};
pub use data::{DataProvider, FetchError};
pub use domain::{Asset, Bar, Series, Timeframe};
pub use poller::{Monitor, Poller, RunSummary, SignalSink, StopToken};
pub use signal::{score_signal, Label, SignalResult};
