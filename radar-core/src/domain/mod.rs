//! Domain types for the radar: bars, series, instruments, timeframes.

pub mod asset;
pub mod bar;
pub mod series;
pub mod timeframe;

pub use asset::Asset;
pub use bar::Bar;
pub use series::{Series, SeriesError};
pub use timeframe::Timeframe;

use thiserror::Error;

/// Failure to parse a user-supplied instrument or timeframe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown timeframe '{0}' (expected one of 1m, 3m, 5m, 15m)")]
    Timeframe(String),

    #[error("invalid asset '{0}' (expected BASE/QUOTE like BTC/USDT or a forex pair like EURUSD)")]
    Asset(String),
}
