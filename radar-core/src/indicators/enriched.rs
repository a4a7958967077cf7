//! A series plus its indicator columns, rebuilt from scratch every poll cycle.

use thiserror::Error;

use super::{Ema, Indicator, Rsi, FAST_EMA_PERIOD, RSI_PERIOD, SLOW_EMA_PERIOD};
use crate::domain::{Bar, Series};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichError {
    #[error("column '{column}' has {actual} values but the series has {expected} bars")]
    ColumnLength {
        column: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Series with `ema9`, `ema21` and `rsi` aligned 1:1 with its bars.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSeries {
    series: Series,
    ema9: Vec<f64>,
    ema21: Vec<f64>,
    rsi: Vec<f64>,
}

/// The most recent bar with its indicator values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichedBar {
    pub bar: Bar,
    pub ema9: f64,
    pub ema21: f64,
    pub rsi: f64,
}

/// Compute the scorer's indicator columns for a freshly fetched series.
pub fn enrich(series: Series) -> EnrichedSeries {
    let bars = series.bars();
    let ema9 = Ema::new(FAST_EMA_PERIOD).compute(bars);
    let ema21 = Ema::new(SLOW_EMA_PERIOD).compute(bars);
    let rsi = Rsi::new(RSI_PERIOD).compute(bars);
    EnrichedSeries {
        series,
        ema9,
        ema21,
        rsi,
    }
}

impl EnrichedSeries {
    /// Attach precomputed columns. Each column must match the bar count.
    pub fn with_columns(
        series: Series,
        ema9: Vec<f64>,
        ema21: Vec<f64>,
        rsi: Vec<f64>,
    ) -> Result<Self, EnrichError> {
        let expected = series.len();
        for (column, values) in [("ema9", &ema9), ("ema21", &ema21), ("rsi", &rsi)] {
            if values.len() != expected {
                return Err(EnrichError::ColumnLength {
                    column,
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(Self {
            series,
            ema9,
            ema21,
            rsi,
        })
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn ema9(&self) -> &[f64] {
        &self.ema9
    }

    pub fn ema21(&self) -> &[f64] {
        &self.ema21
    }

    pub fn rsi(&self) -> &[f64] {
        &self.rsi
    }

    pub fn latest(&self) -> Option<EnrichedBar> {
        let last = self.len().checked_sub(1)?;
        Some(EnrichedBar {
            bar: self.series.bars()[last],
            ema9: self.ema9[last],
            ema21: self.ema21[last],
            rsi: self.rsi[last],
        })
    }
}
