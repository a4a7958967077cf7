//! An ordered run of bars for one instrument and timeframe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Asset, Bar, Timeframe};

/// Ordering and completeness violations found while building a [`Series`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} ({timestamp}) is not strictly after the previous bar")]
    Unordered { index: usize, timestamp: String },

    #[error("bar {index} has a non-finite close")]
    NonFiniteClose { index: usize },
}

/// Bars for one instrument, ascending by timestamp with no duplicates.
///
/// `volume_reported` is false for feeds that carry no traded volume (spot
/// forex); the volume column is then zero and must not be scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesRepr")]
pub struct Series {
    asset: Asset,
    timeframe: Timeframe,
    bars: Vec<Bar>,
    volume_reported: bool,
}

/// Wire shape of a [`Series`]; every decoded series goes through
/// [`Series::new`].
#[derive(Deserialize)]
struct SeriesRepr {
    asset: Asset,
    timeframe: Timeframe,
    bars: Vec<Bar>,
    #[serde(default = "volume_reported_default")]
    volume_reported: bool,
}

fn volume_reported_default() -> bool {
    true
}

impl TryFrom<SeriesRepr> for Series {
    type Error = SeriesError;

    fn try_from(repr: SeriesRepr) -> Result<Self, Self::Error> {
        let series = Series::new(repr.asset, repr.timeframe, repr.bars)?;
        Ok(if repr.volume_reported {
            series
        } else {
            series.without_volume()
        })
    }
}

impl Series {
    /// Validate ordering and closes, then wrap the bars.
    ///
    /// An empty bar list is accepted; downstream scoring reports it as
    /// insufficient history.
    pub fn new(asset: Asset, timeframe: Timeframe, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() {
                return Err(SeriesError::NonFiniteClose { index });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(SeriesError::Unordered {
                    index,
                    timestamp: bar.timestamp.to_rfc3339(),
                });
            }
        }
        Ok(Self {
            asset,
            timeframe,
            bars,
            volume_reported: true,
        })
    }

    /// Mark the series as coming from a feed without genuine volume.
    pub fn without_volume(mut self) -> Self {
        self.volume_reported = false;
        self
    }

    /// Keep only the most recent `limit` bars.
    pub fn tail(mut self, limit: usize) -> Self {
        let excess = self.bars.len().saturating_sub(limit);
        self.bars.drain(..excess);
        self
    }

    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn volume_reported(&self) -> bool {
        self.volume_reported
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}
