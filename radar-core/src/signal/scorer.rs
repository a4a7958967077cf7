//! Signal scorer.
//!
//! Three independent checks on the latest enriched bar, in fixed order:
//! trend (EMA9 vs EMA21, 50 points), momentum (30 < RSI < 65, 30 points) and
//! volume (latest > 1.2 × trailing 20-bar mean, 20 points). Reachable totals
//! are 0, 20, 30, 50, 70, 80 and 100.

use serde::Serialize;

use super::{Label, SignalResult};
use crate::indicators::{rolling_mean_tail, EnrichedSeries, RSI_PERIOD, VOLUME_WINDOW};

pub const TREND_POINTS: u8 = 50;
pub const MOMENTUM_POINTS: u8 = 30;
pub const VOLUME_POINTS: u8 = 20;

/// Exclusive RSI band for the momentum check.
pub const RSI_LOWER: f64 = 30.0;
pub const RSI_UPPER: f64 = 65.0;

/// Latest volume must exceed the trailing mean by this factor.
pub const VOLUME_SPIKE_RATIO: f64 = 1.2;

/// Scores at or above this take the trend direction as label.
pub const STRONG_SCORE: u8 = 75;
pub const POTENTIAL_SCORE: u8 = 45;

/// Bars needed before the latest RSI is defined.
pub const MIN_HISTORY: usize = RSI_PERIOD + 1;

/// Points awarded by each check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub trend: u8,
    pub momentum: u8,
    pub volume: u8,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u8 {
        self.trend + self.momentum + self.volume
    }
}

/// Full scoring detail for one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub breakdown: ScoreBreakdown,
    pub trend_up: bool,
    pub notes: Vec<String>,
}

impl Scorecard {
    pub fn total(&self) -> u8 {
        self.breakdown.total()
    }

    pub fn label(&self) -> Label {
        label_for(self.total(), self.trend_up)
    }

    pub fn into_result(self) -> SignalResult {
        let label = self.label();
        SignalResult::new(label, self.total(), self.notes)
    }
}

/// Map a total score and trend direction to a label.
pub fn label_for(score: u8, trend_up: bool) -> Label {
    if score >= STRONG_SCORE {
        if trend_up {
            Label::Rise
        } else {
            Label::Fall
        }
    } else if score >= POTENTIAL_SCORE {
        Label::Potential
    } else {
        Label::Wait
    }
}

/// Run the three checks. `None` when the series is empty or its latest RSI
/// is still in warm-up.
pub fn scorecard(enriched: &EnrichedSeries) -> Option<Scorecard> {
    let latest = enriched.latest()?;
    if latest.rsi.is_nan() {
        return None;
    }

    let mut breakdown = ScoreBreakdown::default();
    let mut notes = Vec::with_capacity(3);

    // Strict comparison: equal lines are not an uptrend.
    let trend_up = latest.ema9 > latest.ema21;
    if trend_up {
        breakdown.trend = TREND_POINTS;
        notes.push("EMA9>EMA21".to_string());
    } else {
        notes.push("EMA9<EMA21".to_string());
    }

    if RSI_LOWER < latest.rsi && latest.rsi < RSI_UPPER {
        breakdown.momentum = MOMENTUM_POINTS;
        notes.push(format!("RSI in range: {:.1}", latest.rsi));
    } else {
        notes.push(format!("RSI out of range: {:.1}", latest.rsi));
    }

    let series = enriched.series();
    if !series.volume_reported() {
        notes.push("Volume unavailable".to_string());
    } else {
        let baseline = rolling_mean_tail(&series.volumes(), VOLUME_WINDOW).unwrap_or(f64::NAN);
        if latest.bar.volume > baseline * VOLUME_SPIKE_RATIO {
            breakdown.volume = VOLUME_POINTS;
            notes.push("Volume spike".to_string());
        } else {
            notes.push("Volume normal".to_string());
        }
    }

    Some(Scorecard {
        breakdown,
        trend_up,
        notes,
    })
}

/// Reduce an enriched series to a signal.
///
/// Deterministic: depends only on the enriched values, never on wall-clock
/// time or randomness.
pub fn score_signal(enriched: &EnrichedSeries) -> SignalResult {
    match scorecard(enriched) {
        Some(card) => card.into_result(),
        None => SignalResult::indeterminate(enriched.len(), MIN_HISTORY),
    }
}
