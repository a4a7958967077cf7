//! Relative Strength Index (RSI).
//!
//! Simple rolling means (not Wilder smoothing) of gains and losses over the
//! last `period` price changes:
//! RSI = 100 - 100 / (1 + avg_gain / (avg_loss + RSI_EPSILON))
//! Lookback: period (the first change is undefined).
//! Edge cases: avg_loss == 0 with gains → just under 100; flat prices → 0.

use super::{closes, Indicator};
use crate::domain::Bar;

/// Added to the average loss so a loss-free window never divides by zero.
pub const RSI_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rsi(&closes(bars), self.period)
    }
}

/// RSI over a raw close slice. Requires at least `period + 1` values to
/// produce anything but NaN.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    // Index 0 has no change and is never inside a window.
    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        if !delta.is_nan() {
            gains[i] = delta.max(0.0);
            losses[i] = (-delta).max(0.0);
        }
    }

    for i in period..n {
        let window = (i + 1 - period)..=i;
        let gain_window = &gains[window.clone()];
        let loss_window = &losses[window];
        if gain_window.iter().any(|g| g.is_nan()) {
            continue;
        }

        let avg_gain = gain_window.iter().sum::<f64>() / period as f64;
        let avg_loss = loss_window.iter().sum::<f64>() / period as f64;
        let rs = avg_gain / (avg_loss + RSI_EPSILON);
        result[i] = 100.0 - 100.0 / (1.0 + rs);
    }

    result
}
