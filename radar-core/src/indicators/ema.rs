//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1)
//! Seed: EMA[0] = close[0].
//! Lookback: 0 (no warm-up blanks, unlike an SMA-seeded EMA).

use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        ema(&closes(bars), self.period)
    }
}

/// EMA over a raw value slice.
///
/// Returns all-NaN for an empty input or `period == 0`. A NaN input taints
/// every later position.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];

    let Some(&seed) = values.first() else {
        return result;
    };
    if period == 0 || seed.is_nan() {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    result[0] = seed;

    let mut prev = seed;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value.is_nan() {
            return result;
        }
        let next = alpha * value + (1.0 - alpha) * prev;
        result[i] = next;
        prev = next;
    }

    result
}
