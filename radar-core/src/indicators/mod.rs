//! Indicator library.
//!
//! Indicators are pure functions: close (or volume) history in, numeric series
//! out, same length as the input. Warm-up positions are `f64::NAN`. Nothing here
//! panics on empty or short input.

pub mod ema;
pub mod enriched;
pub mod rsi;
pub mod volume;

pub use ema::{ema, Ema};
pub use enriched::{enrich, EnrichError, EnrichedBar, EnrichedSeries};
pub use rsi::{rsi, Rsi, RSI_EPSILON};
pub use volume::rolling_mean_tail;

use crate::domain::Bar;

/// Fast trend line period.
pub const FAST_EMA_PERIOD: usize = 9;
/// Slow trend line period.
pub const SLOW_EMA_PERIOD: usize = 21;
/// Momentum oscillator period.
pub const RSI_PERIOD: usize = 14;
/// Trailing window for the volume baseline.
pub const VOLUME_WINDOW: usize = 20;

/// Trait for bar-based indicators.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on bar t+1 or later: computing over a
/// truncated series must reproduce the prefix of the full computation.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_9", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are `f64::NAN` in the output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Create synthetic one-minute bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high/low one unit outside
/// the body, volume = 1000.
#[cfg(test)]
pub(crate) fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::TimeZone;
    let start = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: start + chrono::Duration::minutes(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    /// Truncated-vs-full check for every indicator the scorer relies on.
    #[test]
    fn indicators_have_no_lookahead() {
        let prices: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
            .collect();
        let bars = make_bars(&prices);
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Ema::new(FAST_EMA_PERIOD)),
            Box::new(Ema::new(SLOW_EMA_PERIOD)),
            Box::new(Rsi::new(RSI_PERIOD)),
        ];
        for indicator in &indicators {
            let full = indicator.compute(&bars);
            for cut in [1, 10, 15, 30, 59] {
                let partial = indicator.compute(&bars[..cut]);
                for (i, (&a, &b)) in partial.iter().zip(&full).enumerate() {
                    assert!(
                        (a.is_nan() && b.is_nan()) || (a - b).abs() < DEFAULT_EPSILON,
                        "{} differs at {i} when truncated to {cut}",
                        indicator.name()
                    );
                }
            }
        }
    }
}
