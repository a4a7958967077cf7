//! Trailing volume baseline.

/// Mean of the last `window` values, or of every value when fewer are
/// available. `None` for an empty input or a zero window.
pub fn rolling_mean_tail(values: &[f64], window: usize) -> Option<f64> {
    if values.is_empty() || window == 0 {
        return None;
    }
    let start = values.len().saturating_sub(window);
    let tail = &values[start..];
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn mean_over_full_window_includes_latest() {
        let mut volumes = vec![1500.0; 199];
        volumes.push(2000.0);
        // (19 * 1500 + 2000) / 20
        assert_approx(rolling_mean_tail(&volumes, 20).unwrap(), 1525.0, DEFAULT_EPSILON);
    }

    #[test]
    fn short_history_uses_available_sample() {
        assert_approx(
            rolling_mean_tail(&[10.0, 20.0, 30.0], 20).unwrap(),
            20.0,
            DEFAULT_EPSILON,
        );
    }

    #[test]
    fn empty_or_zero_window_is_none() {
        assert_eq!(rolling_mean_tail(&[], 20), None);
        assert_eq!(rolling_mean_tail(&[1.0], 0), None);
    }
}
