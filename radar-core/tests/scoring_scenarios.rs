//! End-to-end scoring scenarios: series in, signal out.
//!
//! Each scenario builds a 5-minute series, enriches it and checks the label,
//! confidence and rationale the scorer produces.

use chrono::{Duration, TimeZone, Utc};
use radar_core::domain::{Asset, Bar, Series, Timeframe};
use radar_core::indicators::enrich;
use radar_core::signal::{label_for, score_signal, scorecard, Label, ScoreBreakdown, MIN_HISTORY};

// ── Helpers ──────────────────────────────────────────────────────────

fn series(closes: &[f64], volumes: &[f64]) -> Series {
    assert_eq!(closes.len(), volumes.len());
    let start = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();
    let bars = closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: start + Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume,
            }
        })
        .collect();
    Series::new(Asset::crypto("BTC", "USDT"), Timeframe::M5, bars).unwrap()
}

/// 200 closes rising linearly from 100 to 150.
fn linear_ramp() -> Vec<f64> {
    (0..200).map(|i| 100.0 + 50.0 * i as f64 / 199.0).collect()
}

/// Up +2 / down -1.5 alternating, ending on an up move: uptrend with RSI ~57.
fn choppy_uptrend(n: usize) -> Vec<f64> {
    let mut closes = vec![100.0];
    for i in 1..n {
        let step = if i % 2 == 1 { 2.0 } else { -1.5 };
        closes.push(closes[i - 1] + step);
    }
    closes
}

/// Mirror of the choppy uptrend: downtrend with RSI ~43.
fn choppy_downtrend(n: usize) -> Vec<f64> {
    let mut closes = vec![500.0];
    for i in 1..n {
        let step = if i % 2 == 1 { -2.0 } else { 1.5 };
        closes.push(closes[i - 1] + step);
    }
    closes
}

fn flat_volume_with_spike(n: usize, base: f64, last: f64) -> Vec<f64> {
    let mut v = vec![base; n];
    v[n - 1] = last;
    v
}

// ── Reference scenario ──────────────────────────────────────────────

#[test]
fn linear_ramp_with_volume_spike_scores_70_potential() {
    let s = series(&linear_ramp(), &flat_volume_with_spike(200, 1500.0, 2000.0));
    let result = score_signal(&enrich(s));

    assert_eq!(result.confidence(), Some(70));
    assert_eq!(result.label(), Label::Potential);
    assert_eq!(
        result.rationale(),
        ["EMA9>EMA21", "RSI out of range: 100.0", "Volume spike"]
    );
}

#[test]
fn scoring_is_deterministic() {
    let s = series(&choppy_uptrend(120), &flat_volume_with_spike(120, 900.0, 1500.0));
    let enriched = enrich(s);
    let first = score_signal(&enriched);
    for _ in 0..5 {
        assert_eq!(score_signal(&enriched), first);
    }
    assert_eq!(score_signal(&enriched.clone()), first);
}

// ── Score → label table ─────────────────────────────────────────────

#[test]
fn all_three_checks_score_100_rise() {
    let s = series(&choppy_uptrend(200), &flat_volume_with_spike(200, 1000.0, 5000.0));
    let card = scorecard(&enrich(s)).unwrap();
    assert_eq!(
        card.breakdown,
        ScoreBreakdown {
            trend: 50,
            momentum: 30,
            volume: 20
        }
    );
    assert_eq!(card.label(), Label::Rise);
}

#[test]
fn trend_and_momentum_score_80_rise() {
    let s = series(&choppy_uptrend(200), &vec![1000.0; 200]);
    let result = score_signal(&enrich(s));
    assert_eq!(result.confidence(), Some(80));
    assert_eq!(result.label(), Label::Rise);
    assert_eq!(result.rationale()[0], "EMA9>EMA21");
    assert!(result.rationale()[1].starts_with("RSI in range: 57."));
    assert_eq!(result.rationale()[2], "Volume normal");
}

#[test]
fn trend_alone_scores_50_potential() {
    let s = series(&linear_ramp(), &vec![1500.0; 200]);
    let result = score_signal(&enrich(s));
    assert_eq!(result.confidence(), Some(50));
    assert_eq!(result.label(), Label::Potential);
}

#[test]
fn momentum_alone_scores_30_wait() {
    let s = series(&choppy_downtrend(200), &vec![1000.0; 200]);
    let result = score_signal(&enrich(s));
    assert_eq!(result.confidence(), Some(30));
    assert_eq!(result.label(), Label::Wait);
    assert_eq!(result.rationale()[0], "EMA9<EMA21");
}

#[test]
fn volume_alone_scores_20_wait() {
    let falling: Vec<f64> = (0..100).map(|i| 300.0 - i as f64).collect();
    let s = series(&falling, &flat_volume_with_spike(100, 1000.0, 3000.0));
    let result = score_signal(&enrich(s));
    assert_eq!(result.confidence(), Some(20));
    assert_eq!(result.label(), Label::Wait);
    assert_eq!(
        result.rationale(),
        ["EMA9<EMA21", "RSI out of range: 0.0", "Volume spike"]
    );
}

#[test]
fn a_fall_needs_a_strong_score_without_trend() {
    // Without the trend points the best total is 50, so the scorer itself
    // never reaches FALL; the mapping still defines it.
    assert_eq!(label_for(80, false), Label::Fall);
    assert_eq!(label_for(75, false), Label::Fall);
    assert_eq!(label_for(74, true), Label::Potential);
    assert_eq!(label_for(45, false), Label::Potential);
    assert_eq!(label_for(44, true), Label::Wait);
}

// ── Edge cases ──────────────────────────────────────────────────────

#[test]
fn flat_prices_award_nothing() {
    let s = series(&vec![42.0; 60], &vec![10.0; 60]);
    let result = score_signal(&enrich(s));
    assert_eq!(result.confidence(), Some(0));
    assert_eq!(result.label(), Label::Wait);
    assert_eq!(
        result.rationale(),
        ["EMA9<EMA21", "RSI out of range: 0.0", "Volume normal"]
    );
}

#[test]
fn forex_series_skips_the_volume_check() {
    let s = series(&choppy_uptrend(200), &vec![0.0; 200]).without_volume();
    let result = score_signal(&enrich(s));
    assert_eq!(result.confidence(), Some(80));
    assert_eq!(result.rationale()[2], "Volume unavailable");
}

#[test]
fn short_history_is_indeterminate() {
    let closes: Vec<f64> = (0..MIN_HISTORY - 1).map(|i| 100.0 + i as f64).collect();
    let s = series(&closes, &vec![1.0; closes.len()]);
    let result = score_signal(&enrich(s));
    assert!(result.is_indeterminate());
    assert_eq!(result.label(), Label::Wait);
    assert_eq!(result.rationale(), ["Insufficient history: 14 bars, need 15"]);
}

#[test]
fn minimum_history_is_scored() {
    let closes: Vec<f64> = (0..MIN_HISTORY).map(|i| 100.0 + i as f64).collect();
    let s = series(&closes, &vec![1.0; closes.len()]);
    let result = score_signal(&enrich(s));
    assert!(!result.is_indeterminate());
    assert_eq!(result.confidence(), Some(50));
}

#[test]
fn empty_series_is_indeterminate() {
    let s = series(&[], &[]);
    let result = score_signal(&enrich(s));
    assert_eq!(result.rationale(), ["Insufficient history: 0 bars, need 15"]);
}
