//! Where cycle outcomes go.
//!
//! The driver knows nothing about presentation: it hands each report, alert
//! and failure to a [`SignalSink`]. Embedders either implement the trait or
//! take a [`ChannelSink`] and drain the receiver on their own thread.

use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{Asset, Timeframe};
use crate::indicators::EnrichedSeries;
use crate::signal::{Label, SignalResult};

/// Outcome of one successful cycle.
///
/// Indicator values are `None` when undefined (RSI during warm-up).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub asset: Asset,
    pub timeframe: Timeframe,
    pub cycle: u64,
    pub bars: usize,
    pub bar_time: Option<DateTime<Utc>>,
    pub close: Option<f64>,
    pub ema9: Option<f64>,
    pub ema21: Option<f64>,
    pub rsi: Option<f64>,
    pub result: SignalResult,
}

fn defined(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

impl CycleReport {
    pub fn new(cycle: u64, enriched: &EnrichedSeries, result: SignalResult) -> Self {
        let series = enriched.series();
        let latest = enriched.latest();
        Self {
            asset: series.asset().clone(),
            timeframe: series.timeframe(),
            cycle,
            bars: enriched.len(),
            bar_time: latest.map(|l| l.bar.timestamp),
            close: latest.map(|l| l.bar.close),
            ema9: latest.and_then(|l| defined(l.ema9)),
            ema21: latest.and_then(|l| defined(l.ema21)),
            rsi: latest.and_then(|l| defined(l.rsi)),
            result,
        }
    }
}

/// Confidence reached the configured threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub asset: Asset,
    pub timeframe: Timeframe,
    pub cycle: u64,
    pub label: Label,
    pub confidence: u8,
    pub threshold: u8,
}

/// A cycle skipped because the fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleFailure {
    pub asset: Asset,
    pub timeframe: Timeframe,
    pub cycle: u64,
    pub reason: String,
}

pub trait SignalSink: Send {
    fn emit(&mut self, report: &CycleReport);

    fn emit_alert(&mut self, alert: &Alert);

    fn emit_error(&mut self, failure: &CycleFailure);
}

impl<S: SignalSink + ?Sized> SignalSink for Box<S> {
    fn emit(&mut self, report: &CycleReport) {
        (**self).emit(report)
    }

    fn emit_alert(&mut self, alert: &Alert) {
        (**self).emit_alert(alert)
    }

    fn emit_error(&mut self, failure: &CycleFailure) {
        (**self).emit_error(failure)
    }
}

/// Every sink event as one value, for queues and JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent {
    Signal(CycleReport),
    Alert(Alert),
    Error(CycleFailure),
}

/// Forwards events over an mpsc channel.
///
/// A dropped receiver is not an error: the driver keeps polling and the
/// events are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<SinkEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<SinkEvent>) -> Self {
        Self { tx }
    }

    /// A sink and the receiver that drains it.
    pub fn pair() -> (Self, Receiver<SinkEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl SignalSink for ChannelSink {
    fn emit(&mut self, report: &CycleReport) {
        let _ = self.tx.send(SinkEvent::Signal(report.clone()));
    }

    fn emit_alert(&mut self, alert: &Alert) {
        let _ = self.tx.send(SinkEvent::Alert(alert.clone()));
    }

    fn emit_error(&mut self, failure: &CycleFailure) {
        let _ = self.tx.send(SinkEvent::Error(failure.clone()));
    }
}

/// Writes events as `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl SignalSink for LogSink {
    fn emit(&mut self, report: &CycleReport) {
        info!(
            asset = %report.asset,
            timeframe = %report.timeframe,
            cycle = report.cycle,
            signal = %report.result,
            "signal"
        );
    }

    fn emit_alert(&mut self, alert: &Alert) {
        warn!(
            asset = %alert.asset,
            timeframe = %alert.timeframe,
            label = %alert.label,
            confidence = alert.confidence,
            threshold = alert.threshold,
            "ALERT"
        );
    }

    fn emit_error(&mut self, failure: &CycleFailure) {
        warn!(
            asset = %failure.asset,
            cycle = failure.cycle,
            reason = %failure.reason,
            "cycle skipped"
        );
    }
}
