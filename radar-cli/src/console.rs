//! Terminal sink: human-readable lines or JSON lines.

use std::io::{self, Write};

use radar_core::poller::{Alert, CycleFailure, CycleReport, SignalSink, SinkEvent};

fn fmt_opt(v: Option<f64>, precision: usize) -> String {
    match v {
        Some(v) => format!("{v:.precision$}"),
        None => "n/a".to_string(),
    }
}

/// Prints each event as it arrives. Signals and alerts go to stdout,
/// failures to stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    json: bool,
}

impl ConsoleSink {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn json_line(&self, event: SinkEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("Error: could not encode event: {e}"),
        }
    }
}

impl SignalSink for ConsoleSink {
    fn emit(&mut self, report: &CycleReport) {
        if self.json {
            return self.json_line(SinkEvent::Signal(report.clone()));
        }
        let when = report
            .bar_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut out = io::stdout().lock();
        let _ = writeln!(
            out,
            "[{when}] {} {}  close {}  EMA9 {}  EMA21 {}  RSI {}  ({} bars)",
            report.asset,
            report.timeframe,
            fmt_opt(report.close, 5),
            fmt_opt(report.ema9, 5),
            fmt_opt(report.ema21, 5),
            fmt_opt(report.rsi, 1),
            report.bars,
        );
        let _ = writeln!(out, "Signal: {}", report.result);
    }

    fn emit_alert(&mut self, alert: &Alert) {
        if self.json {
            return self.json_line(SinkEvent::Alert(alert.clone()));
        }
        println!(
            "ALERT: {} {} {} at {}% (threshold {}%)",
            alert.asset, alert.timeframe, alert.label, alert.confidence, alert.threshold
        );
    }

    fn emit_error(&mut self, failure: &CycleFailure) {
        if self.json {
            return self.json_line(SinkEvent::Error(failure.clone()));
        }
        eprintln!(
            "Error: {} {} cycle {} skipped: {}",
            failure.asset, failure.timeframe, failure.cycle, failure.reason
        );
    }
}
