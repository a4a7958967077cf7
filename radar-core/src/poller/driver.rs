//! The polling driver: fetch, enrich, score, emit, sleep, repeat.
//!
//! One driver owns one watch. Cycles never overlap; a failed fetch is reported
//! to the sink and the loop carries on. Only the stop token ends a continuous
//! run.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::sink::{Alert, CycleFailure, CycleReport, SignalSink};
use super::stop::StopToken;
use crate::config::PollConfig;
use crate::data::{DataProvider, FetchError, TimeoutProvider};
use crate::indicators::enrich;
use crate::signal::score_signal;

/// Waits between cycles.
pub trait Sleeper: Send {
    /// Wait up to `interval`. Returns `true` if the driver should stop.
    fn sleep(&mut self, interval: Duration, stop: &StopToken) -> bool;
}

/// Default sleeper: blocks on the stop token so cancellation is immediate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopAwareSleeper;

impl Sleeper for StopAwareSleeper {
    fn sleep(&mut self, interval: Duration, stop: &StopToken) -> bool {
        stop.wait_timeout(interval)
    }
}

impl<F> Sleeper for F
where
    F: FnMut(Duration, &StopToken) -> bool + Send,
{
    fn sleep(&mut self, interval: Duration, stop: &StopToken) -> bool {
        self(interval, stop)
    }
}

/// Counters for a finished (or stopped) run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub signals: u64,
    pub alerts: u64,
    pub errors: u64,
    pub indeterminate: u64,
}

/// What a single cycle produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Scored { alerted: bool },
    Failed,
}

pub struct Poller {
    config: PollConfig,
    provider: Arc<dyn DataProvider>,
    sink: Box<dyn SignalSink>,
    sleeper: Box<dyn Sleeper>,
    stop: StopToken,
    summary: RunSummary,
}

impl Poller {
    /// Every fetch is bounded by the config's fetch timeout.
    pub fn new(
        config: PollConfig,
        provider: Arc<dyn DataProvider>,
        sink: Box<dyn SignalSink>,
    ) -> Self {
        let provider: Arc<dyn DataProvider> =
            Arc::new(TimeoutProvider::new(provider, config.fetch_timeout()));
        Self {
            config,
            provider,
            sink,
            sleeper: Box::new(StopAwareSleeper),
            stop: StopToken::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = stop;
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Fetch, score and emit once.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.summary.cycles += 1;
        let cycle = self.summary.cycles;
        let asset = self.config.asset();
        let timeframe = self.config.timeframe();

        let fetched = self
            .provider
            .fetch(asset, timeframe, self.config.history_limit())
            .and_then(|series| {
                if series.is_empty() {
                    Err(FetchError::NoData {
                        symbol: asset.exchange_symbol(),
                    })
                } else {
                    Ok(series)
                }
            });
        let series = match fetched {
            Ok(series) => series,
            Err(e) => {
                warn!(%asset, %timeframe, cycle, provider = self.provider.name(), error = %e, "fetch failed; skipping cycle");
                self.summary.errors += 1;
                self.sink.emit_error(&CycleFailure {
                    asset: asset.clone(),
                    timeframe,
                    cycle,
                    reason: e.to_string(),
                });
                return CycleOutcome::Failed;
            }
        };

        debug!(%asset, bars = series.len(), "series fetched");
        if let Some(bar) = series.latest().filter(|b| !b.is_sane()) {
            warn!(%asset, timestamp = %bar.timestamp, "latest bar fails OHLC sanity check");
        }
        let enriched = enrich(series);
        let result = score_signal(&enriched);
        info!(%asset, %timeframe, cycle, signal = %result, "cycle scored");

        self.summary.signals += 1;
        if result.is_indeterminate() {
            self.summary.indeterminate += 1;
        }

        let alert = match result.confidence() {
            Some(confidence) if result.meets_threshold(self.config.threshold()) => Some(Alert {
                asset: asset.clone(),
                timeframe,
                cycle,
                label: result.label(),
                confidence,
                threshold: self.config.threshold(),
            }),
            _ => None,
        };

        self.sink.emit(&CycleReport::new(cycle, &enriched, result));
        if let Some(alert) = &alert {
            self.summary.alerts += 1;
            self.sink.emit_alert(alert);
        }

        CycleOutcome::Scored {
            alerted: alert.is_some(),
        }
    }

    /// Single-shot or continuous, per `auto_repeat`.
    pub fn run(&mut self) -> RunSummary {
        if !self.config.auto_repeat() {
            self.run_cycle();
            return self.summary;
        }

        info!(
            asset = %self.config.asset(),
            timeframe = %self.config.timeframe(),
            interval_secs = self.config.interval().as_secs(),
            threshold = self.config.threshold(),
            "polling started"
        );
        while !self.stop.is_stopped() {
            self.run_cycle();
            if self.sleeper.sleep(self.config.interval(), &self.stop) {
                break;
            }
        }
        info!(asset = %self.config.asset(), cycles = self.summary.cycles, "polling stopped");
        self.summary
    }

    /// Run `n` cycles (fewer if stopped), sleeping between them but not after
    /// the last.
    pub fn run_cycles(&mut self, n: u64) -> RunSummary {
        for i in 0..n {
            if self.stop.is_stopped() {
                break;
            }
            self.run_cycle();
            if i + 1 < n && self.sleeper.sleep(self.config.interval(), &self.stop) {
                break;
            }
        }
        self.summary
    }
}
