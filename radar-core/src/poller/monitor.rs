//! Runs several drivers at once, one named thread per watch.

use std::io;
use std::thread::{self, JoinHandle};

use tracing::error;

use super::driver::{Poller, RunSummary};
use super::stop::StopToken;

/// Owns the driver threads and the stop token they share.
#[derive(Default)]
pub struct Monitor {
    stop: StopToken,
    handles: Vec<(String, JoinHandle<RunSummary>)>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `poller` on its own thread, bound to this monitor's stop token.
    pub fn spawn(&mut self, poller: Poller) -> io::Result<()> {
        let watch = format!("{} {}", poller.config().asset(), poller.config().timeframe());
        let mut poller = poller.with_stop_token(self.stop.clone());
        let handle = thread::Builder::new()
            .name(format!("radar-{}", poller.config().asset().exchange_symbol()))
            .spawn(move || poller.run())?;
        self.handles.push((watch, handle));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Wait for every driver to return. A driver that panicked is logged and
    /// left out of the result.
    pub fn join(self) -> Vec<(String, RunSummary)> {
        self.handles
            .into_iter()
            .filter_map(|(watch, handle)| match handle.join() {
                Ok(summary) => Some((watch, summary)),
                Err(_) => {
                    error!(%watch, "driver thread panicked");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::PollConfig;
    use crate::data::SyntheticProvider;
    use crate::domain::Asset;
    use crate::poller::{ChannelSink, SinkEvent};

    #[test]
    fn stop_ends_every_driver() {
        let (sink, rx) = ChannelSink::pair();
        let provider = Arc::new(SyntheticProvider::new(11));
        let mut monitor = Monitor::new();
        for asset in [Asset::crypto("BTC", "USDT"), Asset::forex("EUR", "USD")] {
            let config = PollConfig::builder(asset).interval_secs(600).build().unwrap();
            monitor
                .spawn(Poller::new(config, provider.clone(), Box::new(sink.clone())))
                .unwrap();
        }
        assert_eq!(monitor.len(), 2);

        // Each driver runs its first cycle before sleeping.
        let signals = rx
            .iter()
            .filter(|e| matches!(e, SinkEvent::Signal(_)))
            .take(2)
            .count();
        assert_eq!(signals, 2);

        monitor.stop();
        let summaries = monitor.join();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|(_, s)| s.cycles == 1 && s.errors == 0));
    }
}
