//! Deadline wrapper around any provider.
//!
//! The wrapped fetch runs on a short-lived helper thread; the caller waits on
//! a channel with `recv_timeout`. A stalled fetch is abandoned (its thread
//! finishes or dies on its own) and the caller gets `FetchError::Timeout`.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::provider::{DataProvider, FetchError};
use crate::domain::{Asset, Series, Timeframe};

pub struct TimeoutProvider {
    inner: Arc<dyn DataProvider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn DataProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl DataProvider for TimeoutProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(
        &self,
        asset: &Asset,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Series, FetchError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let owned_asset = asset.clone();

        thread::Builder::new()
            .name(format!("radar-fetch-{}", asset.exchange_symbol()))
            .spawn(move || {
                let _ = tx.send(inner.fetch(&owned_asset, timeframe, limit));
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(FetchError::Timeout {
                secs: self.timeout.as_secs(),
            }),
            Err(RecvTimeoutError::Disconnected) => Err(FetchError::Provider(format!(
                "{} fetch thread exited without a result",
                self.inner.name()
            ))),
        }
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}
