//! Deterministic random-walk bars for development and demos.
//!
//! The walk is seeded from the symbol (blake3) mixed with a caller seed, so the
//! same asset always produces the same prices. Each fetch advances the feed by
//! one bar, which makes a polling loop see a moving market. Each instrument
//! keeps a bounded window of its walk between fetches. These bars are
//! fake and every fetch says so in the log.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use super::provider::{DataProvider, FetchError};
use crate::config::MAX_HISTORY_LIMIT;
use crate::domain::{Asset, Bar, Series, Timeframe};

/// One instrument's walk. Holds at most [`MAX_HISTORY_LIMIT`] bars.
struct Walk {
    rng: StdRng,
    price: f64,
    max_move: f64,
    forex: bool,
    step: Duration,
    bars: VecDeque<Bar>,
}

impl Walk {
    /// Start a walk whose full window ends at `last`.
    fn new(rng: StdRng, asset: &Asset, timeframe: Timeframe, last: DateTime<Utc>) -> Self {
        let forex = asset.is_forex();
        let (price, max_move) = if forex { (1.1, 0.0008) } else { (100.0, 0.006) };
        let step = Duration::minutes(timeframe.minutes() as i64);
        let mut walk = Self {
            rng,
            price,
            max_move,
            forex,
            step,
            bars: VecDeque::with_capacity(MAX_HISTORY_LIMIT),
        };
        let first = last - step * (MAX_HISTORY_LIMIT as i32 - 1);
        for i in 0..MAX_HISTORY_LIMIT {
            walk.push(first + step * i as i32);
        }
        walk
    }

    fn push(&mut self, timestamp: DateTime<Utc>) {
        let max_move = self.max_move;
        let ret: f64 = self.rng.gen_range(-max_move..max_move);
        let open = self.price;
        let close = open * (1.0 + ret);
        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..max_move / 2.0));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..max_move / 2.0));
        let volume = if self.forex {
            0.0
        } else {
            self.rng.gen_range(500.0..5_000.0)
        };
        self.price = close;
        self.bars.push_back(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
        if self.bars.len() > MAX_HISTORY_LIMIT {
            self.bars.pop_front();
        }
    }

    /// Extend the walk bar by bar until its newest bar is at `last`.
    fn advance_to(&mut self, last: DateTime<Utc>) {
        loop {
            let next = match self.bars.back() {
                Some(bar) => bar.timestamp + self.step,
                None => break,
            };
            if next > last {
                break;
            }
            self.push(next);
        }
    }

    fn tail(&self, limit: usize) -> Vec<Bar> {
        let skip = self.bars.len().saturating_sub(limit);
        self.bars.iter().skip(skip).copied().collect()
    }
}

pub struct SyntheticProvider {
    seed: u64,
    anchor: DateTime<Utc>,
    fetches: AtomicU64,
    walks: Mutex<HashMap<String, Walk>>,
}

impl SyntheticProvider {
    /// Feed whose first fetch ends at the current bar.
    pub fn new(seed: u64) -> Self {
        Self::anchored(seed, Utc::now())
    }

    /// Feed whose first fetch ends at `anchor`.
    pub fn anchored(seed: u64, anchor: DateTime<Utc>) -> Self {
        Self {
            seed,
            anchor,
            fetches: AtomicU64::new(0),
            walks: Mutex::new(HashMap::new()),
        }
    }

    fn rng_for(&self, asset: &Asset, timeframe: Timeframe) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(asset.exchange_symbol().as_bytes());
        hasher.update(timeframe.as_str().as_bytes());
        hasher.update(&self.seed.to_le_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        asset: &Asset,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Series, FetchError> {
        let advanced = self.fetches.fetch_add(1, Ordering::Relaxed);
        let step = Duration::minutes(timeframe.minutes() as i64);
        let anchor = self.anchor.duration_trunc(step).unwrap_or(self.anchor);
        let last = anchor + step * advanced as i32;

        warn!(asset = %asset, %timeframe, "serving SYNTHETIC bars");

        let bars = {
            let mut walks = self
                .walks
                .lock()
                .map_err(|_| FetchError::Provider("synthetic walk state poisoned".into()))?;
            let key = format!("{}:{}", asset.exchange_symbol(), timeframe);
            let walk = walks
                .entry(key)
                .or_insert_with(|| Walk::new(self.rng_for(asset, timeframe), asset, timeframe, last));
            walk.advance_to(last);
            walk.tail(limit)
        };

        let series = Series::new(asset.clone(), timeframe, bars)?;
        Ok(if asset.is_forex() {
            series.without_volume()
        } else {
            series
        })
    }
}
