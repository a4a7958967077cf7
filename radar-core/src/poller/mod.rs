//! Polling driver, cancellation and output sinks.

pub mod driver;
pub mod monitor;
pub mod sink;
pub mod stop;

pub use driver::{CycleOutcome, Poller, RunSummary, Sleeper, StopAwareSleeper};
pub use monitor::Monitor;
pub use sink::{Alert, ChannelSink, CycleFailure, CycleReport, LogSink, SignalSink, SinkEvent};
pub use stop::StopToken;
