//! Radar CLI: poll market data and print signals.
//!
//! Commands:
//! - `watch`: poll one asset once or continuously, alerting above a threshold
//! - `scan`: poll every watch in a TOML watch list, one thread per watch
//! - `score`: score a CSV file of bars offline and print the breakdown

mod console;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use radar_core::config::{
    PollConfig, WatchList, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_HISTORY_LIMIT,
    DEFAULT_INTERVAL_SECS, DEFAULT_THRESHOLD,
};
use radar_core::data::{read_series, ProviderFactory, SourceKind};
use radar_core::domain::{Asset, Timeframe};
use radar_core::indicators::enrich;
use radar_core::poller::{Monitor, Poller, RunSummary, StopToken};
use radar_core::signal::{score_signal, scorecard};

use console::ConsoleSink;

#[derive(Parser)]
#[command(
    name = "radar",
    version,
    about = "Radar CLI: EMA/RSI/volume signals for crypto and forex pairs"
)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll one asset and print its signal.
    Watch {
        /// Crypto pair (BTC/USDT) or forex pair (EURUSD).
        asset: Asset,

        /// Bar timeframe: 1m, 3m, 5m or 15m.
        #[arg(long, short = 't', default_value = "5m")]
        timeframe: Timeframe,

        /// Minimum confidence (50-100) that raises an alert.
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: u8,

        /// Seconds between polls (10-600).
        #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
        interval: u64,

        /// Poll once and exit.
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Stop after this many cycles.
        #[arg(long, conflicts_with = "once")]
        cycles: Option<u64>,

        /// Data source: auto, binance, alpha_vantage, csv or synthetic.
        #[arg(long, default_value = "auto")]
        source: SourceKind,

        /// CSV file to replay (with --source csv).
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Bars requested per fetch.
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,

        /// Per-fetch timeout in seconds (1-120).
        #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
        fetch_timeout: u64,

        /// Print events as JSON lines.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Poll every asset in a watch list until Enter is pressed.
    Scan {
        /// Watch-list TOML. Defaults to the built-in crypto and forex majors.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print events as JSON lines.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Score a CSV file of bars without polling.
    Score {
        /// CSV with timestamp,open,high,low,close[,volume].
        #[arg(long)]
        csv: PathBuf,

        /// Asset the bars belong to.
        #[arg(long)]
        asset: Asset,

        #[arg(long, short = 't', default_value = "5m")]
        timeframe: Timeframe,

        /// Print the result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // A missing .env is normal; keys may come from the real environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Watch {
            asset,
            timeframe,
            threshold,
            interval,
            once,
            cycles,
            source,
            csv,
            limit,
            fetch_timeout,
            json,
        } => {
            let config = PollConfig::builder(asset)
                .timeframe(timeframe)
                .threshold(threshold)
                .interval_secs(interval)
                .auto_repeat(!once)
                .history_limit(limit)
                .fetch_timeout_secs(fetch_timeout)
                .build()?;
            run_watch(config, source, csv.as_deref(), cycles, json)
        }
        Commands::Scan { config, json } => run_scan(config.as_deref(), json),
        Commands::Score {
            csv,
            asset,
            timeframe,
            json,
        } => run_score(&csv, &asset, timeframe, json),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Stop `token` when a line (or just Enter) arrives on stdin. EOF is ignored
/// so piped or detached runs keep polling.
fn stop_on_enter(token: StopToken) {
    let spawned = thread::Builder::new()
        .name("radar-stdin".into())
        .spawn(move || {
            let mut line = String::new();
            if let Ok(n) = std::io::stdin().lock().read_line(&mut line) {
                if n > 0 {
                    info!("stop requested");
                    token.stop();
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "could not watch stdin; stop with Ctrl-C");
    }
}

fn print_summary(watch: &str, summary: &RunSummary) {
    eprintln!(
        "{watch}: {} cycles, {} signals, {} alerts, {} errors",
        summary.cycles, summary.signals, summary.alerts, summary.errors
    );
}

fn run_watch(
    config: PollConfig,
    source: SourceKind,
    csv: Option<&Path>,
    cycles: Option<u64>,
    json: bool,
) -> Result<()> {
    let factory = ProviderFactory::new(config.fetch_timeout());
    let provider = factory
        .build(source, config.asset(), csv)
        .with_context(|| format!("no data source for {}", config.asset()))?;
    info!(
        asset = %config.asset(),
        timeframe = %config.timeframe(),
        provider = provider.name(),
        "watch configured"
    );

    let label = format!("{} {}", config.asset(), config.timeframe());
    let single_shot = !config.auto_repeat();
    let mut poller = Poller::new(config, provider, Box::new(ConsoleSink::new(json)));

    let summary = match cycles {
        Some(n) => poller.run_cycles(n),
        None if single_shot => poller.run(),
        None => {
            eprintln!("Polling {label}; press Enter to stop.");
            stop_on_enter(poller.stop_token());
            poller.run()
        }
    };

    if !json {
        print_summary(&label, &summary);
    }
    if single_shot && summary.errors > 0 {
        bail!("fetch failed for {label}");
    }
    Ok(())
}

fn run_scan(config: Option<&Path>, json: bool) -> Result<()> {
    let list = match config {
        Some(path) => WatchList::from_file(path)?,
        None => WatchList::default_markets(),
    };
    let watches = list.resolve()?;
    if watches.is_empty() {
        bail!("watch list has no [[watch]] entries");
    }

    let timeout = watches
        .iter()
        .map(|w| w.config.fetch_timeout())
        .max()
        .unwrap_or(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
    let factory = ProviderFactory::new(timeout);
    let mut monitor = Monitor::new();
    for watch in watches {
        let asset = watch.config.asset().clone();
        let provider = match factory.build(watch.source, &asset, watch.csv_path.as_deref()) {
            Ok(p) => p,
            Err(e) => {
                warn!(%asset, error = %e, "skipping watch");
                continue;
            }
        };
        let poller = Poller::new(watch.config, provider, Box::new(ConsoleSink::new(json)));
        monitor
            .spawn(poller)
            .with_context(|| format!("spawn driver for {asset}"))?;
    }
    if monitor.is_empty() {
        bail!("no watch could be started");
    }

    eprintln!("Scanning {} watches; press Enter to stop.", monitor.len());
    stop_on_enter(monitor.stop_token());

    for (watch, summary) in monitor.join() {
        if !json {
            print_summary(&watch, &summary);
        }
    }
    Ok(())
}

fn run_score(csv: &Path, asset: &Asset, timeframe: Timeframe, json: bool) -> Result<()> {
    let series = read_series(csv, asset, timeframe)
        .with_context(|| format!("read {}", csv.display()))?;
    let enriched = enrich(series);
    let result = score_signal(&enriched);

    if json {
        let value = serde_json::json!({
            "asset": asset.to_string(),
            "timeframe": timeframe.as_str(),
            "bars": enriched.len(),
            "breakdown": scorecard(&enriched).map(|c| c.breakdown),
            "result": result,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{asset} {timeframe}: {} bars", enriched.len());
    if let Some(latest) = enriched.latest() {
        println!(
            "Latest close {:.5} at {}  EMA9 {:.5}  EMA21 {:.5}  RSI {:.1}",
            latest.bar.close,
            latest.bar.timestamp.format("%Y-%m-%d %H:%M"),
            latest.ema9,
            latest.ema21,
            latest.rsi
        );
    }
    if let Some(card) = scorecard(&enriched) {
        println!(
            "Trend {:>2} | Momentum {:>2} | Volume {:>2}",
            card.breakdown.trend, card.breakdown.momentum, card.breakdown.volume
        );
    }
    println!("Signal: {result}");
    Ok(())
}
