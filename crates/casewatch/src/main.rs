mod bootstrap;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use casewatch_core::time_utils::ObservationClock;
use casewatch_data::aggregator::Aggregator;
use casewatch_data::reader::FsSource;
use casewatch_runtime::data_manager::{EpochManager, DEFAULT_CACHE_TTL_SECS};
use clap::{Parser, ValueEnum};

/// Which aggregate view to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Report {
    /// Per-region status, region names at the top level.
    Status,
    /// Per-region status nested under a `countries` key.
    StatusList,
    /// Global confirmed-case sum.
    Confirmed,
    /// Global death sum.
    Deaths,
    /// Global recovered sum.
    Recovered,
    /// All three global sums.
    Totals,
    /// Sorted list of affected regions.
    Countries,
    /// Raw time-series tables.
    TimeSeries,
}

#[derive(Parser)]
#[command(
    name = "casewatch",
    about = "Aggregate epidemic case-count tables into JSON summaries",
    version
)]
struct Cli {
    /// Directory holding the snapshot/ and time_series/ JSON tables.
    #[arg(long, env = "CASEWATCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Which summary to print.
    #[arg(long, value_enum, default_value_t = Report::Totals)]
    report: Report,

    /// IANA timezone used to stamp the observation date.
    #[arg(long, default_value = "UTC")]
    timezone: String,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,

    /// Keep running, reprinting the report each refresh cycle.
    #[arg(long)]
    watch: bool,

    /// Refresh cadence in seconds for --watch mode.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    refresh_secs: u64,

    /// Log filter directive, e.g. "debug".
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    bootstrap::setup_logging(&cli.log_level)?;

    tracing::info!("casewatch v{} starting", env!("CARGO_PKG_VERSION"));

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(bootstrap::discover_data_dir)
        .ok_or_else(|| {
            anyhow!("no data directory found; pass --data-dir or set CASEWATCH_DATA_DIR")
        })?;
    tracing::info!("using data directory {}", data_dir.display());

    let source = FsSource::new(data_dir);
    let clock = ObservationClock::new(&cli.timezone);

    if cli.watch {
        run_watch(source, clock, &cli)
    } else {
        let aggregator = Aggregator::with_clock(&source, &clock)?;
        println!("{}", render(&aggregator, cli.report, cli.pretty)?);
        Ok(())
    }
}

/// Reprint the report once per refresh cycle until interrupted.
fn run_watch(source: FsSource, clock: ObservationClock, cli: &Cli) -> Result<()> {
    let mut manager = EpochManager::new(source, cli.refresh_secs, clock);

    loop {
        match manager.get(false) {
            Some(aggregator) => println!("{}", render(aggregator, cli.report, cli.pretty)?),
            None => tracing::warn!(
                error = manager.last_error().unwrap_or("unknown"),
                "no epoch available yet"
            ),
        }
        thread::sleep(Duration::from_secs(cli.refresh_secs));
    }
}

/// Serialize the selected report to a JSON string.
///
/// Serializes directly to text; a `serde_json::Value` intermediate would
/// re-sort the region keys of the status reports alphabetically.
fn render(aggregator: &Aggregator, report: Report, pretty: bool) -> Result<String> {
    match report {
        Report::Status => to_json(&aggregator.current_status(false)?, pretty),
        Report::StatusList => to_json(&aggregator.current_status(true)?, pretty),
        Report::Confirmed => to_json(&aggregator.confirmed_cases()?, pretty),
        Report::Deaths => to_json(&aggregator.deaths()?, pretty),
        Report::Recovered => to_json(&aggregator.recovered()?, pretty),
        Report::Totals => to_json(&aggregator.totals()?, pretty),
        Report::Countries => to_json(&aggregator.affected_countries(), pretty),
        Report::TimeSeries => to_json(&aggregator.time_series(), pretty),
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}
