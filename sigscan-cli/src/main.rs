//! SigScan CLI: scan a watchlist, watch it, or score a single CSV file.
//!
//! Commands:
//! - `scan`: one pass over the watchlist, summary table plus optional detail/JSON
//! - `watch`: repeated scans on a fixed cadence sharing one series cache
//! - `eval`: score the newest bar of one CSV file
//! - `params`: print the default engine parameters as TOML

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sigscan_core::domain::Interval;
use sigscan_core::{EngineParams, SignalEngine};
use sigscan_runner::report;
use sigscan_runner::{read_bars_csv, ProviderKind, ScanConfig, ScanReport, Scanner};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sigscan",
    version,
    about = "SigScan: multi-indicator crypto signal scanner"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every watchlist instrument once and print a summary.
    Scan {
        /// Path to a TOML scan config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bar interval (1m, 5m, 15m, 30m, 1h, 4h, 1d). Overrides the config.
        #[arg(long)]
        interval: Option<String>,

        /// Bar source: kraken, csv or synthetic. Overrides the config.
        #[arg(long)]
        provider: Option<String>,

        /// Directory of CSV bar files (csv provider).
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Print the detail block for this instrument (name or symbol).
        #[arg(long)]
        detail: Option<String>,

        /// Write the full report as JSON to this file.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Rescan on a fixed cadence.
    Watch {
        /// Path to a TOML scan config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seconds between scans.
        #[arg(long)]
        every: u64,

        /// Stop after this many scans. Runs until interrupted when omitted.
        #[arg(long)]
        iterations: Option<u64>,
    },
    /// Score the newest bar of a CSV file (timestamp,open,high,low,close,volume).
    Eval {
        /// CSV bar file, oldest or newest first.
        #[arg(long)]
        csv: PathBuf,

        /// TOML engine parameter overrides.
        #[arg(long)]
        params: Option<PathBuf>,
    },
    /// Print the default engine parameters as TOML.
    Params,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            config,
            interval,
            provider,
            csv_dir,
            detail,
            json,
        } => run_scan(config, interval, provider, csv_dir, detail, json),
        Commands::Watch {
            config,
            every,
            iterations,
        } => run_watch(config, every, iterations),
        Commands::Eval { csv, params } => run_eval(&csv, params.as_deref()),
        Commands::Params => run_params(),
    }
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(path) => Ok(ScanConfig::load(path)?),
        None => Ok(ScanConfig::default()),
    }
}

fn run_scan(
    config_path: Option<PathBuf>,
    interval: Option<String>,
    provider: Option<String>,
    csv_dir: Option<PathBuf>,
    detail: Option<String>,
    json: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    if let Some(interval) = interval {
        config.interval = interval.parse::<Interval>()?;
    }
    if let Some(provider) = provider {
        config.provider = provider.parse::<ProviderKind>()?;
    }
    if csv_dir.is_some() {
        config.csv_dir = csv_dir;
    }
    config.validate()?;

    let scanner = Scanner::from_config(&config)?;
    let scan = scanner.scan();
    print!("{}", report::summary(&scan));

    if let Some(key) = detail {
        let Some(entry) = scan.entry(&key) else {
            bail!("'{key}' is not on the watchlist");
        };
        println!();
        print!("{}", report::detail(entry));
    }

    if let Some(path) = json {
        report::write_json(&path, &scan)?;
        println!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn run_watch(config_path: Option<PathBuf>, every: u64, iterations: Option<u64>) -> Result<()> {
    if every == 0 {
        bail!("--every must be at least 1 second");
    }
    let config = load_config(config_path.as_deref())?;
    let scanner = Scanner::from_config(&config)?;

    let mut pass = 0u64;
    loop {
        pass += 1;
        let scan: ScanReport = scanner.scan();
        print!("{}", report::summary(&scan));
        for entry in scan.actionable() {
            print!("{}", report::detail(entry));
        }
        println!();

        if iterations.is_some_and(|n| pass >= n) {
            break;
        }
        info!(pass, next_in_secs = every, "waiting for next scan");
        std::thread::sleep(Duration::from_secs(every));
    }
    Ok(())
}

fn run_eval(csv: &Path, params_path: Option<&Path>) -> Result<()> {
    let params = match params_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read params from {}", path.display()))?;
            EngineParams::from_toml_str(&text)?
        }
        None => EngineParams::default(),
    };
    let engine = SignalEngine::new(params)?;

    let bars = read_bars_csv(csv)?;
    let signal = engine.evaluate(&bars).with_context(|| {
        format!(
            "{}: {} bars loaded, {} required",
            csv.display(),
            bars.len(),
            engine.required_history()
        )
    })?;

    let title = csv
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| csv.display().to_string());
    print!("{}", report::signal_detail(&title, &signal));
    Ok(())
}

fn run_params() -> Result<()> {
    let params = EngineParams::default();
    print!("{}", params.to_toml_string()?);
    println!("# fingerprint: {}", params.fingerprint());
    Ok(())
}
