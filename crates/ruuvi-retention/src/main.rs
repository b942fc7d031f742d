//! Ruuvi Retention - one-shot downsampling of stored sensor readings.
//!
//! Meant to be invoked by cron or a systemd timer. Run with:
//! `cargo run -p ruuvi-retention -- run`

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ruuvi_retention::{Config, FailurePolicy, Retention, RunReport};
use ruuvi_store::Store;
use ruuvi_types::timestamp::{format_millis, parse_rfc3339_millis, to_millis};

/// Ruuvi Retention - collapse old sensor readings into time-bucketed aggregates.
#[derive(Parser, Debug)]
#[command(name = "ruuvi-retention")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database path (overrides config).
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply the retention policy once (default behavior).
    Run {
        /// Evaluate the policy as of this time (RFC 3339 or epoch milliseconds).
        #[arg(long)]
        now: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,

        /// Stop at the first sensor failure instead of continuing.
        #[arg(long)]
        abort_on_error: bool,
    },

    /// Show what a run would collapse without changing anything.
    Plan {
        /// Evaluate the policy as of this time (RFC 3339 or epoch milliseconds).
        #[arg(long)]
        now: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show stored reading counts per sensor.
    Stats {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML.
    Config {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(path) => Config::load_validated(path)?,
        None => {
            let config = Config::load_default()?;
            config.validate()?;
            config
        }
    };

    if let Some(db_path) = args.database {
        config.storage.path = db_path;
    }

    let command = args.command.unwrap_or(Command::Run {
        now: None,
        json: false,
        abort_on_error: false,
    });

    match command {
        Command::Run {
            now,
            json,
            abort_on_error,
        } => run_retention(&config, now.as_deref(), json, abort_on_error, false),
        Command::Plan { now, json } => run_retention(&config, now.as_deref(), json, false, true),
        Command::Stats { json } => show_stats(&config.storage.path, json),
        Command::Config { output } => show_config(&config, output.as_deref()),
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "info" };

    // Logs go to stderr so --json output stays machine readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("ruuvi_retention={}", level).parse()?)
                .add_directive(format!("ruuvi_store={}", level).parse()?),
        )
        .init();

    Ok(())
}

/// Resolve `--now`, falling back to the wall clock.
fn resolve_now(now: Option<&str>) -> anyhow::Result<i64> {
    match now {
        Some(value) => match value.trim().parse::<i64>() {
            Ok(millis) => Ok(millis),
            Err(_) => Ok(parse_rfc3339_millis(value)?),
        },
        None => Ok(to_millis(OffsetDateTime::now_utc())),
    }
}

/// Open the database only if it already exists.
///
/// A missing file means ingestion has not created the store yet; that is a
/// no-op for retention, not an error.
fn open_existing(path: &Path) -> anyhow::Result<Option<Store>> {
    if !path.exists() {
        warn!("No database at {}, nothing to do", path.display());
        return Ok(None);
    }

    let store = Store::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    Ok(Some(store))
}

fn run_retention(
    config: &Config,
    now: Option<&str>,
    json: bool,
    abort_on_error: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let now = resolve_now(now)?;
    let mut policy = config.policy()?;
    if abort_on_error {
        policy = policy.with_failure_policy(FailurePolicy::Abort);
    }

    info!(
        "Running retention as of {} against {}",
        format_millis(now),
        config.storage.path.display()
    );

    let store = open_existing(&config.storage.path)?;
    let mut retention = Retention::new(store, policy);
    let report = if dry_run {
        retention.plan(now)?
    } else {
        retention.run(now)?
    };

    print_report(&report, json)?;

    if !report.is_success() {
        bail!("{} sensor failure(s) during retention", report.failures.len());
    }
    Ok(())
}

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

fn show_stats(path: &Path, json: bool) -> anyhow::Result<()> {
    let Some(store) = open_existing(path)? else {
        if json {
            println!("[]");
        }
        return Ok(());
    };

    let stats = store.sensor_stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    if stats.is_empty() {
        println!("No readings stored");
        return Ok(());
    }

    println!("{:<20} {:>10}  {:<25} {:<25}", "SENSOR", "READINGS", "OLDEST", "NEWEST");
    for s in &stats {
        println!(
            "{:<20} {:>10}  {:<25} {:<25}",
            s.sensor_id,
            s.count,
            format_millis(s.oldest),
            format_millis(s.newest)
        );
    }
    let total: u64 = stats.iter().map(|s| s.count).sum();
    println!("{} sensor(s), {} reading(s)", stats.len(), total);

    Ok(())
}

fn show_config(config: &Config, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            config.save(path)?;
            println!("Wrote configuration to {}", path.display());
        }
        None => print!("{}", config.to_toml()?),
    }
    Ok(())
}
