//! SlotGuard CLI: validate a run config and replay it.
//!
//! Commands:
//! - `run`: replay every configured instrument, print a summary and write
//!   `events.csv` plus `summary.json`
//! - `check`: parse and validate a config without loading any data
//!
//! Logging goes to stderr through `tracing-subscriber`; set `RUST_LOG` to
//! override the default `slotguard=info` filter.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slotguard_runner::{
    run, write_artifacts, GroupBy, OutcomeStats, RunConfig, RunOptions, RunSummary,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "slotguard",
    about = "SlotGuard: per-time-slot reliability filter for threshold signals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay all instruments in a TOML run config.
    Run {
        /// Path to the TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Directory that receives the run's artifact folder.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Breakdowns to include: hour, weekday, month, instrument, slot.
        /// Repeat the flag for several; defaults to all of them.
        #[arg(long = "group-by")]
        group_by: Vec<GroupBy>,

        /// Replay instruments one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        serial: bool,
    },
    /// Parse and validate a run config.
    Check {
        /// Path to the TOML run config.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slotguard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            group_by,
            serial,
        } => run_cmd(&config, &output_dir, group_by, serial),
        Commands::Check { config } => check_cmd(&config),
    }
}

fn load_config(path: &Path) -> Result<RunConfig> {
    let config = RunConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn run_cmd(
    config_path: &Path,
    output_dir: &Path,
    group_by: Vec<GroupBy>,
    serial: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let group_by = if group_by.is_empty() {
        GroupBy::ALL.to_vec()
    } else {
        group_by
    };

    let output = run(&config, RunOptions { parallel: !serial }).context("run failed")?;
    let summary = RunSummary::build(&output, &group_by);
    print_summary(&summary);

    let run_dir = write_artifacts(&output, &summary, output_dir)?;
    info!(path = %run_dir.display(), "artifacts written");
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn check_cmd(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    println!("Config OK: {}", config_path.display());
    println!("Run id:      {}", config.run_id()?);
    println!(
        "Instruments: {}",
        config.symbols().collect::<Vec<_>>().join(", ")
    );
    println!(
        "Tracker:     window {} / min {} / skip < {} / reverse < {}",
        config.tracker.window_size,
        config.tracker.min_samples,
        config.tracker.skip_threshold,
        config.tracker.reverse_threshold
    );
    for entry in &config.instruments {
        println!("  {:<8} {}", entry.config.symbol, entry.data.display());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("=== SlotGuard Run ===");
    if let Some(name) = &summary.name {
        println!("Name:           {name}");
    }
    println!("Run id:         {}", summary.run_id);
    println!("Stream digest:  {}", summary.digest);
    for inst in &summary.instruments {
        println!();
        println!("--- {} ---", inst.symbol);
        println!(
            "Candles:        {} ({} warmup, {} no signal, {} unresolved)",
            inst.candles, inst.warmup_candles, inst.no_signal, inst.unresolved
        );
        println!("Tracked slots:  {}", inst.tracker.len());
        print_comparison(&inst.metrics.policy, &inst.metrics.baseline);
    }
    println!();
    println!("--- All instruments ---");
    print_comparison(&summary.metrics.policy, &summary.metrics.baseline);

    for section in &summary.breakdowns {
        println!();
        println!("--- By {} ---", section.group_by);
        for g in &section.groups {
            println!(
                "{:<16} events {:>6}  trades {:>6}  win {:>7}  pnl {:>10.2}",
                g.key,
                g.stats.events,
                g.stats.trades,
                fmt_pct(g.stats.win_rate),
                g.stats.total_pnl
            );
        }
    }
    println!();
}

fn print_comparison(policy: &OutcomeStats, baseline: &OutcomeStats) {
    println!("{:<16} {:>12} {:>12}", "", "policy", "baseline");
    println!("{:<16} {:>12} {:>12}", "Events", policy.events, baseline.events);
    println!("{:<16} {:>12} {:>12}", "Trades", policy.trades, baseline.trades);
    println!("{:<16} {:>12} {:>12}", "Skipped", policy.skipped, baseline.skipped);
    println!("{:<16} {:>12} {:>12}", "Reversed", policy.reversed, baseline.reversed);
    println!(
        "{:<16} {:>12} {:>12}",
        "Win rate",
        fmt_pct(policy.win_rate),
        fmt_pct(baseline.win_rate)
    );
    println!(
        "{:<16} {:>12.2} {:>12.2}",
        "Total PnL", policy.total_pnl, baseline.total_pnl
    );
    println!(
        "{:<16} {:>12.2} {:>12.2}",
        "Max drawdown", policy.max_drawdown, baseline.max_drawdown
    );
    println!(
        "{:<16} {:>12} {:>12}",
        "Losing streak", policy.longest_losing_streak, baseline.longest_losing_streak
    );
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%"))
}
