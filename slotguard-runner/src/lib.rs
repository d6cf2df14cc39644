//! SlotGuard Runner: run configuration, CSV loading, multi-instrument replay,
//! outcome metrics and artifact export.
//!
//! This crate builds on `slotguard-core` to provide:
//! - A TOML run config with one `[[instruments]]` entry per CSV file
//! - A candle loader with line-numbered errors and a dataset hash
//! - Parallel or serial replay, one independent harness per instrument
//! - Policy vs baseline metrics with hour/weekday/month/instrument/slot breakdowns
//! - `events.csv` and `summary.json` artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{InstrumentEntry, RunConfig, RunConfigError, RunId};
pub use data_loader::{dataset_hash, load_candles, read_candles, LoadError, LoadedCandles};
pub use export::{
    export_events_csv, export_summary_json, import_summary_json, load_summary, write_artifacts,
    InstrumentSummary, PolicyComparison, RunSummary,
};
pub use metrics::{group_stats, GroupBy, GroupStats, OutcomeStats};
pub use runner::{run, run_loaded, InstrumentData, InstrumentRun, RunError, RunOptions, RunOutput};
