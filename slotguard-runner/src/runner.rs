//! Multi-instrument runner: loads candles, replays each instrument through
//! its own harness and collects the results.
//!
//! Two entry points:
//! - `run()`: validates the config, loads every CSV, then replays. Used by the CLI.
//! - `run_loaded()`: takes pre-loaded candles, no I/O. Used by tests and benches.
//!
//! Instruments are independent: each gets a fresh harness and tracker. With
//! `parallel` set they replay on the rayon pool; results are always returned
//! in configuration order, so parallel and serial runs are identical.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use slotguard_core::{
    stream_digest, Candle, EvaluationHarness, EventRecord, HarnessError, InstrumentConfig,
    ReplayReport, StreamDigest,
};

use crate::config::{RunConfig, RunConfigError, RunId};
use crate::data_loader::{dataset_hash, load_candles, LoadError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] RunConfigError),

    #[error("data error: {0}")]
    Data(#[from] LoadError),

    #[error("{symbol}: {source}")]
    Harness {
        symbol: String,
        #[source]
        source: HarnessError,
    },

    #[error("{expected} instruments configured but {got} candle sets supplied")]
    InstrumentMismatch { expected: usize, got: usize },

    #[error("failed to serialize records for digest: {0}")]
    Digest(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub parallel: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Candles for one configured instrument.
#[derive(Debug, Clone)]
pub struct InstrumentData {
    pub candles: Vec<Candle>,
    pub dataset_hash: String,
}

impl InstrumentData {
    pub fn new(candles: Vec<Candle>) -> Self {
        let dataset_hash = dataset_hash(&candles);
        Self {
            candles,
            dataset_hash,
        }
    }
}

/// Result of one instrument's replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRun {
    pub config: InstrumentConfig,
    pub dataset_hash: String,
    pub digest: StreamDigest,
    pub report: ReplayReport,
}

/// Result of a full run, instruments in configuration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub run_id: RunId,
    pub config: RunConfig,
    pub instruments: Vec<InstrumentRun>,
    /// Digest over every instrument's records, in configuration order.
    pub digest: StreamDigest,
}

impl RunOutput {
    /// All records, instrument by instrument.
    pub fn records(&self) -> impl Iterator<Item = &EventRecord> {
        self.instruments.iter().flat_map(|i| i.report.records.iter())
    }
}

pub fn run(config: &RunConfig, opts: RunOptions) -> Result<RunOutput, RunError> {
    config.validate()?;
    let data = config
        .instruments
        .iter()
        .map(|entry| {
            let loaded = load_candles(&entry.data)?;
            info!(
                symbol = %entry.config.symbol,
                path = %entry.data.display(),
                candles = loaded.candles.len(),
                "loaded candles"
            );
            Ok(InstrumentData {
                candles: loaded.candles,
                dataset_hash: loaded.dataset_hash,
            })
        })
        .collect::<Result<Vec<_>, LoadError>>()?;
    run_loaded(config, &data, opts)
}

pub fn run_loaded(
    config: &RunConfig,
    data: &[InstrumentData],
    opts: RunOptions,
) -> Result<RunOutput, RunError> {
    config.validate()?;
    if data.len() != config.instruments.len() {
        return Err(RunError::InstrumentMismatch {
            expected: config.instruments.len(),
            got: data.len(),
        });
    }

    let jobs: Vec<_> = config
        .instruments
        .iter()
        .map(|entry| &entry.config)
        .zip(data)
        .collect();

    let instruments = if opts.parallel {
        jobs.par_iter()
            .map(|(instrument, data)| run_instrument(config, instrument, data))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        jobs.iter()
            .map(|(instrument, data)| run_instrument(config, instrument, data))
            .collect::<Result<Vec<_>, _>>()?
    };

    let digest = stream_digest(instruments.iter().flat_map(|i| i.report.records.iter()))?;
    Ok(RunOutput {
        run_id: config.run_id()?,
        config: config.clone(),
        instruments,
        digest,
    })
}

fn run_instrument(
    config: &RunConfig,
    instrument: &InstrumentConfig,
    data: &InstrumentData,
) -> Result<InstrumentRun, RunError> {
    let symbol = instrument.symbol.clone();
    info!(symbol = %symbol, candles = data.candles.len(), "replaying");

    let mut harness = EvaluationHarness::new(
        instrument.clone(),
        config.tracker.clone(),
        config.payout,
        config.outcome_rule,
    )
    .map_err(|source| RunError::Harness {
        symbol: symbol.clone(),
        source,
    })?;
    let report = harness
        .replay(&data.candles)
        .map_err(|source| RunError::Harness {
            symbol: symbol.clone(),
            source,
        })?;

    if report.records.is_empty() {
        warn!(
            symbol = %symbol,
            candles = report.candles,
            warmup = report.warmup_candles,
            "instrument produced no events"
        );
    }
    info!(
        symbol = %symbol,
        events = report.records.len(),
        no_signal = report.no_signal,
        slots = report.tracker.len(),
        "replay finished"
    );

    Ok(InstrumentRun {
        config: instrument.clone(),
        dataset_hash: data.dataset_hash.clone(),
        digest: stream_digest(&report.records)?,
        report,
    })
}
