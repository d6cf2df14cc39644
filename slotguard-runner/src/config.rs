//! Serializable run configuration, read from a single TOML file.
//!
//! ```toml
//! name = "majors-15m"
//! outcome_rule = "next_close"
//!
//! [tracker]
//! window_size = 20
//! min_samples = 5
//! skip_threshold = 48.0
//! reverse_threshold = 45.0
//! granularity = { type = "minute_bucket", minutes = 15 }
//!
//! [payout]
//! stake = 100.0
//! contract_price = 0.525
//!
//! [[instruments]]
//! symbol = "BTC"
//! data = "data/BTC_USDT_15m.csv"
//! rsi_oversold = 38.0
//! rsi_overbought = 68.0
//! ```
//!
//! Relative `data` paths are resolved against the directory holding the
//! config file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slotguard_core::{ConfigError, InstrumentConfig, OutcomeRule, PayoutModel, TrackerConfig};
use thiserror::Error;

/// Unique identifier for a run (content hash of its configuration).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),

    #[error("no instruments configured")]
    NoInstruments,

    #[error("instrument #{0} has an empty symbol")]
    EmptySymbol(usize),

    #[error("instrument '{0}' is configured more than once")]
    DuplicateSymbol(String),

    #[error("failed to serialize config for hashing: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One instrument: where its candles live plus its thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentEntry {
    /// CSV file with `timestamp,open,high,low,close,volume` columns.
    pub data: PathBuf,
    #[serde(flatten)]
    pub config: InstrumentConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub outcome_rule: OutcomeRule,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub payout: PayoutModel,
    #[serde(default)]
    pub instruments: Vec<InstrumentEntry>,
}

impl RunConfig {
    /// Parse TOML text. Paths are kept as written.
    pub fn from_toml(text: &str) -> Result<Self, RunConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a config file, resolving relative data paths.
    pub fn from_file(path: &Path) -> Result<Self, RunConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| RunConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for entry in &mut self.instruments {
            if entry.data.is_relative() {
                entry.data = base.join(&entry.data);
            }
        }
    }

    /// Validate every section. Nothing runs on a config that fails here.
    pub fn validate(&self) -> Result<(), RunConfigError> {
        self.tracker.validate()?;
        self.payout.validate()?;
        if self.instruments.is_empty() {
            return Err(RunConfigError::NoInstruments);
        }
        let mut seen = HashSet::new();
        for (i, entry) in self.instruments.iter().enumerate() {
            let symbol = entry.config.symbol.trim();
            if symbol.is_empty() {
                return Err(RunConfigError::EmptySymbol(i));
            }
            if !seen.insert(symbol) {
                return Err(RunConfigError::DuplicateSymbol(symbol.to_string()));
            }
            entry.config.validate()?;
        }
        Ok(())
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.instruments.iter().map(|e| e.config.symbol.as_str())
    }

    /// Deterministic hash of the full configuration.
    ///
    /// Two runs with identical configs share a run id.
    pub fn run_id(&self) -> Result<RunId, RunConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
