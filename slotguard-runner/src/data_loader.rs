//! Candle loading from CSV files.
//!
//! Expected header: `timestamp,open,high,low,close,volume`. The timestamp
//! column accepts epoch milliseconds, RFC 3339, or `YYYY-MM-DD HH:MM:SS`
//! (read as UTC). Rows are validated through `Candle::new` and kept in file
//! order: ordering problems are reported by the harness, never repaired here.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use slotguard_core::{Candle, CandleError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: malformed CSV: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}:{line}: unrecognized timestamp '{value}'")]
    Timestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("{path}:{line}: {source}")]
    Candle {
        path: PathBuf,
        line: u64,
        #[source]
        source: CandleError,
    },

    #[error("{path}: no candles")]
    Empty { path: PathBuf },
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Candles for one instrument plus a content hash of the data.
#[derive(Debug, Clone)]
pub struct LoadedCandles {
    pub candles: Vec<Candle>,
    /// BLAKE3 over timestamps and OHLCV values, in file order.
    pub dataset_hash: String,
}

pub fn load_candles(path: &Path) -> Result<LoadedCandles, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_candles(file, path)
}

/// Parse candles from any reader; `origin` is used in error messages only.
pub fn read_candles<R: Read>(reader: R, origin: &Path) -> Result<LoadedCandles, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut candles = Vec::new();

    for row in rdr.deserialize::<CsvRow>() {
        let row = row.map_err(|source| LoadError::Csv {
            path: origin.to_path_buf(),
            source,
        })?;
        // Header is line 1.
        let line = candles.len() as u64 + 2;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
            path: origin.to_path_buf(),
            line,
            value: row.timestamp.clone(),
        })?;
        let candle = Candle::new(timestamp, row.open, row.high, row.low, row.close, row.volume)
            .map_err(|source| LoadError::Candle {
                path: origin.to_path_buf(),
                line,
                source,
            })?;
        candles.push(candle);
    }

    if candles.is_empty() {
        return Err(LoadError::Empty {
            path: origin.to_path_buf(),
        });
    }
    let dataset_hash = dataset_hash(&candles);
    Ok(LoadedCandles {
        candles,
        dataset_hash,
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ms) = raw.parse::<i64>() {
        return Utc.timestamp_millis_opt(ms).single();
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Deterministic BLAKE3 hash over all candle data.
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in candles {
        hasher.update(&c.timestamp().timestamp_millis().to_le_bytes());
        hasher.update(&c.open().to_le_bytes());
        hasher.update(&c.high().to_le_bytes());
        hasher.update(&c.low().to_le_bytes());
        hasher.update(&c.close().to_le_bytes());
        hasher.update(&c.volume().to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
