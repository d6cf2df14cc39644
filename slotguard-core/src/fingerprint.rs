//! Stream fingerprinting: a stable digest of a record stream.
//!
//! Two replays over identical candles and configuration must produce the
//! same digest. Each record is hashed as its compact JSON encoding followed
//! by a newline, so the digest equals the BLAKE3 hash of the JSONL export.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::harness::EventRecord;

/// Hex-encoded BLAKE3 digest of a record stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamDigest(pub String);

impl fmt::Display for StreamDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Incremental digest builder; feed records in stream order.
pub struct StreamHasher {
    hasher: blake3::Hasher,
    records: usize,
}

impl Default for StreamHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamHasher {
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
            records: 0,
        }
    }

    pub fn update(&mut self, record: &EventRecord) -> Result<(), serde_json::Error> {
        let line = serde_json::to_vec(record)?;
        self.hasher.update(&line);
        self.hasher.update(b"\n");
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn finalize(&self) -> StreamDigest {
        StreamDigest(self.hasher.finalize().to_hex().to_string())
    }
}

/// Digest of a complete record stream.
pub fn stream_digest<'a, I>(records: I) -> Result<StreamDigest, serde_json::Error>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut hasher = StreamHasher::new();
    for record in records {
        hasher.update(record)?;
    }
    Ok(hasher.finalize())
}
