//! Per-slot reliability tracker.
//!
//! For every recurring time slot the tracker keeps the last `window_size`
//! results of the raw signal (matched the realized outcome or not) and maps
//! the slot's win rate onto a decision band. The tracker never sees candles
//! or indicator values, only slot keys and match results.

use std::collections::{btree_map, BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, TrackerConfig};
use crate::domain::{Decision, TimeSlotKey};

/// Bounded FIFO of raw-signal results for one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReliabilityRecord {
    results: VecDeque<bool>,
    wins: usize,
}

impl ReliabilityRecord {
    /// Append a result, evicting the oldest entries beyond `window_size`.
    pub fn push(&mut self, matched: bool, window_size: usize) {
        self.results.push_back(matched);
        if matched {
            self.wins += 1;
        }
        while self.results.len() > window_size {
            if let Some(true) = self.results.pop_front() {
                self.wins -= 1;
            }
        }
    }

    pub fn count(&self) -> usize {
        self.results.len()
    }

    pub fn wins(&self) -> usize {
        self.wins
    }

    /// Win rate in percent, `None` for an empty record.
    pub fn win_rate_pct(&self) -> Option<f64> {
        if self.results.is_empty() {
            None
        } else {
            Some(100.0 * self.wins as f64 / self.results.len() as f64)
        }
    }

    /// Results oldest first.
    pub fn results(&self) -> impl Iterator<Item = bool> + '_ {
        self.results.iter().copied()
    }
}

/// Point-in-time view of one slot, as exported at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub slot: TimeSlotKey,
    pub count: usize,
    pub wins: usize,
    pub win_rate: Option<f64>,
    pub action: Decision,
}

#[derive(Debug, Clone)]
pub struct ReliabilityTracker {
    config: TrackerConfig,
    records: BTreeMap<TimeSlotKey, ReliabilityRecord>,
}

impl ReliabilityTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            records: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Current policy for a slot.
    ///
    /// Slots with fewer than `min_samples` results always trade; otherwise
    /// the slot's win rate picks the band.
    pub fn get_action(&self, slot: &TimeSlotKey) -> Decision {
        let Some(record) = self.records.get(slot) else {
            return Decision::Trade;
        };
        if record.count() < self.config.min_samples {
            return Decision::Trade;
        }
        match record.win_rate_pct() {
            Some(rate) => self.config.classify(rate),
            None => Decision::Trade,
        }
    }

    /// Record whether the raw signal at `slot` matched the realized outcome.
    pub fn update(&mut self, slot: TimeSlotKey, matched: bool) {
        let window = self.config.window_size;
        self.records.entry(slot).or_default().push(matched, window);
    }

    pub fn record(&self, slot: &TimeSlotKey) -> Option<&ReliabilityRecord> {
        self.records.get(slot)
    }

    /// Slots with at least one result, in (weekday, hour, bucket) order.
    pub fn slots(&self) -> btree_map::Iter<'_, TimeSlotKey, ReliabilityRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn snapshot(&self) -> Vec<SlotSnapshot> {
        self.records
            .iter()
            .map(|(slot, record)| SlotSnapshot {
                slot: *slot,
                count: record.count(),
                wins: record.wins(),
                win_rate: record.win_rate_pct(),
                action: self.get_action(slot),
            })
            .collect()
    }
}
