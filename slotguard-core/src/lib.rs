//! SlotGuard Core: indicators, threshold signals, per-slot reliability
//! tracking and the decide / resolve engine.
//!
//! This crate contains the whole decision path for one instrument:
//! - Domain types (candles, directions, decisions, time slots, event ids)
//! - Incremental RSI, stochastic %K, consecutive-run and momentum indicators
//! - Threshold signal generator
//! - Rolling per-slot reliability tracker with TRADE / SKIP / REVERSE bands
//! - Two-phase decision engine and the causal evaluation harness
//!
//! Nothing here performs I/O; loading, multi-instrument runs and exports
//! live in `slotguard-runner`.

pub mod config;
pub mod decision;
pub mod domain;
pub mod fingerprint;
pub mod harness;
pub mod indicators;
pub mod signal;
pub mod tracker;

pub use config::{ConfigError, InstrumentConfig, OutcomeRule, PayoutModel, TrackerConfig};
pub use decision::{DecisionEngine, DecisionError, PendingEvent, ResolvedEvent};
pub use domain::{
    Candle, CandleError, Decision, Direction, EventId, Signal, SlotGranularity, TimeSlotKey,
};
pub use fingerprint::{stream_digest, StreamDigest, StreamHasher};
pub use harness::{replay, EvaluationHarness, EventRecord, HarnessError, ReplayReport};
pub use indicators::{IndicatorCalculator, IndicatorParams, IndicatorSnapshot, RsiSmoothing};
pub use signal::SignalGenerator;
pub use tracker::{ReliabilityRecord, ReliabilityTracker, SlotSnapshot};
