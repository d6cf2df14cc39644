//! Evaluation harness: causal candle-by-candle replay for one instrument.
//!
//! Per candle, in order:
//!
//! 1. Reject a timestamp that does not strictly increase.
//! 2. Resolve the event decided on the previous candle, using this candle
//!    as its outcome, and emit its record.
//! 3. Update indicators with this candle and decide on the new snapshot.
//!
//! Step 2 runs before step 3, so the tracker update for an event is always
//! in place before the next event is decided, and never before its own.

use std::borrow::Borrow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::config::{ConfigError, InstrumentConfig, OutcomeRule, PayoutModel, TrackerConfig};
use crate::decision::{DecisionEngine, DecisionError, PendingEvent, ResolvedEvent};
use crate::domain::{Candle, Decision, Direction, EventId, Signal, TimeSlotKey};
use crate::indicators::{IndicatorCalculator, IndicatorSnapshot};
use crate::tracker::{ReliabilityTracker, SlotSnapshot};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("candle at {current} does not follow previous candle at {previous}")]
    OrderingViolation {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error(transparent)]
    Decision(#[from] DecisionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One resolved event in the output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: EventId,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub slot: TimeSlotKey,
    pub raw_signal: Signal,
    pub decision: Decision,
    pub realized_direction: Option<Direction>,
    pub outcome: Direction,
    pub signal_correct: bool,
    pub outcome_correct: Option<bool>,
    /// Zero for skipped events.
    pub pnl: f64,
}

impl EventRecord {
    fn from_resolved(symbol: &str, event: ResolvedEvent, payout: &PayoutModel) -> Self {
        let pnl = event.outcome_correct.map_or(0.0, |won| payout.pnl(won));
        Self {
            event_id: event.id,
            symbol: symbol.to_string(),
            timestamp: event.timestamp,
            slot: event.slot,
            raw_signal: event.raw_signal,
            decision: event.decision,
            realized_direction: event.realized_direction,
            outcome: event.outcome,
            signal_correct: event.signal_correct,
            outcome_correct: event.outcome_correct,
            pnl,
        }
    }

    /// True when a position was taken (trade or reverse).
    pub fn is_taken(&self) -> bool {
        self.realized_direction.is_some()
    }
}

/// Records plus counters from a full replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub symbol: String,
    pub records: Vec<EventRecord>,
    pub candles: usize,
    /// Candles seen before every indicator was defined.
    pub warmup_candles: usize,
    /// Warm candles on which the threshold rule did not fire.
    pub no_signal: usize,
    /// Events still pending at the end of the input (no outcome candle).
    pub unresolved: usize,
    pub tracker: Vec<SlotSnapshot>,
}

pub struct EvaluationHarness {
    calculator: IndicatorCalculator,
    engine: DecisionEngine,
    payout: PayoutModel,
    outcome_rule: OutcomeRule,
    last_candle: Option<Candle>,
    pending: Option<PendingEvent>,
    candles: usize,
    warmup_candles: usize,
    no_signal: usize,
}

impl EvaluationHarness {
    pub fn new(
        instrument: InstrumentConfig,
        tracker: TrackerConfig,
        payout: PayoutModel,
        outcome_rule: OutcomeRule,
    ) -> Result<Self, HarnessError> {
        payout.validate()?;
        // Validates the instrument before any indicator is built.
        let engine = DecisionEngine::new(instrument, tracker)?;
        let calculator = IndicatorCalculator::new(engine.signals().config().indicator_params());
        Ok(Self {
            calculator,
            engine,
            payout,
            outcome_rule,
            last_candle: None,
            pending: None,
            candles: 0,
            warmup_candles: 0,
            no_signal: 0,
        })
    }

    pub fn symbol(&self) -> &str {
        self.engine.symbol()
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn tracker(&self) -> &ReliabilityTracker {
        self.engine.tracker()
    }

    pub fn payout(&self) -> &PayoutModel {
        &self.payout
    }

    /// Event decided on the most recent candle, waiting for the next one.
    pub fn pending(&self) -> Option<&PendingEvent> {
        self.pending.as_ref()
    }

    /// Feed the next candle. Returns the record of the event it resolved, if any.
    pub fn push(&mut self, candle: &Candle) -> Result<Option<EventRecord>, HarnessError> {
        if let Some(prev) = &self.last_candle {
            if candle.timestamp() <= prev.timestamp() {
                return Err(HarnessError::OrderingViolation {
                    previous: prev.timestamp(),
                    current: candle.timestamp(),
                });
            }
        }

        let record = match (self.pending.take(), &self.last_candle) {
            (Some(event), Some(decided_on)) => {
                let outcome = self.outcome_rule.resolve(decided_on, candle);
                let resolved = self.engine.resolve(event, outcome)?;
                Some(EventRecord::from_resolved(
                    self.engine.symbol(),
                    resolved,
                    &self.payout,
                ))
            }
            _ => None,
        };

        self.candles += 1;
        let snapshot: IndicatorSnapshot = self.calculator.push(candle);
        if !self.calculator.is_warm() {
            self.warmup_candles += 1;
            trace!(
                symbol = self.engine.symbol(),
                timestamp = %candle.timestamp(),
                seen = self.calculator.candles_seen(),
                warmup = self.calculator.warmup(),
                "warming up"
            );
        } else {
            self.pending = self.engine.decide(&snapshot);
            if self.pending.is_none() {
                self.no_signal += 1;
            }
        }
        self.last_candle = Some(*candle);

        Ok(record)
    }

    /// Push every candle and collect the records.
    pub fn replay<I>(&mut self, candles: I) -> Result<ReplayReport, HarnessError>
    where
        I: IntoIterator,
        I::Item: Borrow<Candle>,
    {
        let mut records = Vec::new();
        for candle in candles {
            if let Some(record) = self.push(candle.borrow())? {
                records.push(record);
            }
        }
        Ok(ReplayReport {
            symbol: self.engine.symbol().to_string(),
            records,
            candles: self.candles,
            warmup_candles: self.warmup_candles,
            no_signal: self.no_signal,
            unresolved: usize::from(self.pending.is_some()),
            tracker: self.engine.tracker().snapshot(),
        })
    }
}

/// Convenience: build a harness and replay `candles` through it.
pub fn replay(
    instrument: InstrumentConfig,
    tracker: TrackerConfig,
    payout: PayoutModel,
    outcome_rule: OutcomeRule,
    candles: &[Candle],
) -> Result<ReplayReport, HarnessError> {
    EvaluationHarness::new(instrument, tracker, payout, outcome_rule)?.replay(candles)
}
