//! Decision engine: two-phase decide / resolve protocol over the tracker.
//!
//! `decide` reads the slot's current policy and hands out a `PendingEvent`.
//! The event is a move-only token: it cannot be cloned or built outside this
//! module, and `resolve` consumes it. `resolve` is the only code path that
//! writes to the tracker, so the outcome of an event can never influence its
//! own decision.
//!
//! Events must be resolved in the order they were decided, by the engine
//! that decided them.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, InstrumentConfig, TrackerConfig};
use crate::domain::{Decision, Direction, EventId, Signal, TimeSlotKey};
use crate::indicators::IndicatorSnapshot;
use crate::signal::SignalGenerator;
use crate::tracker::ReliabilityTracker;

static NEXT_ENGINE: AtomicU64 = AtomicU64::new(0);

/// Identity of one engine instance, stamped on every event it issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EngineTag(u64);

impl EngineTag {
    fn fresh() -> Self {
        Self(NEXT_ENGINE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Misuse of the decide / resolve protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("event {0} was not issued by this engine or is already resolved")]
    UnknownEvent(EventId),

    #[error("event {got} resolved before older outstanding event {expected}")]
    OutOfOrderResolve { expected: EventId, got: EventId },
}

/// A decided event awaiting its outcome.
///
/// Only the engine creates these; fields are read through accessors.
#[derive(Debug, PartialEq)]
pub struct PendingEvent {
    engine: EngineTag,
    id: EventId,
    timestamp: DateTime<Utc>,
    slot: TimeSlotKey,
    signal: Direction,
    decision: Decision,
}

impl PendingEvent {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn slot(&self) -> TimeSlotKey {
        self.slot
    }

    /// Raw signal direction (never `Signal::None`: no-signal candles yield no event).
    pub fn signal(&self) -> Direction {
        self.signal
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Direction taken on the event, `None` when skipped.
    pub fn realized_direction(&self) -> Option<Direction> {
        self.decision.realize(self.signal)
    }
}

/// A fully resolved event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub slot: TimeSlotKey,
    pub raw_signal: Signal,
    pub decision: Decision,
    pub realized_direction: Option<Direction>,
    pub outcome: Direction,
    /// Raw signal matched the outcome. This is what the tracker records.
    pub signal_correct: bool,
    /// Taken direction matched the outcome; `None` when skipped.
    pub outcome_correct: Option<bool>,
}

/// Signal generator plus reliability tracker for one instrument.
#[derive(Debug)]
pub struct DecisionEngine {
    tag: EngineTag,
    signals: SignalGenerator,
    tracker: ReliabilityTracker,
    next_id: EventId,
    outstanding: VecDeque<EventId>,
}

impl DecisionEngine {
    pub fn new(instrument: InstrumentConfig, tracker: TrackerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            tag: EngineTag::fresh(),
            signals: SignalGenerator::new(instrument)?,
            tracker: ReliabilityTracker::new(tracker)?,
            next_id: EventId(0),
            outstanding: VecDeque::new(),
        })
    }

    pub fn symbol(&self) -> &str {
        self.signals.symbol()
    }

    pub fn signals(&self) -> &SignalGenerator {
        &self.signals
    }

    pub fn tracker(&self) -> &ReliabilityTracker {
        &self.tracker
    }

    /// Number of decided events not yet resolved.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Evaluate the raw signal on `snapshot` and decide with the policy of
    /// the snapshot's slot. Returns `None` when there is no signal.
    pub fn decide(&mut self, snapshot: &IndicatorSnapshot) -> Option<PendingEvent> {
        let signal = self.signals.evaluate(snapshot).direction()?;
        let timestamp = snapshot.timestamp;
        let slot = self.tracker.config().granularity.slot_for(timestamp);
        let decision = self.tracker.get_action(&slot);

        let id = self.next_id;
        self.next_id = id.next();
        self.outstanding.push_back(id);

        debug!(
            symbol = self.signals.symbol(),
            event_id = id.0,
            slot = %slot,
            signal = %signal,
            decision = %decision,
            "decided"
        );

        Some(PendingEvent {
            engine: self.tag,
            id,
            timestamp,
            slot,
            signal,
            decision,
        })
    }

    /// Apply the realized outcome to a pending event and record the raw
    /// signal's correctness against its slot.
    pub fn resolve(
        &mut self,
        event: PendingEvent,
        outcome: Direction,
    ) -> Result<ResolvedEvent, DecisionError> {
        if event.engine != self.tag {
            return Err(DecisionError::UnknownEvent(event.id));
        }
        match self.outstanding.front() {
            Some(&expected) if expected == event.id => {}
            Some(&expected) if self.outstanding.contains(&event.id) => {
                return Err(DecisionError::OutOfOrderResolve {
                    expected,
                    got: event.id,
                });
            }
            _ => return Err(DecisionError::UnknownEvent(event.id)),
        }
        self.outstanding.pop_front();

        let signal_correct = event.signal == outcome;
        self.tracker.update(event.slot, signal_correct);

        let realized_direction = event.realized_direction();
        debug!(
            symbol = self.signals.symbol(),
            event_id = event.id.0,
            slot = %event.slot,
            outcome = %outcome,
            signal_correct,
            "resolved"
        );

        Ok(ResolvedEvent {
            id: event.id,
            timestamp: event.timestamp,
            slot: event.slot,
            raw_signal: event.signal.into(),
            decision: event.decision,
            realized_direction,
            outcome,
            signal_correct,
            outcome_correct: realized_direction.map(|d| d == outcome),
        })
    }
}
