//! Outcome metrics: pure functions over the event record stream.
//!
//! Every metric is computed from `EventRecord`s alone. Records are taken in
//! stream order; drawdown and losing streaks depend on that order.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use slotguard_core::{Decision, EventRecord, PayoutModel, TimeSlotKey};

/// Aggregate statistics for a set of events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStats {
    /// Decided and resolved events.
    pub events: usize,
    /// Events with a position taken (trade or reverse).
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub skipped: usize,
    pub reversed: usize,
    /// Percent of taken positions that won.
    pub win_rate: Option<f64>,
    /// Percent of events whose raw signal matched the outcome.
    pub signal_accuracy: Option<f64>,
    pub total_pnl: f64,
    pub pnl_per_trade: Option<f64>,
    /// Largest peak-to-trough fall of cumulative PnL, as a positive amount.
    pub max_drawdown: f64,
    pub longest_losing_streak: usize,
}

impl OutcomeStats {
    /// Statistics of the filtered policy, as recorded.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        let mut stats = Self::default();
        let mut signal_hits = 0usize;
        let mut pnls = Vec::new();
        for r in records {
            stats.events += 1;
            if r.signal_correct {
                signal_hits += 1;
            }
            match r.decision {
                Decision::Skip => stats.skipped += 1,
                Decision::Reverse => stats.reversed += 1,
                Decision::Trade => {}
            }
            match r.outcome_correct {
                Some(true) => stats.wins += 1,
                Some(false) => stats.losses += 1,
                None => continue,
            }
            stats.trades += 1;
            stats.total_pnl += r.pnl;
            pnls.push((r.outcome_correct == Some(true), r.pnl));
        }
        stats.finish(signal_hits, &pnls);
        stats
    }

    /// Statistics of acting on every raw signal, ignoring the tracker.
    pub fn baseline<'a, I>(records: I, payout: &PayoutModel) -> Self
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        let mut stats = Self::default();
        let mut pnls = Vec::new();
        for r in records {
            stats.events += 1;
            stats.trades += 1;
            let won = r.signal_correct;
            if won {
                stats.wins += 1;
            } else {
                stats.losses += 1;
            }
            let pnl = payout.pnl(won);
            stats.total_pnl += pnl;
            pnls.push((won, pnl));
        }
        let hits = stats.wins;
        stats.finish(hits, &pnls);
        stats
    }

    fn finish(&mut self, signal_hits: usize, taken: &[(bool, f64)]) {
        self.win_rate = pct(self.wins, self.trades);
        self.signal_accuracy = pct(signal_hits, self.events);
        self.pnl_per_trade = (self.trades > 0).then(|| self.total_pnl / self.trades as f64);
        self.max_drawdown = max_drawdown(taken.iter().map(|&(_, pnl)| pnl));
        self.longest_losing_streak = longest_losing_streak(taken.iter().map(|&(won, _)| won));
    }
}

fn pct(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| 100.0 * part as f64 / whole as f64)
}

// ─── Individual metric functions ────────────────────────────────────

/// Largest fall of cumulative PnL from a running peak. Starts from zero.
pub fn max_drawdown<I: IntoIterator<Item = f64>>(pnls: I) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for pnl in pnls {
        cumulative += pnl;
        peak = peak.max(cumulative);
        max_dd = max_dd.max(peak - cumulative);
    }
    max_dd
}

/// Longest run of consecutive losses.
pub fn longest_losing_streak<I: IntoIterator<Item = bool>>(wins: I) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for won in wins {
        if won {
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}

// ─── Grouping ───────────────────────────────────────────────────────

/// Dimension along which records are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Hour,
    Weekday,
    Month,
    Instrument,
    Slot,
}

impl GroupBy {
    pub const ALL: [GroupBy; 5] = [
        GroupBy::Hour,
        GroupBy::Weekday,
        GroupBy::Month,
        GroupBy::Instrument,
        GroupBy::Slot,
    ];

    pub fn key(&self, record: &EventRecord) -> GroupKey {
        match self {
            Self::Hour => GroupKey::Hour(record.timestamp.hour() as u8),
            Self::Weekday => {
                GroupKey::Weekday(record.timestamp.weekday().num_days_from_monday() as u8)
            }
            Self::Month => GroupKey::Month {
                year: record.timestamp.year(),
                month: record.timestamp.month() as u8,
            },
            Self::Instrument => GroupKey::Instrument(record.symbol.clone()),
            Self::Slot => GroupKey::Slot(record.slot),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hour => "hour",
            Self::Weekday => "weekday",
            Self::Month => "month",
            Self::Instrument => "instrument",
            Self::Slot => "slot",
        };
        f.write_str(name)
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.to_string() == s)
            .ok_or_else(|| {
                format!("unknown grouping '{s}' (hour, weekday, month, instrument, slot)")
            })
    }
}

const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// A group value. Ordering is chronological / calendar order within a kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Hour(u8),
    /// Days from Monday.
    Weekday(u8),
    Month { year: i32, month: u8 },
    Instrument(String),
    Slot(TimeSlotKey),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hour(h) => write!(f, "{h:02}h"),
            Self::Weekday(d) => match WEEKDAY_NAMES.get(*d as usize) {
                Some(name) => f.write_str(name),
                None => write!(f, "day{d}"),
            },
            Self::Month { year, month } => write!(f, "{year}-{month:02}"),
            Self::Instrument(s) => f.write_str(s),
            Self::Slot(slot) => write!(f, "{slot}"),
        }
    }
}

/// One row of a grouped breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: String,
    pub stats: OutcomeStats,
}

/// Per-group statistics, groups in key order.
pub fn group_stats(records: &[EventRecord], by: GroupBy) -> Vec<GroupStats> {
    let mut groups: BTreeMap<GroupKey, Vec<&EventRecord>> = BTreeMap::new();
    for r in records {
        groups.entry(by.key(r)).or_default().push(r);
    }
    groups
        .into_iter()
        .map(|(key, members)| GroupStats {
            key: key.to_string(),
            stats: OutcomeStats::from_records(members),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use slotguard_core::{Direction, EventId, Signal, SlotGranularity};

    fn record(
        id: u64,
        timestamp: DateTime<Utc>,
        decision: Decision,
        signal: Direction,
        outcome: Direction,
    ) -> EventRecord {
        let payout = PayoutModel::default();
        let realized = decision.realize(signal);
        let outcome_correct = realized.map(|d| d == outcome);
        EventRecord {
            event_id: EventId(id),
            symbol: if id % 2 == 0 { "BTC" } else { "ETH" }.to_string(),
            timestamp,
            slot: SlotGranularity::default().slot_for(timestamp),
            raw_signal: Signal::from(signal),
            decision,
            realized_direction: realized,
            outcome,
            signal_correct: signal == outcome,
            outcome_correct,
            pnl: outcome_correct.map_or(0.0, |w| payout.pnl(w)),
        }
    }

    fn t(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn sample() -> Vec<EventRecord> {
        use Decision::*;
        use Direction::*;
        vec![
            record(0, t(1, 9), Trade, Up, Up),      // win
            record(1, t(1, 10), Trade, Up, Down),   // loss
            record(2, t(2, 9), Skip, Down, Down),   // skipped, signal right
            record(3, t(2, 10), Reverse, Up, Down), // reversed win
            record(4, t(3, 9), Trade, Down, Up),    // loss
            record(5, t(3, 10), Trade, Down, Up),   // loss
        ]
    }

    #[test]
    fn policy_stats() {
        let stats = OutcomeStats::from_records(&sample());
        assert_eq!(stats.events, 6);
        assert_eq!(stats.trades, 5);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 3);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.reversed, 1);
        assert_eq!(stats.win_rate, Some(40.0));
        // Raw signal right on events 0 and 2.
        let accuracy = stats.signal_accuracy.unwrap();
        assert!((accuracy - 100.0 / 3.0).abs() < 1e-9);
        let win = PayoutModel::default().win_amount();
        assert!((stats.total_pnl - (2.0 * win - 300.0)).abs() < 1e-9);
        assert_eq!(stats.longest_losing_streak, 2);
        // Cumulative: w, w-100, 2w-100, 2w-200, 2w-300. With w < 100 the
        // peak is the first win.
        assert!((stats.max_drawdown - (300.0 - win)).abs() < 1e-9);
    }

    #[test]
    fn baseline_acts_on_every_signal() {
        let payout = PayoutModel::default();
        let stats = OutcomeStats::baseline(&sample(), &payout);
        assert_eq!(stats.events, 6);
        assert_eq!(stats.trades, 6);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 4);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.reversed, 0);
        assert_eq!(stats.win_rate, stats.signal_accuracy);
    }

    #[test]
    fn empty_stats() {
        let stats = OutcomeStats::from_records(&Vec::<EventRecord>::new());
        assert_eq!(stats.events, 0);
        assert_eq!(stats.win_rate, None);
        assert_eq!(stats.pnl_per_trade, None);
        assert_eq!(stats.max_drawdown, 0.0);
    }

    #[test]
    fn drawdown_and_streak_helpers() {
        assert_eq!(max_drawdown([10.0, -5.0, -10.0, 20.0, -1.0]), 15.0);
        assert_eq!(max_drawdown([-3.0, -4.0]), 7.0);
        assert_eq!(longest_losing_streak([false, false, true, false, false, false]), 3);
        assert_eq!(longest_losing_streak([true, true]), 0);
    }

    #[test]
    fn group_by_hour_in_order() {
        let groups = group_stats(&sample(), GroupBy::Hour);
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["09h", "10h"]);
        assert_eq!(groups[0].stats.events, 3);
        assert_eq!(groups[1].stats.reversed, 1);
    }

    #[test]
    fn group_by_weekday_uses_calendar_order() {
        // 2024-01-01 is a Monday.
        let groups = group_stats(&sample(), GroupBy::Weekday);
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Mon", "Tue", "Wed"]);
    }

    #[test]
    fn group_by_instrument_and_month() {
        let by_symbol = group_stats(&sample(), GroupBy::Instrument);
        assert_eq!(by_symbol.len(), 2);
        assert_eq!(by_symbol[0].key, "BTC");
        let by_month = group_stats(&sample(), GroupBy::Month);
        assert_eq!(by_month.len(), 1);
        assert_eq!(by_month[0].key, "2024-01");
    }

    #[test]
    fn group_by_parses() {
        assert_eq!("slot".parse::<GroupBy>(), Ok(GroupBy::Slot));
        assert!("minute".parse::<GroupBy>().is_err());
    }
}
