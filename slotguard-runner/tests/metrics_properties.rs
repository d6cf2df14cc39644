//! Property tests for outcome metrics over arbitrary record streams.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use slotguard_core::{
    Decision, Direction, EventId, EventRecord, PayoutModel, Signal, SlotGranularity,
};
use slotguard_runner::metrics::{longest_losing_streak, max_drawdown};
use slotguard_runner::{group_stats, GroupBy, OutcomeStats};

fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![
        Just(Decision::Trade),
        Just(Decision::Skip),
        Just(Decision::Reverse)
    ]
}

/// (gap in 15-minute steps, symbol index, signal up, outcome up, decision)
fn arb_stream() -> impl Strategy<Value = Vec<(i64, usize, bool, bool, Decision)>> {
    prop::collection::vec(
        (1i64..40, 0usize..3, any::<bool>(), any::<bool>(), arb_decision()),
        0..120,
    )
}

fn build(stream: &[(i64, usize, bool, bool, Decision)]) -> Vec<EventRecord> {
    let payout = PayoutModel::default();
    let granularity = SlotGranularity::MinuteBucket { minutes: 15 };
    let mut ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    stream
        .iter()
        .enumerate()
        .map(|(i, &(gap, sym, up, outcome_up, decision))| {
            ts += Duration::minutes(15 * gap);
            let signal = if up { Direction::Up } else { Direction::Down };
            let outcome = if outcome_up {
                Direction::Up
            } else {
                Direction::Down
            };
            let realized = decision.realize(signal);
            let outcome_correct = realized.map(|d| d == outcome);
            EventRecord {
                event_id: EventId(i as u64),
                symbol: ["BTC", "ETH", "SOL"][sym].to_string(),
                timestamp: ts,
                slot: granularity.slot_for(ts),
                raw_signal: Signal::from(signal),
                decision,
                realized_direction: realized,
                outcome,
                signal_correct: signal == outcome,
                outcome_correct,
                pnl: outcome_correct.map_or(0.0, |won| payout.pnl(won)),
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn counts_are_consistent(stream in arb_stream()) {
        let records = build(&stream);
        let stats = OutcomeStats::from_records(&records);
        prop_assert_eq!(stats.events, records.len());
        prop_assert_eq!(stats.trades, stats.wins + stats.losses);
        prop_assert_eq!(stats.trades + stats.skipped, stats.events);
        prop_assert!(stats.longest_losing_streak <= stats.losses);
        if let Some(rate) = stats.win_rate {
            prop_assert!((0.0..=100.0).contains(&rate));
        }
    }

    #[test]
    fn drawdown_is_bounded_by_total_losses(stream in arb_stream()) {
        let records = build(&stream);
        let stats = OutcomeStats::from_records(&records);
        let loss_total: f64 = records.iter().filter(|r| r.pnl < 0.0).map(|r| -r.pnl).sum();
        prop_assert!(stats.max_drawdown >= 0.0);
        prop_assert!(stats.max_drawdown <= loss_total + 1e-9);
    }

    #[test]
    fn groups_partition_events(stream in arb_stream()) {
        let records = build(&stream);
        let total = OutcomeStats::from_records(&records);
        for by in GroupBy::ALL {
            let groups = group_stats(&records, by);
            let events: usize = groups.iter().map(|g| g.stats.events).sum();
            let trades: usize = groups.iter().map(|g| g.stats.trades).sum();
            let pnl: f64 = groups.iter().map(|g| g.stats.total_pnl).sum();
            prop_assert_eq!(events, total.events);
            prop_assert_eq!(trades, total.trades);
            prop_assert!((pnl - total.total_pnl).abs() < 1e-6);
        }
    }

    #[test]
    fn baseline_takes_every_signal(stream in arb_stream()) {
        let records = build(&stream);
        let baseline = OutcomeStats::baseline(&records, &PayoutModel::default());
        prop_assert_eq!(baseline.trades, records.len());
        prop_assert_eq!(baseline.skipped, 0);
        prop_assert_eq!(baseline.wins, records.iter().filter(|r| r.signal_correct).count());
    }

    #[test]
    fn streak_never_exceeds_sequence(wins in prop::collection::vec(any::<bool>(), 0..200)) {
        let streak = longest_losing_streak(wins.iter().copied());
        prop_assert!(streak <= wins.iter().filter(|w| !**w).count());
    }

    #[test]
    fn all_gains_have_no_drawdown(pnls in prop::collection::vec(0.0f64..500.0, 0..100)) {
        prop_assert_eq!(max_drawdown(pnls), 0.0);
    }
}
