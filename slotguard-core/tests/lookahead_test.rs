//! Look-ahead contamination tests.
//!
//! No indicator value, signal or decision at candle t may depend on candle
//! t+1 or later.
//!
//! Method: compute on a truncated series (candles 0..150) and on the full
//! series (candles 0..300). Everything produced from the truncated series
//! must equal the corresponding prefix of the full run.

use chrono::{TimeZone, Utc};
use slotguard_core::indicators::{
    compute_series, compute_snapshots, Indicator, Momentum, Rsi, Stochastic,
};
use slotguard_core::{
    replay, Candle, InstrumentConfig, OutcomeRule, PayoutModel, RsiSmoothing, TrackerConfig,
};

/// N 15-minute candles from a deterministic LCG random walk.
fn make_test_candles(n: usize) -> Vec<Candle> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut price: f64 = 100.0;
    let mut candles = Vec::with_capacity(n);

    for i in 0..n {
        let seed = (i as u64)
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let change = ((seed >> 33) % 200) as f64 / 100.0 - 1.0; // -1.0 to +0.99
        let open = price;
        price = (price + change).max(10.0);
        let close = price;
        candles.push(
            Candle::new(
                base + chrono::Duration::minutes(15 * i as i64),
                open,
                open.max(close) + 0.4,
                open.min(close) - 0.4,
                close,
                1000.0 + i as f64,
            )
            .unwrap(),
        );
    }
    candles
}

fn assert_no_lookahead(indicator: &mut dyn Indicator, full: &[Candle], truncated_len: usize) {
    let full_result = compute_series(indicator, full);
    let truncated_result = compute_series(indicator, &full[..truncated_len]);

    assert_eq!(truncated_result.len(), truncated_len);
    assert_eq!(full_result.len(), full.len());
    assert_eq!(
        &full_result[..truncated_len],
        &truncated_result[..],
        "{}: truncated and full series disagree",
        indicator.name()
    );
}

#[test]
fn rsi_simple_no_lookahead() {
    let candles = make_test_candles(300);
    assert_no_lookahead(&mut Rsi::new(7, RsiSmoothing::Simple), &candles, 150);
}

#[test]
fn rsi_wilder_no_lookahead() {
    let candles = make_test_candles(300);
    assert_no_lookahead(&mut Rsi::new(14, RsiSmoothing::Wilder), &candles, 150);
}

#[test]
fn stochastic_no_lookahead() {
    let candles = make_test_candles(300);
    assert_no_lookahead(&mut Stochastic::new(5), &candles, 150);
}

#[test]
fn momentum_no_lookahead() {
    let candles = make_test_candles(300);
    assert_no_lookahead(&mut Momentum::new(3), &candles, 150);
}

#[test]
fn snapshots_no_lookahead() {
    let candles = make_test_candles(300);
    let cfg = InstrumentConfig::for_symbol("TEST");
    let full = compute_snapshots(cfg.indicator_params(), &candles);
    let truncated = compute_snapshots(cfg.indicator_params(), &candles[..150]);
    assert_eq!(&full[..150], &truncated[..]);
}

#[test]
fn records_no_lookahead() {
    let candles = make_test_candles(300);
    let run = |slice: &[Candle]| {
        replay(
            InstrumentConfig {
                rsi_oversold: 40.0,
                rsi_overbought: 60.0,
                stoch_oversold: 35.0,
                stoch_overbought: 65.0,
                ..InstrumentConfig::for_symbol("TEST")
            },
            TrackerConfig {
                min_samples: 2,
                ..TrackerConfig::default()
            },
            PayoutModel::default(),
            OutcomeRule::NextClose,
            slice,
        )
        .unwrap()
    };

    let full = run(&candles);
    let truncated = run(&candles[..150]);
    assert!(!truncated.records.is_empty());
    assert!(truncated.records.len() <= full.records.len());
    assert_eq!(&full.records[..truncated.records.len()], &truncated.records[..]);
}
