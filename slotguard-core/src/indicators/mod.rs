//! Indicator calculator: RSI, stochastic %K, consecutive runs and momentum.
//!
//! Every indicator is a small stateful struct fed one candle at a time. The
//! value returned for candle t depends only on candles 0..=t, so streaming
//! and batch computation agree and no look-ahead is possible.
//!
//! Undefined values (warm-up, zero stochastic range) are `None`, never NaN.

pub mod consecutive;
pub mod momentum;
pub mod rsi;
pub mod snapshot;
pub mod stochastic;

pub use consecutive::{ConsecutiveRun, RunLength};
pub use momentum::Momentum;
pub use rsi::{Rsi, RsiSmoothing};
pub use snapshot::{compute_snapshots, IndicatorCalculator, IndicatorParams, IndicatorSnapshot};
pub use stochastic::Stochastic;

use crate::domain::Candle;

/// Trait for single-series indicators.
///
/// # Look-ahead contamination guard
/// `update` sees candles strictly in order and keeps only what earlier
/// candles left behind. No value at candle t may depend on candle t+1.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_7", "stoch_5").
    fn name(&self) -> &str;

    /// Index of the first candle that can produce a defined value.
    fn lookback(&self) -> usize;

    /// Feed the next candle and return the value at that candle.
    fn update(&mut self, candle: &Candle) -> Option<f64>;

    /// Forget all history.
    fn reset(&mut self);
}

/// Run an indicator from a clean state over a whole candle slice.
///
/// Returns one entry per candle.
pub fn compute_series(indicator: &mut dyn Indicator, candles: &[Candle]) -> Vec<Option<f64>> {
    indicator.reset();
    candles.iter().map(|c| indicator.update(c)).collect()
}

/// Create synthetic 15-minute candles from close prices for testing.
///
/// open = prev_close (or close for the first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 0.5, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle::new(
                base + chrono::Duration::minutes(15 * i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 0.5,
                close,
                1000.0,
            )
            .unwrap()
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
