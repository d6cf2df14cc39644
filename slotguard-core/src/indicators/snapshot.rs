//! Per-candle indicator snapshot and the calculator that produces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConsecutiveRun, Indicator, Momentum, Rsi, RsiSmoothing, Stochastic};
use crate::domain::Candle;

/// Lookback parameters for the four indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub rsi_smoothing: RsiSmoothing,
    pub stoch_period: usize,
    pub momentum_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 7,
            rsi_smoothing: RsiSmoothing::Simple,
            stoch_period: 5,
            momentum_period: 3,
        }
    }
}

/// Indicator values at one candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    pub consec_up: u32,
    pub consec_down: u32,
    pub momentum: Option<f64>,
}

impl IndicatorSnapshot {
    /// True when every windowed indicator is defined.
    pub fn is_complete(&self) -> bool {
        self.rsi.is_some() && self.stoch_k.is_some() && self.momentum.is_some()
    }
}

/// Streams candles through RSI, stochastic, consecutive-run and momentum.
#[derive(Debug, Clone)]
pub struct IndicatorCalculator {
    rsi: Rsi,
    stoch: Stochastic,
    run: ConsecutiveRun,
    momentum: Momentum,
    candles_seen: usize,
}

impl IndicatorCalculator {
    pub fn new(params: IndicatorParams) -> Self {
        Self {
            rsi: Rsi::new(params.rsi_period, params.rsi_smoothing),
            stoch: Stochastic::new(params.stoch_period),
            run: ConsecutiveRun::new(),
            momentum: Momentum::new(params.momentum_period),
            candles_seen: 0,
        }
    }

    /// Feed the next candle and return its snapshot.
    pub fn push(&mut self, candle: &Candle) -> IndicatorSnapshot {
        self.candles_seen += 1;
        let run = self.run.update(candle);
        IndicatorSnapshot {
            timestamp: candle.timestamp(),
            rsi: self.rsi.update(candle),
            stoch_k: self.stoch.update(candle),
            consec_up: run.up,
            consec_down: run.down,
            momentum: self.momentum.update(candle),
        }
    }

    /// Number of candles before every indicator can be defined.
    pub fn warmup(&self) -> usize {
        self.rsi
            .lookback()
            .max(self.stoch.lookback())
            .max(self.momentum.lookback())
    }

    /// True once enough candles have been seen that no indicator is in warm-up.
    pub fn is_warm(&self) -> bool {
        self.candles_seen > self.warmup()
    }

    pub fn candles_seen(&self) -> usize {
        self.candles_seen
    }

    pub fn reset(&mut self) {
        self.rsi.reset();
        self.stoch.reset();
        self.run.reset();
        self.momentum.reset();
        self.candles_seen = 0;
    }
}

/// Batch helper: one snapshot per candle from a fresh calculator.
pub fn compute_snapshots(params: IndicatorParams, candles: &[Candle]) -> Vec<IndicatorSnapshot> {
    let mut calc = IndicatorCalculator::new(params);
    candles.iter().map(|c| calc.push(c)).collect()
}
