//! Relative Strength Index (RSI).
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss) over close-to-close deltas.
//! Lookback: period (the first delta needs two candles).
//! Edge case: avg_loss == 0 → RSI = 100, including a perfectly flat series.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::Indicator;
use crate::domain::Candle;

/// How average gain and average loss are smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSmoothing {
    /// Rolling mean of the last `period` deltas.
    #[default]
    Simple,
    /// Mean of the first `period` deltas, then Wilder smoothing (alpha = 1/period).
    Wilder,
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    smoothing: RsiSmoothing,
    name: String,
    prev_close: Option<f64>,
    gains: VecDeque<f64>,
    losses: VecDeque<f64>,
    avg_gain: f64,
    avg_loss: f64,
    seeded: bool,
}

impl Rsi {
    pub fn new(period: usize, smoothing: RsiSmoothing) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            smoothing,
            name: format!("rsi_{period}"),
            prev_close: None,
            gains: VecDeque::with_capacity(period + 1),
            losses: VecDeque::with_capacity(period + 1),
            avg_gain: 0.0,
            avg_loss: 0.0,
            seeded: false,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    fn push_window(&mut self, gain: f64, loss: f64) -> bool {
        self.gains.push_back(gain);
        self.losses.push_back(loss);
        if self.gains.len() > self.period {
            self.gains.pop_front();
            self.losses.pop_front();
        }
        self.gains.len() == self.period
    }

    fn window_means(&self) -> (f64, f64) {
        let n = self.period as f64;
        (
            self.gains.iter().sum::<f64>() / n,
            self.losses.iter().sum::<f64>() / n,
        )
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn update(&mut self, candle: &Candle) -> Option<f64> {
        let close = candle.close();
        let prev = self.prev_close.replace(close)?;

        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        match self.smoothing {
            RsiSmoothing::Simple => {
                if !self.push_window(gain, loss) {
                    return None;
                }
                (self.avg_gain, self.avg_loss) = self.window_means();
            }
            RsiSmoothing::Wilder => {
                if self.seeded {
                    let alpha = 1.0 / self.period as f64;
                    self.avg_gain = alpha * gain + (1.0 - alpha) * self.avg_gain;
                    self.avg_loss = alpha * loss + (1.0 - alpha) * self.avg_loss;
                } else {
                    if !self.push_window(gain, loss) {
                        return None;
                    }
                    (self.avg_gain, self.avg_loss) = self.window_means();
                    self.gains.clear();
                    self.losses.clear();
                    self.seeded = true;
                }
            }
        }

        Some(rsi_value(self.avg_gain, self.avg_loss))
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.gains.clear();
        self.losses.clear();
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
        self.seeded = false;
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
