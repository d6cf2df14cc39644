//! Stochastic %K.
//!
//! %K = 100 × (close − lowest_low) / (highest_high − lowest_low) over the last
//! `period` candles including the current one.
//! Lookback: period − 1.
//! Edge case: highest_high == lowest_low (flat window) → undefined.

use std::collections::VecDeque;

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Stochastic {
    period: usize,
    name: String,
    window: VecDeque<(f64, f64)>,
}

impl Stochastic {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Stochastic period must be >= 1");
        Self {
            period,
            name: format!("stoch_{period}"),
            window: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn update(&mut self, candle: &Candle) -> Option<f64> {
        self.window.push_back((candle.high(), candle.low()));
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        if self.window.len() < self.period {
            return None;
        }

        let (highest, lowest) = self.window.iter().fold(
            (f64::NEG_INFINITY, f64::INFINITY),
            |(hh, ll), &(h, l)| (hh.max(h), ll.min(l)),
        );
        let range = highest - lowest;
        if range == 0.0 {
            return None;
        }

        Some(100.0 * (candle.close() - lowest) / range)
    }

    fn reset(&mut self) {
        self.window.clear();
    }
}
