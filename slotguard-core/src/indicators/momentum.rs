//! Momentum: percentage change of close versus `period` candles earlier.
//!
//! momentum[t] = 100 × (close[t] − close[t−period]) / close[t−period]
//! Lookback: period.

use std::collections::VecDeque;

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Momentum {
    period: usize,
    name: String,
    closes: VecDeque<f64>,
}

impl Momentum {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Momentum period must be >= 1");
        Self {
            period,
            name: format!("momentum_{period}"),
            closes: VecDeque::with_capacity(period + 2),
        }
    }
}

impl Indicator for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn update(&mut self, candle: &Candle) -> Option<f64> {
        self.closes.push_back(candle.close());
        if self.closes.len() > self.period + 1 {
            self.closes.pop_front();
        }
        if self.closes.len() <= self.period {
            return None;
        }

        // Candle prices are validated positive, so the base is never zero.
        let base = *self.closes.front()?;
        Some(100.0 * (candle.close() - base) / base)
    }

    fn reset(&mut self) {
        self.closes.clear();
    }
}
