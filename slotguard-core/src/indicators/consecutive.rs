//! Consecutive run: how many same-direction candles end at the current one.
//!
//! An up candle (close > open) extends the up run and zeroes the down run; a
//! down candle does the reverse, so a direction change starts the new run at 1.
//! A flat candle (close == open) extends neither: both counters go to 0.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Direction};

/// Run lengths at one candle. At most one of the two is non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLength {
    pub up: u32,
    pub down: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ConsecutiveRun {
    current: RunLength,
}

impl ConsecutiveRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, candle: &Candle) -> RunLength {
        self.current = match candle.body_direction() {
            Some(Direction::Up) => RunLength {
                up: self.current.up + 1,
                down: 0,
            },
            Some(Direction::Down) => RunLength {
                up: 0,
                down: self.current.down + 1,
            },
            None => RunLength::default(),
        };
        self.current
    }

    pub fn current(&self) -> RunLength {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = RunLength::default();
    }
}
