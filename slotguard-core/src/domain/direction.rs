//! Directional vocabulary: realized directions, raw signals and final decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an interval's close, or of a taken position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

/// Raw output of the threshold rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Up,
    Down,
    None,
}

impl Signal {
    /// The direction this signal calls for, if any.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Self::Up => Some(Direction::Up),
            Self::Down => Some(Direction::Down),
            Self::None => None,
        }
    }

    pub fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<Direction> for Signal {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::Up,
            Direction::Down => Self::Down,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
            Self::None => write!(f, "NONE"),
        }
    }
}

/// Final action for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Take the position the raw signal calls for.
    Trade,
    /// Take no position.
    Skip,
    /// Take the position opposite to the raw signal.
    Reverse,
}

impl Decision {
    /// Direction actually taken for a raw signal direction; `None` on skip.
    pub fn realize(self, signal: Direction) -> Option<Direction> {
        match self {
            Self::Trade => Some(signal),
            Self::Reverse => Some(signal.opposite()),
            Self::Skip => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trade => write!(f, "TRADE"),
            Self::Skip => write!(f, "SKIP"),
            Self::Reverse => write!(f, "REVERSE"),
        }
    }
}
