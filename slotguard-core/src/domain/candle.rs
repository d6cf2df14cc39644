//! Candle: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Direction;

/// Errors raised when a candle fails validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("candle at {timestamp}: field '{field}' is not finite ({value})")]
    NonFinite {
        timestamp: DateTime<Utc>,
        field: &'static str,
        value: f64,
    },

    #[error("candle at {timestamp}: price field '{field}' must be positive ({value})")]
    NonPositivePrice {
        timestamp: DateTime<Utc>,
        field: &'static str,
        value: f64,
    },

    #[error("candle at {timestamp}: negative volume ({volume})")]
    NegativeVolume {
        timestamp: DateTime<Utc>,
        volume: f64,
    },

    #[error(
        "candle at {timestamp}: inconsistent range (open={open}, high={high}, low={low}, close={close})"
    )]
    InconsistentRange {
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

/// OHLCV candle for a single instrument and interval.
///
/// Fields are private so a `Candle` can only exist in a validated state;
/// use [`Candle::new`] to build one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Candle {
    /// Build a candle, rejecting non-finite values, non-positive prices,
    /// negative volume and a high/low range that does not contain open and close.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, CandleError> {
        let fields = [
            ("open", open),
            ("high", high),
            ("low", low),
            ("close", close),
            ("volume", volume),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(CandleError::NonFinite {
                    timestamp,
                    field,
                    value,
                });
            }
        }
        for &(field, value) in &fields[..4] {
            if value <= 0.0 {
                return Err(CandleError::NonPositivePrice {
                    timestamp,
                    field,
                    value,
                });
            }
        }
        if volume < 0.0 {
            return Err(CandleError::NegativeVolume { timestamp, volume });
        }
        if high < low || high < open.max(close) || low > open.min(close) {
            return Err(CandleError::InconsistentRange {
                timestamp,
                open,
                high,
                low,
                close,
            });
        }

        Ok(Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Body direction: `Up` if close > open, `Down` if close < open, `None` if flat.
    pub fn body_direction(&self) -> Option<Direction> {
        if self.close > self.open {
            Some(Direction::Up)
        } else if self.close < self.open {
            Some(Direction::Down)
        } else {
            None
        }
    }
}

/// Raw candle fields as they arrive from a loader, before validation.
#[derive(Debug, Clone, Deserialize)]
struct RawCandle {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl<'de> Deserialize<'de> for Candle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawCandle::deserialize(deserializer)?;
        Candle::new(raw.timestamp, raw.open, raw.high, raw.low, raw.close, raw.volume)
            .map_err(serde::de::Error::custom)
    }
}
