//! Immutable run configuration: per-instrument thresholds, tracker bands,
//! payout structure and outcome rule.
//!
//! Config types are plain serde structs. Every consumer validates the config
//! it is handed at construction and owns it afterwards, so a running engine
//! never sees an invalid or changing threshold.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Candle, Decision, Direction, SlotGranularity};
use crate::indicators::{IndicatorParams, RsiSmoothing};

/// Configuration errors, raised before anything runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{symbol}: {name} must be >= 1")]
    ZeroPeriod { symbol: String, name: &'static str },

    #[error("{name} = {value} is outside [0, 100]")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("{symbol}: rsi_oversold ({oversold}) must be below rsi_overbought ({overbought})")]
    RsiThresholdOrder {
        symbol: String,
        oversold: f64,
        overbought: f64,
    },

    #[error(
        "{symbol}: stoch_oversold ({oversold}) must be below stoch_overbought ({overbought})"
    )]
    StochThresholdOrder {
        symbol: String,
        oversold: f64,
        overbought: f64,
    },

    #[error("reverse_threshold ({reverse}) must not exceed skip_threshold ({skip})")]
    DecisionBandOrder { reverse: f64, skip: f64 },

    #[error("window_size must be >= 1")]
    EmptyWindow,

    #[error("min_samples ({min_samples}) must be between 1 and window_size ({window_size})")]
    MinSamplesOutOfRange {
        min_samples: usize,
        window_size: usize,
    },

    #[error("slot bucket of {minutes} minutes does not divide the hour")]
    InvalidSlotBucket { minutes: u32 },

    #[error("stake must be positive and finite ({0})")]
    InvalidStake(f64),

    #[error("contract_price must lie strictly between 0 and 1 ({0})")]
    InvalidContractPrice(f64),
}

fn check_pct(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ThresholdOutOfRange { name, value })
    }
}

// ─── Instrument thresholds ───────────────────────────────────────────

/// Threshold rule and indicator lookbacks for one traded instrument.
///
/// Defaults are the RSI(7) 38/68, Stochastic(5) 30/75 parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub symbol: String,
    pub rsi_period: usize,
    pub rsi_smoothing: RsiSmoothing,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub stoch_period: usize,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    /// Minimum opposing run length required when greater than 1.
    pub consec_threshold: u32,
    pub momentum_period: usize,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            rsi_period: 7,
            rsi_smoothing: RsiSmoothing::Simple,
            rsi_oversold: 38.0,
            rsi_overbought: 68.0,
            stoch_period: 5,
            stoch_oversold: 30.0,
            stoch_overbought: 75.0,
            consec_threshold: 1,
            momentum_period: 3,
        }
    }
}

impl InstrumentConfig {
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, period) in [
            ("rsi_period", self.rsi_period),
            ("stoch_period", self.stoch_period),
            ("momentum_period", self.momentum_period),
        ] {
            if period == 0 {
                return Err(ConfigError::ZeroPeriod {
                    symbol: self.symbol.clone(),
                    name,
                });
            }
        }

        check_pct("rsi_oversold", self.rsi_oversold)?;
        check_pct("rsi_overbought", self.rsi_overbought)?;
        check_pct("stoch_oversold", self.stoch_oversold)?;
        check_pct("stoch_overbought", self.stoch_overbought)?;

        if self.rsi_oversold >= self.rsi_overbought {
            return Err(ConfigError::RsiThresholdOrder {
                symbol: self.symbol.clone(),
                oversold: self.rsi_oversold,
                overbought: self.rsi_overbought,
            });
        }
        if self.stoch_oversold >= self.stoch_overbought {
            return Err(ConfigError::StochThresholdOrder {
                symbol: self.symbol.clone(),
                oversold: self.stoch_oversold,
                overbought: self.stoch_overbought,
            });
        }
        Ok(())
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            rsi_period: self.rsi_period,
            rsi_smoothing: self.rsi_smoothing,
            stoch_period: self.stoch_period,
            momentum_period: self.momentum_period,
        }
    }
}

// ─── Tracker bands ───────────────────────────────────────────────────

/// Rolling-window parameters and decision bands, shared by all instruments.
///
/// Thresholds are win rates in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub window_size: usize,
    pub min_samples: usize,
    pub skip_threshold: f64,
    pub reverse_threshold: f64,
    pub granularity: SlotGranularity,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            min_samples: 5,
            skip_threshold: 48.0,
            reverse_threshold: 45.0,
            granularity: SlotGranularity::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.min_samples == 0 || self.min_samples > self.window_size {
            return Err(ConfigError::MinSamplesOutOfRange {
                min_samples: self.min_samples,
                window_size: self.window_size,
            });
        }
        check_pct("skip_threshold", self.skip_threshold)?;
        check_pct("reverse_threshold", self.reverse_threshold)?;
        if self.reverse_threshold > self.skip_threshold {
            return Err(ConfigError::DecisionBandOrder {
                reverse: self.reverse_threshold,
                skip: self.skip_threshold,
            });
        }
        if let SlotGranularity::MinuteBucket { minutes } = self.granularity {
            if minutes == 0 || 60 % minutes != 0 {
                return Err(ConfigError::InvalidSlotBucket { minutes });
            }
        }
        Ok(())
    }

    /// Map a win rate (percent) onto its decision band.
    ///
    /// Bands: `[0, reverse)` → Reverse, `[reverse, skip)` → Skip, `[skip, 100]` → Trade.
    pub fn classify(&self, win_rate: f64) -> Decision {
        if win_rate < self.reverse_threshold {
            Decision::Reverse
        } else if win_rate < self.skip_threshold {
            Decision::Skip
        } else {
            Decision::Trade
        }
    }
}

// ─── Payout ──────────────────────────────────────────────────────────

/// Fixed-stake binary contract payout.
///
/// Buying at `contract_price` with `stake` gets `stake / contract_price`
/// shares that each pay 1 on a win, so a win nets
/// `stake / contract_price × (1 − contract_price)` and a loss costs `stake`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutModel {
    pub stake: f64,
    pub contract_price: f64,
}

impl Default for PayoutModel {
    fn default() -> Self {
        Self {
            stake: 100.0,
            contract_price: 0.525,
        }
    }
}

impl PayoutModel {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.stake.is_finite() && self.stake > 0.0) {
            return Err(ConfigError::InvalidStake(self.stake));
        }
        if !(self.contract_price > 0.0 && self.contract_price < 1.0) {
            return Err(ConfigError::InvalidContractPrice(self.contract_price));
        }
        Ok(())
    }

    pub fn win_amount(&self) -> f64 {
        self.stake / self.contract_price * (1.0 - self.contract_price)
    }

    pub fn loss_amount(&self) -> f64 {
        -self.stake
    }

    pub fn pnl(&self, won: bool) -> f64 {
        if won {
            self.win_amount()
        } else {
            self.loss_amount()
        }
    }
}

// ─── Outcome rule ────────────────────────────────────────────────────

/// How the realized direction of an event is read from the following candle.
///
/// Ties resolve `Down`: only a strict rise counts as `Up`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeRule {
    /// Next candle's close against the decision candle's close.
    #[default]
    NextClose,
    /// Next candle's close against its own open.
    NextBody,
}

impl OutcomeRule {
    pub fn resolve(&self, decided_on: &Candle, next: &Candle) -> Direction {
        let reference = match self {
            Self::NextClose => decided_on.close(),
            Self::NextBody => next.open(),
        };
        if next.close() > reference {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_instrument_is_valid() {
        assert!(InstrumentConfig::for_symbol("BTC").validate().is_ok());
    }

    #[test]
    fn rejects_inverted_rsi_thresholds() {
        let cfg = InstrumentConfig {
            rsi_oversold: 70.0,
            rsi_overbought: 30.0,
            ..InstrumentConfig::for_symbol("BTC")
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::RsiThresholdOrder { .. })));
    }

    #[test]
    fn rejects_equal_stoch_thresholds() {
        let cfg = InstrumentConfig {
            stoch_oversold: 50.0,
            stoch_overbought: 50.0,
            ..InstrumentConfig::for_symbol("ETH")
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::StochThresholdOrder { .. })));
    }

    #[test]
    fn rejects_zero_period() {
        let cfg = InstrumentConfig {
            stoch_period: 0,
            ..InstrumentConfig::for_symbol("XRP")
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroPeriod {
                symbol: "XRP".into(),
                name: "stoch_period"
            })
        );
    }

    #[test]
    fn rejects_threshold_above_100() {
        let cfg = InstrumentConfig {
            rsi_overbought: 120.0,
            ..InstrumentConfig::for_symbol("XRP")
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ThresholdOutOfRange { .. })));
    }

    #[test]
    fn default_tracker_is_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_reverse_above_skip() {
        let cfg = TrackerConfig {
            reverse_threshold: 55.0,
            skip_threshold: 50.0,
            ..TrackerConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DecisionBandOrder {
                reverse: 55.0,
                skip: 50.0
            })
        );
    }

    #[test]
    fn equal_band_thresholds_are_allowed() {
        let cfg = TrackerConfig {
            reverse_threshold: 50.0,
            skip_threshold: 50.0,
            ..TrackerConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.classify(49.9), Decision::Reverse);
        assert_eq!(cfg.classify(50.0), Decision::Trade);
    }

    #[test]
    fn rejects_min_samples_above_window() {
        let cfg = TrackerConfig {
            window_size: 4,
            min_samples: 5,
            ..TrackerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::MinSamplesOutOfRange { .. })));
    }

    #[test]
    fn rejects_bucket_not_dividing_hour() {
        let cfg = TrackerConfig {
            granularity: SlotGranularity::MinuteBucket { minutes: 7 },
            ..TrackerConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidSlotBucket { minutes: 7 }));
    }

    #[test]
    fn classify_band_boundaries() {
        let cfg = TrackerConfig {
            reverse_threshold: 40.0,
            skip_threshold: 50.0,
            ..TrackerConfig::default()
        };
        assert_eq!(cfg.classify(0.0), Decision::Reverse);
        assert_eq!(cfg.classify(39.99), Decision::Reverse);
        assert_eq!(cfg.classify(40.0), Decision::Skip);
        assert_eq!(cfg.classify(49.99), Decision::Skip);
        assert_eq!(cfg.classify(50.0), Decision::Trade);
        assert_eq!(cfg.classify(100.0), Decision::Trade);
    }

    #[test]
    fn payout_matches_binary_contract() {
        let p = PayoutModel::default();
        // 100 / 0.525 shares × 0.475 profit each
        assert!((p.win_amount() - 90.476_190_476).abs() < 1e-6);
        assert_eq!(p.pnl(false), -100.0);
    }

    #[test]
    fn payout_validation() {
        assert!(PayoutModel { stake: 0.0, contract_price: 0.5 }.validate().is_err());
        assert!(PayoutModel { stake: 10.0, contract_price: 1.0 }.validate().is_err());
        assert!(PayoutModel { stake: 10.0, contract_price: 0.5 }.validate().is_ok());
    }

    #[test]
    fn outcome_rules() {
        let t = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let decided = Candle::new(t, 10.0, 11.0, 9.0, 10.0, 1.0).unwrap();
        // Opens above the decision close, closes below its own open but above 10.
        let next = Candle::new(t + chrono::Duration::minutes(15), 10.8, 11.0, 10.1, 10.5, 1.0)
            .unwrap();
        assert_eq!(OutcomeRule::NextClose.resolve(&decided, &next), Direction::Up);
        assert_eq!(OutcomeRule::NextBody.resolve(&decided, &next), Direction::Down);
    }

    #[test]
    fn outcome_tie_is_down() {
        let t = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let decided = Candle::new(t, 10.0, 11.0, 9.0, 10.0, 1.0).unwrap();
        let next = Candle::new(t + chrono::Duration::minutes(15), 10.0, 11.0, 9.0, 10.0, 1.0)
            .unwrap();
        assert_eq!(OutcomeRule::NextClose.resolve(&decided, &next), Direction::Down);
        assert_eq!(OutcomeRule::NextBody.resolve(&decided, &next), Direction::Down);
    }

    #[test]
    fn instrument_config_from_partial_json() {
        let cfg: InstrumentConfig =
            serde_json::from_str(r#"{"symbol":"ETH","rsi_oversold":42,"rsi_overbought":62}"#)
                .unwrap();
        assert_eq!(cfg.rsi_oversold, 42.0);
        assert_eq!(cfg.stoch_period, 5);
        assert!(cfg.validate().is_ok());
    }
}
