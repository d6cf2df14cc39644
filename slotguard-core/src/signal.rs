//! Signal generation: threshold rule over the latest indicator snapshot.
//!
//! The generator sees only the snapshot and its instrument's thresholds,
//! never tracker state or past decisions. Its output is the raw signal the
//! reliability tracker measures.

use crate::config::{ConfigError, InstrumentConfig};
use crate::domain::Signal;
use crate::indicators::IndicatorSnapshot;

/// RSI + stochastic threshold rule, optionally gated by a consecutive run.
///
/// - `Up` when `rsi < rsi_oversold` and `stoch_k < stoch_oversold`
///   (and `consec_down >= consec_threshold` if the threshold is above 1).
/// - `Down` when `rsi > rsi_overbought` and `stoch_k > stoch_overbought`
///   (and `consec_up >= consec_threshold` if the threshold is above 1).
/// - `None` otherwise, and whenever RSI or %K is undefined.
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    config: InstrumentConfig,
}

impl SignalGenerator {
    pub fn new(config: InstrumentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Signal {
        let (Some(rsi), Some(stoch_k)) = (snapshot.rsi, snapshot.stoch_k) else {
            return Signal::None;
        };
        let cfg = &self.config;
        let gated = cfg.consec_threshold > 1;

        if rsi < cfg.rsi_oversold
            && stoch_k < cfg.stoch_oversold
            && (!gated || snapshot.consec_down >= cfg.consec_threshold)
        {
            Signal::Up
        } else if rsi > cfg.rsi_overbought
            && stoch_k > cfg.stoch_overbought
            && (!gated || snapshot.consec_up >= cfg.consec_threshold)
        {
            Signal::Down
        } else {
            Signal::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(rsi: Option<f64>, stoch_k: Option<f64>) -> IndicatorSnapshot {
        IndicatorSnapshot {
            timestamp: chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            rsi,
            stoch_k,
            consec_up: 0,
            consec_down: 0,
            momentum: Some(0.0),
        }
    }

    fn generator(oversold: f64, stoch_oversold: f64) -> SignalGenerator {
        SignalGenerator::new(InstrumentConfig {
            rsi_oversold: oversold,
            stoch_oversold,
            ..InstrumentConfig::for_symbol("BTC")
        })
        .unwrap()
    }

    #[test]
    fn oversold_fires_up() {
        let sig = generator(35.0, 30.0);
        assert_eq!(sig.evaluate(&snapshot(Some(30.0), Some(20.0))), Signal::Up);
    }

    #[test]
    fn overbought_fires_down() {
        let sig = generator(35.0, 30.0);
        assert_eq!(sig.evaluate(&snapshot(Some(80.0), Some(90.0))), Signal::Down);
    }

    #[test]
    fn needs_both_indicators() {
        let sig = generator(35.0, 30.0);
        assert_eq!(sig.evaluate(&snapshot(Some(30.0), Some(50.0))), Signal::None);
        assert_eq!(sig.evaluate(&snapshot(Some(50.0), Some(20.0))), Signal::None);
    }

    #[test]
    fn thresholds_are_strict() {
        let sig = generator(35.0, 30.0);
        assert_eq!(sig.evaluate(&snapshot(Some(35.0), Some(20.0))), Signal::None);
        assert_eq!(sig.evaluate(&snapshot(Some(30.0), Some(30.0))), Signal::None);
    }

    #[test]
    fn undefined_indicator_is_no_signal() {
        let sig = generator(35.0, 30.0);
        assert_eq!(sig.evaluate(&snapshot(None, Some(0.0))), Signal::None);
        assert_eq!(sig.evaluate(&snapshot(Some(0.0), None)), Signal::None);
    }

    #[test]
    fn consecutive_gate_applies_above_one() {
        let sig = SignalGenerator::new(InstrumentConfig {
            consec_threshold: 3,
            ..InstrumentConfig::for_symbol("ETH")
        })
        .unwrap();
        let mut snap = snapshot(Some(20.0), Some(10.0));
        snap.consec_down = 2;
        assert_eq!(sig.evaluate(&snap), Signal::None);
        snap.consec_down = 3;
        assert_eq!(sig.evaluate(&snap), Signal::Up);

        let mut snap = snapshot(Some(90.0), Some(95.0));
        snap.consec_up = 2;
        assert_eq!(sig.evaluate(&snap), Signal::None);
        snap.consec_up = 4;
        assert_eq!(sig.evaluate(&snap), Signal::Down);
    }

    #[test]
    fn gate_of_one_is_ignored() {
        let sig = generator(35.0, 30.0);
        // consec_down is 0 in the base snapshot
        assert_eq!(sig.evaluate(&snapshot(Some(10.0), Some(5.0))), Signal::Up);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = SignalGenerator::new(InstrumentConfig {
            rsi_oversold: 70.0,
            rsi_overbought: 60.0,
            ..InstrumentConfig::for_symbol("BTC")
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::RsiThresholdOrder { .. }));
    }
}
