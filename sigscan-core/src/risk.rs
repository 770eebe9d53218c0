//! Stop-loss and take-profit levels.
//!
//! Long:  stop = low - k * ATR, TP1 = structural high, TP2 = high + range * ext
//! Short: stop = high + k * ATR, TP1 = structural low,  TP2 = low - range * ext
//!
//! No clamping: a pathological ATR or structure can put the stop on the wrong
//! side of price, and the levels are reported as computed.

use crate::frame::EvalRow;
use crate::params::RiskParams;
use crate::trend::Direction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
}

impl RiskLevels {
    /// Levels for `direction`, or `None` when flat.
    pub fn compute(direction: Direction, curr: &EvalRow, params: &RiskParams) -> Option<Self> {
        let stop_distance = params.stop_atr_multiple * curr.atr;
        let extension = curr.struct_range() * params.extension_ratio;
        match direction {
            Direction::Long => Some(Self {
                stop_loss: curr.bar.low - stop_distance,
                take_profit_1: curr.struct_high,
                take_profit_2: curr.struct_high + extension,
            }),
            Direction::Short => Some(Self {
                stop_loss: curr.bar.high + stop_distance,
                take_profit_1: curr.struct_low,
                take_profit_2: curr.struct_low - extension,
            }),
            Direction::Flat => None,
        }
    }

    /// Reward-to-risk ratio of the first target from `entry`.
    pub fn reward_risk(&self, entry: f64) -> Option<f64> {
        let risk = (entry - self.stop_loss).abs();
        if risk > 0.0 {
            Some((self.take_profit_1 - entry).abs() / risk)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::{TimeZone, Utc};

    fn row(low: f64, high: f64, atr: f64, struct_high: f64, struct_low: f64) -> EvalRow {
        EvalRow {
            bar: Bar {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
                open: low,
                high,
                low,
                close: high,
                volume: 1.0,
            },
            ema_short: 0.0,
            ema_mid: 0.0,
            ema_long: 0.0,
            rsi: 50.0,
            bb_upper: 0.0,
            bb_mid: 0.0,
            bb_lower: 0.0,
            atr,
            struct_high,
            struct_low,
            vol_ma: 1.0,
        }
    }

    #[test]
    fn long_levels() {
        let levels =
            RiskLevels::compute(Direction::Long, &row(100.0, 104.0, 2.0, 150.0, 90.0), &RiskParams::default())
                .unwrap();
        assert!((levels.stop_loss - 96.0).abs() < 1e-9);
        assert_eq!(levels.take_profit_1, 150.0);
        assert!((levels.take_profit_2 - 187.08).abs() < 1e-9);
    }

    #[test]
    fn short_levels_mirror() {
        let levels =
            RiskLevels::compute(Direction::Short, &row(100.0, 104.0, 2.0, 150.0, 90.0), &RiskParams::default())
                .unwrap();
        assert!((levels.stop_loss - 108.0).abs() < 1e-9);
        assert_eq!(levels.take_profit_1, 90.0);
        assert!((levels.take_profit_2 - (90.0 - 60.0 * 0.618)).abs() < 1e-9);
    }

    #[test]
    fn flat_has_no_levels() {
        assert!(RiskLevels::compute(
            Direction::Flat,
            &row(100.0, 104.0, 2.0, 150.0, 90.0),
            &RiskParams::default()
        )
        .is_none());
    }

    #[test]
    fn no_clamping_of_inverted_stop() {
        let params = RiskParams {
            stop_atr_multiple: -10.0,
            ..RiskParams::default()
        };
        let levels =
            RiskLevels::compute(Direction::Long, &row(100.0, 104.0, 2.0, 150.0, 90.0), &params).unwrap();
        assert!(levels.stop_loss > 104.0);
    }

    #[test]
    fn reward_risk_ratio() {
        let levels = RiskLevels {
            stop_loss: 96.0,
            take_profit_1: 112.0,
            take_profit_2: 120.0,
        };
        assert_eq!(levels.reward_risk(100.0), Some(3.0));
        assert_eq!(levels.reward_risk(96.0), None);
    }
}
