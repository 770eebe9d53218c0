//! Candlestick pattern detection on the last two bars.
//!
//! - Pin bull: lower wick > ratio * range
//! - Pin bear: upper wick > ratio * range
//! - Engulf bull: bullish bar after a bearish one, opening below the prior low
//!   and closing above the prior high
//! - Engulf bear: the mirror
//!
//! A zero-range current bar cannot be classified and yields no flags.

use crate::domain::Bar;
use crate::params::PatternParams;
use serde::{Deserialize, Serialize};

/// Independent pattern flags for the current bar; several may hold at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandlePattern {
    pub pin_bull: bool,
    pub pin_bear: bool,
    pub engulf_bull: bool,
    pub engulf_bear: bool,
}

impl CandlePattern {
    pub fn detect(curr: &Bar, prev: &Bar, params: &PatternParams) -> Self {
        let range = curr.range();
        // Also rejects NaN ranges.
        if !(range > 0.0) {
            return Self::default();
        }

        let threshold = range * params.pin_wick_ratio;
        Self {
            pin_bull: curr.lower_wick() > threshold,
            pin_bear: curr.upper_wick() > threshold,
            engulf_bull: curr.is_bullish()
                && prev.is_bearish()
                && curr.close > prev.high
                && curr.open < prev.low,
            engulf_bear: curr.is_bearish()
                && prev.is_bullish()
                && curr.close < prev.low
                && curr.open > prev.high,
        }
    }

    /// Bullish confirmation: pin bull or bullish engulfing.
    pub fn bullish(&self) -> bool {
        self.pin_bull || self.engulf_bull
    }

    /// Bearish confirmation: pin bear or bearish engulfing.
    pub fn bearish(&self) -> bool {
        self.pin_bear || self.engulf_bear
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;

    fn detect(prev: (f64, f64, f64, f64), curr: (f64, f64, f64, f64)) -> CandlePattern {
        let bars = make_ohlc_bars(&[prev, curr]);
        CandlePattern::detect(&bars[1], &bars[0], &PatternParams::default())
    }

    #[test]
    fn zero_range_bar_has_no_flags() {
        let p = detect((90.0, 120.0, 80.0, 110.0), (100.0, 100.0, 100.0, 100.0));
        assert!(p.is_empty());
    }

    #[test]
    fn hammer_is_pin_bull() {
        // range 10, lower wick 7
        let p = detect((100.0, 101.0, 99.0, 100.0), (99.0, 100.0, 90.0, 97.0));
        assert!(p.pin_bull);
        assert!(!p.pin_bear);
        assert!(p.bullish());
    }

    #[test]
    fn shooting_star_is_pin_bear() {
        let p = detect((100.0, 101.0, 99.0, 100.0), (101.0, 110.0, 100.0, 103.0));
        assert!(p.pin_bear);
        assert!(!p.pin_bull);
        assert!(p.bearish());
    }

    #[test]
    fn wick_at_exact_ratio_is_not_a_pin() {
        // range 10, lower wick exactly 6
        let p = detect((100.0, 101.0, 99.0, 100.0), (96.0, 100.0, 90.0, 98.0));
        assert!(!p.pin_bull);
    }

    #[test]
    fn bullish_engulfing() {
        let p = detect((104.0, 105.0, 100.0, 101.0), (99.0, 107.0, 98.0, 106.0));
        assert!(p.engulf_bull);
        assert!(!p.engulf_bear);
    }

    #[test]
    fn bearish_engulfing() {
        let p = detect((101.0, 105.0, 100.0, 104.0), (106.0, 107.0, 98.0, 99.0));
        assert!(p.engulf_bear);
        assert!(!p.engulf_bull);
    }

    #[test]
    fn engulfing_requires_opposite_prior_bar() {
        // prior bar bullish, so no bullish engulf even though the range is covered
        let p = detect((101.0, 105.0, 100.0, 104.0), (99.0, 107.0, 98.0, 106.0));
        assert!(!p.engulf_bull);
    }

    #[test]
    fn flags_can_coexist() {
        // bullish engulf with a long lower wick: range 40, lower wick 29
        let p = detect((104.0, 105.0, 100.0, 101.0), (99.0, 110.0, 70.0, 106.0));
        assert!(p.engulf_bull);
        assert!(p.pin_bull);
    }
}
