//! Signal scorer: six independent one-point checks, mirrored by direction.
//!
//! | # | Check               | Long                                        | Short                                        |
//! |---|---------------------|---------------------------------------------|----------------------------------------------|
//! | 1 | Liquidity sweep     | low < recent low, close > recent low        | high > recent high, close < recent high      |
//! | 2 | RSI reversal        | prev RSI < bull level < curr RSI            | prev RSI > bear level > curr RSI             |
//! | 3 | Candle confirmation | pin bull or bullish engulfing               | pin bear or bearish engulfing                |
//! | 4 | Bollinger midline   | close above mid, prev close below it        | close below mid, prev close above it         |
//! | 5 | Volume expansion    | volume > vol MA * multiplier                | same                                         |
//! | 6 | Fibonacci           | close within tolerance of a retracement     | same                                         |
//!
//! Retracement levels are measured down from the structural high in both
//! directions. Midline comparisons use the current bar's band for both closes.

use crate::frame::{EvalRow, PrevRow};
use crate::params::ScoringParams;
use crate::pattern::CandlePattern;
use crate::trend::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inputs the checks read, taken from the last two frame rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreContext {
    pub curr: EvalRow,
    pub prev: PrevRow,
    /// Lowest low of the bars preceding `curr` in the sweep window.
    pub recent_low: f64,
    /// Highest high of the bars preceding `curr` in the sweep window.
    pub recent_high: f64,
    pub pattern: CandlePattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCheck {
    LiquiditySweep,
    RsiReversal,
    CandleConfirmation,
    BollingerReclaim,
    VolumeExpansion,
    FibRetracement,
}

impl ScoreCheck {
    /// Evaluation order; also the order of reasons in a result.
    pub const ALL: [ScoreCheck; 6] = [
        ScoreCheck::LiquiditySweep,
        ScoreCheck::RsiReversal,
        ScoreCheck::CandleConfirmation,
        ScoreCheck::BollingerReclaim,
        ScoreCheck::VolumeExpansion,
        ScoreCheck::FibRetracement,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScoreCheck::LiquiditySweep => "liquidity_sweep",
            ScoreCheck::RsiReversal => "rsi_reversal",
            ScoreCheck::CandleConfirmation => "candle_confirmation",
            ScoreCheck::BollingerReclaim => "bollinger_reclaim",
            ScoreCheck::VolumeExpansion => "volume_expansion",
            ScoreCheck::FibRetracement => "fib_retracement",
        }
    }

    /// Run this check for `direction`. Returns the reason text when it fires.
    pub fn evaluate(
        self,
        direction: Direction,
        ctx: &ScoreContext,
        params: &ScoringParams,
    ) -> Option<String> {
        let curr = &ctx.curr;
        let prev = &ctx.prev;
        let close = curr.bar.close;

        let fired = match (self, direction) {
            (_, Direction::Flat) => false,

            (ScoreCheck::LiquiditySweep, Direction::Long) => {
                curr.bar.low < ctx.recent_low && close > ctx.recent_low
            }
            (ScoreCheck::LiquiditySweep, Direction::Short) => {
                curr.bar.high > ctx.recent_high && close < ctx.recent_high
            }

            (ScoreCheck::RsiReversal, Direction::Long) => {
                prev.rsi < params.rsi_bull_threshold && curr.rsi > params.rsi_bull_threshold
            }
            (ScoreCheck::RsiReversal, Direction::Short) => {
                prev.rsi > params.rsi_bear_threshold && curr.rsi < params.rsi_bear_threshold
            }

            (ScoreCheck::CandleConfirmation, Direction::Long) => ctx.pattern.bullish(),
            (ScoreCheck::CandleConfirmation, Direction::Short) => ctx.pattern.bearish(),

            (ScoreCheck::BollingerReclaim, Direction::Long) => {
                close > curr.bb_mid && prev.bar.close < curr.bb_mid
            }
            (ScoreCheck::BollingerReclaim, Direction::Short) => {
                close < curr.bb_mid && prev.bar.close > curr.bb_mid
            }

            (ScoreCheck::VolumeExpansion, _) => {
                curr.bar.volume > curr.vol_ma * params.volume_multiplier
            }

            (ScoreCheck::FibRetracement, _) => {
                return fib_match(curr, params)
                    .map(|level| fib_description(direction, level));
            }
        };

        fired.then(|| self.description(direction, params))
    }

    fn description(self, direction: Direction, params: &ScoringParams) -> String {
        let long = direction == Direction::Long;
        match self {
            ScoreCheck::LiquiditySweep if long => "Liquidity sweep below recent lows".into(),
            ScoreCheck::LiquiditySweep => "Liquidity sweep above recent highs".into(),
            ScoreCheck::RsiReversal if long => {
                format!("RSI turned up through {}", params.rsi_bull_threshold)
            }
            ScoreCheck::RsiReversal => {
                format!("RSI rolled over through {}", params.rsi_bear_threshold)
            }
            ScoreCheck::CandleConfirmation if long => "Bullish candle (pin bar/engulfing)".into(),
            ScoreCheck::CandleConfirmation => "Bearish candle (pin bar/engulfing)".into(),
            ScoreCheck::BollingerReclaim if long => "Reclaimed Bollinger midline".into(),
            ScoreCheck::BollingerReclaim => "Lost Bollinger midline".into(),
            ScoreCheck::VolumeExpansion => "Volume expansion".into(),
            ScoreCheck::FibRetracement => "Fibonacci retracement".into(),
        }
    }
}

impl fmt::Display for ScoreCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First configured retracement level the close sits near, if any.
fn fib_match(curr: &EvalRow, params: &ScoringParams) -> Option<f64> {
    let price = curr.bar.close;
    let range = curr.struct_range();
    params.fib_levels.iter().copied().find(|&level| {
        let level_price = curr.struct_high - range * level;
        (price - level_price).abs() / price < params.fib_tolerance
    })
}

fn fib_description(direction: Direction, level: f64) -> String {
    match direction {
        Direction::Short => format!("Rally into Fib {level}"),
        _ => format!("Pullback to Fib {level}"),
    }
}

/// One fired check. `polarity` always equals the result's direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub polarity: Direction,
    pub check: ScoreCheck,
    pub description: String,
}

/// Evaluate every check in order. A flat direction scores nothing.
pub fn score(direction: Direction, ctx: &ScoreContext, params: &ScoringParams) -> Vec<Reason> {
    if direction.is_flat() {
        return Vec::new();
    }
    ScoreCheck::ALL
        .iter()
        .filter_map(|&check| {
            check
                .evaluate(direction, ctx, params)
                .map(|description| Reason {
                    polarity: direction,
                    check,
                    description,
                })
        })
        .collect()
}
