//! Trend regime from the EMA stack.
//!
//! Bull requires short > mid > long, bear short < mid < long, both strict.
//! Anything else, including an undefined EMA, is a range.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional bias: +1 long, -1 short, 0 none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Direction {
    Long,
    Short,
    Flat,
}

impl Direction {
    pub fn sign(self) -> i8 {
        match self {
            Direction::Long => 1,
            Direction::Short => -1,
            Direction::Flat => 0,
        }
    }

    pub fn is_flat(self) -> bool {
        self == Direction::Flat
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
            Direction::Flat => Direction::Flat,
        }
    }
}

impl From<Direction> for i8 {
    fn from(d: Direction) -> i8 {
        d.sign()
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Direction::Long),
            -1 => Ok(Direction::Short),
            0 => Ok(Direction::Flat),
            other => Err(format!("direction must be -1, 0 or 1 (got {other})")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendRegime {
    Bull,
    Bear,
    Range,
}

impl TrendRegime {
    /// Classify from the three EMAs of one row. NaN inputs fall through to `Range`.
    pub fn classify(ema_short: f64, ema_mid: f64, ema_long: f64) -> Self {
        if ema_short > ema_mid && ema_mid > ema_long {
            TrendRegime::Bull
        } else if ema_short < ema_mid && ema_mid < ema_long {
            TrendRegime::Bear
        } else {
            TrendRegime::Range
        }
    }

    /// Direction is derived from the regime, never computed separately.
    pub fn direction(self) -> Direction {
        match self {
            TrendRegime::Bull => Direction::Long,
            TrendRegime::Bear => Direction::Short,
            TrendRegime::Range => Direction::Flat,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrendRegime::Bull => "Bull trend",
            TrendRegime::Bear => "Bear trend",
            TrendRegime::Range => "Range (no trade)",
        }
    }
}

impl fmt::Display for TrendRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
