//! Indicator frame: bars augmented with every derived series the engine reads.
//!
//! Series are precomputed once per evaluation through the [`Indicator`] trait
//! and indexed by bar position afterwards. Warmup values are NaN internally
//! and surface as `None` in [`IndicatorRow`].

use crate::domain::Bar;
use crate::error::EvalError;
use crate::indicators::{Atr, Bollinger, Ema, Indicator, RollingExtreme, Rsi, Sma};
use crate::params::IndicatorParams;

/// Bar-aligned derived series for one bar window.
#[derive(Debug, Clone)]
pub struct IndicatorFrame<'a> {
    bars: &'a [Bar],
    ema_short: Vec<f64>,
    ema_mid: Vec<f64>,
    ema_long: Vec<f64>,
    rsi: Vec<f64>,
    bb_upper: Vec<f64>,
    bb_mid: Vec<f64>,
    bb_lower: Vec<f64>,
    atr: Vec<f64>,
    struct_high: Vec<f64>,
    struct_low: Vec<f64>,
    vol_ma: Vec<f64>,
}

/// One frame row. `None` marks a field still inside its warmup window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorRow {
    pub bar: Bar,
    pub ema_short: Option<f64>,
    pub ema_mid: Option<f64>,
    pub ema_long: Option<f64>,
    pub rsi: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_lower: Option<f64>,
    pub atr: Option<f64>,
    pub struct_high: Option<f64>,
    pub struct_low: Option<f64>,
    pub vol_ma: Option<f64>,
}

/// Fully defined row for the bar under evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalRow {
    pub bar: Bar,
    pub ema_short: f64,
    pub ema_mid: f64,
    pub ema_long: f64,
    pub rsi: f64,
    pub bb_upper: f64,
    pub bb_mid: f64,
    pub bb_lower: f64,
    pub atr: f64,
    pub struct_high: f64,
    pub struct_low: f64,
    pub vol_ma: f64,
}

impl EvalRow {
    /// Height of the structural range.
    pub fn struct_range(&self) -> f64 {
        self.struct_high - self.struct_low
    }
}

/// The row before the evaluated bar. Only its OHLC and RSI are read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrevRow {
    pub bar: Bar,
    pub rsi: f64,
}

fn opt(v: f64) -> Option<f64> {
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}

impl<'a> IndicatorFrame<'a> {
    /// Derive every series for `bars`. Never fails: short input just leaves
    /// more of each series undefined.
    pub fn compute(bars: &'a [Bar], params: &IndicatorParams) -> Self {
        let bands = Bollinger::new(params.bb_len, params.bb_std).bands(bars);
        Self {
            bars,
            ema_short: Ema::new(params.ema_short).compute(bars),
            ema_mid: Ema::new(params.ema_mid).compute(bars),
            ema_long: Ema::new(params.ema_long).compute(bars),
            rsi: Rsi::new(params.rsi_len).compute(bars),
            bb_upper: bands.upper,
            bb_mid: bands.middle,
            bb_lower: bands.lower,
            atr: Atr::with_smoothing(params.atr_len, params.atr_smoothing).compute(bars),
            struct_high: RollingExtreme::high(params.struct_window).compute(bars),
            struct_low: RollingExtreme::low(params.struct_window).compute(bars),
            vol_ma: Sma::of_volume(params.vol_ma_len).compute(bars),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &'a [Bar] {
        self.bars
    }

    /// Row at `index`, or `None` past the end.
    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        let bar = *self.bars.get(index)?;
        Some(IndicatorRow {
            bar,
            ema_short: opt(self.ema_short[index]),
            ema_mid: opt(self.ema_mid[index]),
            ema_long: opt(self.ema_long[index]),
            rsi: opt(self.rsi[index]),
            bb_upper: opt(self.bb_upper[index]),
            bb_mid: opt(self.bb_mid[index]),
            bb_lower: opt(self.bb_lower[index]),
            atr: opt(self.atr[index]),
            struct_high: opt(self.struct_high[index]),
            struct_low: opt(self.struct_low[index]),
            vol_ma: opt(self.vol_ma[index]),
        })
    }

    /// Row at `index` with every field defined.
    pub fn eval_row(&self, index: usize) -> Result<EvalRow, EvalError> {
        let row = self.row(index).ok_or(EvalError::InsufficientHistory {
            required: index + 1,
            available: self.len(),
        })?;
        if row.bar.is_void() {
            return Err(EvalError::IncompleteRow {
                index,
                field: "bar",
            });
        }
        let need = |value: Option<f64>, field: &'static str| {
            value.ok_or(EvalError::IncompleteRow { index, field })
        };
        Ok(EvalRow {
            bar: row.bar,
            ema_short: need(row.ema_short, "ema_short")?,
            ema_mid: need(row.ema_mid, "ema_mid")?,
            ema_long: need(row.ema_long, "ema_long")?,
            rsi: need(row.rsi, "rsi")?,
            bb_upper: need(row.bb_upper, "bb_upper")?,
            bb_mid: need(row.bb_mid, "bb_mid")?,
            bb_lower: need(row.bb_lower, "bb_lower")?,
            atr: need(row.atr, "atr")?,
            struct_high: need(row.struct_high, "struct_high")?,
            struct_low: need(row.struct_low, "struct_low")?,
            vol_ma: need(row.vol_ma, "vol_ma")?,
        })
    }

    /// Row at `index` as the predecessor of the evaluated bar.
    pub fn prev_row(&self, index: usize) -> Result<PrevRow, EvalError> {
        let bar = *self.bars.get(index).ok_or(EvalError::InsufficientHistory {
            required: index + 1,
            available: self.len(),
        })?;
        let ohlc = [bar.open, bar.high, bar.low, bar.close];
        if ohlc.iter().any(|v| v.is_nan()) {
            return Err(EvalError::IncompleteRow {
                index,
                field: "bar",
            });
        }
        let rsi = opt(self.rsi[index]).ok_or(EvalError::IncompleteRow {
            index,
            field: "rsi",
        })?;
        Ok(PrevRow { bar, rsi })
    }

    /// Lowest low and highest high over the `lookback` bars preceding `index`
    /// (the bar at `index` itself is excluded).
    pub fn recent_extremes(&self, index: usize, lookback: usize) -> Result<(f64, f64), EvalError> {
        if lookback == 0 || index < lookback || index >= self.len() {
            return Err(EvalError::InsufficientHistory {
                required: lookback + 1,
                available: index.min(self.len()),
            });
        }
        let window = &self.bars[index - lookback..index];
        let mut low = f64::INFINITY;
        let mut high = f64::NEG_INFINITY;
        for bar in window {
            if bar.low.is_nan() || bar.high.is_nan() {
                return Err(EvalError::IncompleteRow {
                    index,
                    field: "recent_extremes",
                });
            }
            low = low.min(bar.low);
            high = high.max(bar.high);
        }
        Ok((low, high))
    }
}
