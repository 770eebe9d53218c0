//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! The first bar has no previous close, so its true range is undefined.
//! ATR smooths the true range either with a simple rolling mean (default)
//! or with Wilder smoothing (alpha = 1/period).
//! Lookback: period.

use super::sma::sma_of_series;
use super::Indicator;
use crate::domain::Bar;
use serde::{Deserialize, Serialize};

/// How the true range series is averaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtrSmoothing {
    /// Rolling arithmetic mean of the last `period` true ranges.
    #[default]
    Simple,
    /// Wilder's recursive smoothing, seeded with the mean of the first `period` values.
    Wilder,
}

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    smoothing: AtrSmoothing,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self::with_smoothing(period, AtrSmoothing::Simple)
    }

    pub fn with_smoothing(period: usize, smoothing: AtrSmoothing) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            smoothing,
            name: format!("atr_{period}"),
        }
    }
}

/// True Range series. `tr[0]` is NaN (no previous close).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; bars.len()];
    for (i, pair) in bars.windows(2).enumerate() {
        let (prev, curr) = (&pair[0], &pair[1]);
        let pc = prev.close;
        // NaN operands propagate through f64::max only when both sides are NaN,
        // so guard explicitly.
        if curr.high.is_nan() || curr.low.is_nan() || pc.is_nan() {
            continue;
        }
        tr[i + 1] = (curr.high - curr.low)
            .max((curr.high - pc).abs())
            .max((curr.low - pc).abs());
    }
    tr
}

/// Wilder smoothing seeded at the first run of `period` consecutive finite values.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let mut run = 0usize;
    let mut seed_end = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            run = 0;
        } else {
            run += 1;
            if run == period {
                seed_end = Some(i + 1);
                break;
            }
        }
    }
    let Some(seed_end) = seed_end else {
        return result;
    };

    let mut prev = values[seed_end - period..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = prev;

    let alpha = 1.0 / period as f64;
    for (i, &v) in values.iter().enumerate().skip(seed_end) {
        if v.is_nan() {
            break;
        }
        prev = alpha * v + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let tr = true_range(bars);
        match self.smoothing {
            AtrSmoothing::Simple => sma_of_series(&tr, self.period),
            AtrSmoothing::Wilder => wilder_smooth(&tr, self.period),
        }
    }
}
