//! Simple Moving Average (SMA).
//!
//! Rolling mean over a trailing window, of close or of volume.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;
use crate::domain::Bar;

/// Which bar field the SMA averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmaSource {
    Close,
    Volume,
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    source: SmaSource,
    name: String,
}

impl Sma {
    /// SMA of close.
    pub fn new(period: usize) -> Self {
        Self::with_source(period, SmaSource::Close)
    }

    /// SMA of volume.
    pub fn of_volume(period: usize) -> Self {
        Self::with_source(period, SmaSource::Volume)
    }

    pub fn with_source(period: usize, source: SmaSource) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        let name = match source {
            SmaSource::Close => format!("sma_{period}"),
            SmaSource::Volume => format!("vol_sma_{period}"),
        };
        Self {
            period,
            source,
            name,
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let values: Vec<f64> = match self.source {
            SmaSource::Close => bars.iter().map(|b| b.close).collect(),
            SmaSource::Volume => bars.iter().map(|b| b.volume).collect(),
        };
        sma_of_series(&values, self.period)
    }
}

/// Rolling mean of an arbitrary series.
///
/// Any NaN inside a window makes that window's output NaN; once the NaN
/// leaves the window, output resumes.
///
/// The running sum is rebuilt from the window whenever a leaving value
/// outweighs what remains, so a spike leaving the window cannot leave
/// rounding residue behind.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    // Running sum over finite values plus a count of NaNs in the window,
    // so a NaN never poisons the sum after it leaves.
    let mut sum = 0.0;
    let mut nan_count = 0usize;

    for i in 0..n {
        let entering = values[i];
        if entering.is_nan() {
            nan_count += 1;
        } else {
            sum += entering;
        }

        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
                if leaving.abs() > sum.abs() {
                    sum = window_sum(&values[i + 1 - period..=i]);
                }
            }
        }

        if i + 1 >= period && nan_count == 0 {
            result[i] = sum / period as f64;
        }
    }

    result
}

/// Sum of the finite values in a window.
fn window_sum(window: &[f64]) -> f64 {
    window.iter().filter(|v| !v.is_nan()).sum()
}
