//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and average losses on close-to-close changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → 100; avg_gain == 0 → 0; both zero → 50.

use super::{closes, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rsi_of_series(&closes(bars), self.period)
    }
}

/// Wilder RSI of an arbitrary series.
pub fn rsi_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    // changes[i] = values[i+1] - values[i]; NaN if either side is NaN
    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    // Seed: simple average gain/loss over the first `period` changes
    let seed = &changes[..period];
    if seed.iter().any(|c| c.is_nan()) {
        return result;
    }
    let mut avg_gain = seed.iter().filter(|&&c| c > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss = -seed.iter().filter(|&&c| c < 0.0).sum::<f64>() / period as f64;
    result[period] = rsi_value(avg_gain, avg_loss);

    let alpha = 1.0 / period as f64;
    for (offset, &change) in changes.iter().enumerate().skip(period) {
        if change.is_nan() {
            break;
        }
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        result[offset + 1] = rsi_value(avg_gain, avg_loss);
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains() {
        let result = Rsi::new(3).compute(&make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]));
        assert_approx(result[3], 100.0, 1e-9);
        assert_approx(result[5], 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses() {
        let result = Rsi::new(3).compute(&make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]));
        assert_approx(result[3], 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_is_neutral() {
        let result = rsi_of_series(&[100.0; 6], 3);
        assert_approx(result[3], 50.0, 1e-9);
        assert_approx(result[5], 50.0, 1e-9);
    }

    #[test]
    fn rsi_known_seed_and_smoothing() {
        // Changes: +0.34, -0.25, -0.48, +0.72
        // Seed (period 3): avg_gain = 0.34/3, avg_loss = 0.73/3
        // RSI[3] = 100 - 100 / (1 + 0.34/0.73)
        // Then: avg_gain = (1/3)*0.72 + (2/3)*(0.34/3), avg_loss = (2/3)*(0.73/3)
        let result = rsi_of_series(&[44.0, 44.34, 44.09, 43.61, 44.33], 3);
        assert!(result[..3].iter().all(|v| v.is_nan()));
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);

        let g = 0.72 / 3.0 + (2.0 / 3.0) * (0.34 / 3.0);
        let l = (2.0 / 3.0) * (0.73 / 3.0);
        assert_approx(result[4], 100.0 - 100.0 / (1.0 + g / l), 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let result = rsi_of_series(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0], 3);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_nan_in_seed_produces_all_nan() {
        let result = rsi_of_series(&[100.0, 101.0, f64::NAN, 103.0, 104.0], 3);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
