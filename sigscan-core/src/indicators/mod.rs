//! Indicator implementations.
//!
//! Indicators are pure functions: bar history in, numeric series out, same
//! length as the input. Values before the warmup window are `f64::NAN`.
//!
//! # Look-ahead guard
//! No value at bar t may depend on bars after t. Every indicator must give
//! identical output for the overlapping prefix of a truncated and a full series.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod extreme;
pub mod rsi;
pub mod sma;

pub use atr::{Atr, AtrSmoothing};
pub use bollinger::{Bollinger, BollingerBands};
pub use ema::Ema;
pub use extreme::{Extreme, RollingExtreme};
pub use rsi::Rsi;
pub use sma::{Sma, SmaSource};

use crate::domain::Bar;

/// Trait for single-series indicators.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_20", "atr_14").
    fn name(&self) -> &str;

    /// Index of the first bar that can hold a valid value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`, with the first
    /// `lookback()` values set to `f64::NAN`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Close prices as a flat series.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Create synthetic bars from close prices for testing.
///
/// open = previous close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: test_timestamp(i),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Create bars from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: test_timestamp(i),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

#[cfg(test)]
fn test_timestamp(i: usize) -> chrono::DateTime<chrono::Utc> {
    use chrono::TimeZone;
    chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
        + chrono::Duration::minutes(15 * i as i64)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
