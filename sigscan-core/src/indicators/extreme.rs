//! Rolling extremes: highest high / lowest low over a trailing window.
//!
//! The window includes the current bar. With the default 100-bar window this
//! is the structural range used for Fibonacci levels and targets.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;
use std::collections::VecDeque;

/// Which extreme to track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    /// Rolling max of `high`.
    High,
    /// Rolling min of `low`.
    Low,
}

#[derive(Debug, Clone)]
pub struct RollingExtreme {
    period: usize,
    extreme: Extreme,
    name: String,
}

impl RollingExtreme {
    pub fn high(period: usize) -> Self {
        Self::new(period, Extreme::High)
    }

    pub fn low(period: usize) -> Self {
        Self::new(period, Extreme::Low)
    }

    fn new(period: usize, extreme: Extreme) -> Self {
        assert!(period >= 1, "rolling extreme period must be >= 1");
        let name = match extreme {
            Extreme::High => format!("highest_high_{period}"),
            Extreme::Low => format!("lowest_low_{period}"),
        };
        Self {
            period,
            extreme,
            name,
        }
    }
}

impl Indicator for RollingExtreme {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let values: Vec<f64> = match self.extreme {
            Extreme::High => bars.iter().map(|b| b.high).collect(),
            Extreme::Low => bars.iter().map(|b| b.low).collect(),
        };
        match self.extreme {
            Extreme::High => rolling_max(&values, self.period),
            Extreme::Low => rolling_min(&values, self.period),
        }
    }
}

/// Trailing rolling maximum. NaN inside a window yields NaN.
pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling_by(values, period, |candidate, held| candidate >= held)
}

/// Trailing rolling minimum. NaN inside a window yields NaN.
pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling_by(values, period, |candidate, held| candidate <= held)
}

/// Monotonic-deque sliding window. `dominates(a, b)` is true when `a` makes
/// `b` irrelevant for every later window.
fn rolling_by(values: &[f64], period: usize, dominates: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let mut deque: VecDeque<usize> = VecDeque::with_capacity(period);
    let mut last_nan: Option<usize> = None;

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            last_nan = Some(i);
        } else {
            while let Some(&back) = deque.back() {
                if dominates(v, values[back]) {
                    deque.pop_back();
                } else {
                    break;
                }
            }
            deque.push_back(i);
        }

        while let Some(&front) = deque.front() {
            if front + period <= i {
                deque.pop_front();
            } else {
                break;
            }
        }

        if i + 1 < period {
            continue;
        }
        let window_start = i + 1 - period;
        if last_nan.is_some_and(|j| j >= window_start) {
            continue;
        }
        if let Some(&front) = deque.front() {
            result[i] = values[front];
        }
    }

    result
}
