//! BarSeries: ordered bars for one instrument and one interval.

use super::{Bar, Interval};
use serde::{Deserialize, Serialize};

/// Bars for a single symbol at a single interval, oldest first.
///
/// Ordering is the supplier's responsibility; the engine does not re-sort
/// or check for gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: String,
    pub interval: Interval,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, interval: Interval, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    /// Keep only the newest `n` bars.
    pub fn truncate_front(&mut self, n: usize) {
        if self.bars.len() > n {
            let drop = self.bars.len() - n;
            self.bars.drain(..drop);
        }
    }

    /// True when timestamps are strictly increasing.
    pub fn is_ordered(&self) -> bool {
        self.bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn truncate_front_keeps_newest() {
        let mut series = BarSeries::new("BTC/USD", Interval::M15, make_bars(&[1.0, 2.0, 3.0, 4.0]));
        series.truncate_front(2);
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars[0].close, 3.0);
        assert_eq!(series.last().unwrap().close, 4.0);
    }

    #[test]
    fn truncate_front_noop_when_short() {
        let mut series = BarSeries::new("BTC/USD", Interval::M15, make_bars(&[1.0, 2.0]));
        series.truncate_front(10);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn ordering_check() {
        let mut series = BarSeries::new("ETH/USD", Interval::H1, make_bars(&[1.0, 2.0, 3.0]));
        assert!(series.is_ordered());
        series.bars.swap(0, 2);
        assert!(!series.is_ordered());
    }
}
