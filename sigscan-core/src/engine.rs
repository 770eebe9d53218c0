//! Signal engine: one pure evaluation per bar window.
//!
//! bars → indicator frame → (pattern, trend) → scorer → risk → result.
//!
//! Only the last two rows are read. The engine holds nothing but its
//! parameters, so one instance can be shared across threads and repeated
//! calls on the same bars return identical results.

use crate::domain::{Bar, BarSeries};
use crate::error::EvalError;
use crate::frame::IndicatorFrame;
use crate::params::{EngineParams, ParamError};
use crate::pattern::CandlePattern;
use crate::risk::RiskLevels;
use crate::scoring::{self, ScoreContext};
use crate::signal::SignalResult;
use crate::trend::TrendRegime;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SignalEngine {
    params: EngineParams,
    required: usize,
}

impl Default for SignalEngine {
    fn default() -> Self {
        let params = EngineParams::default();
        let required = params.required_history();
        Self { params, required }
    }
}

impl SignalEngine {
    /// Build an engine after validating `params`.
    pub fn new(params: EngineParams) -> Result<Self, ParamError> {
        params.validate()?;
        let required = params.required_history();
        Ok(Self { params, required })
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Bars needed before [`evaluate`](Self::evaluate) can succeed.
    pub fn required_history(&self) -> usize {
        self.required
    }

    /// Derive the full indicator frame for `bars`.
    pub fn frame<'a>(&self, bars: &'a [Bar]) -> IndicatorFrame<'a> {
        IndicatorFrame::compute(bars, &self.params.indicators)
    }

    /// Evaluate the newest bar of `bars` (oldest first).
    ///
    /// Fails with a not-ready error when the window is shorter than
    /// [`required_history`](Self::required_history) or any field read from
    /// the last two rows is undefined.
    pub fn evaluate(&self, bars: &[Bar]) -> Result<SignalResult, EvalError> {
        let n = bars.len();
        if n < self.required {
            return Err(EvalError::InsufficientHistory {
                required: self.required,
                available: n,
            });
        }

        let frame = self.frame(bars);
        let curr = frame.eval_row(n - 1)?;
        let prev = frame.prev_row(n - 2)?;
        let (recent_low, recent_high) =
            frame.recent_extremes(n - 1, self.params.scoring.sweep_lookback)?;

        let pattern = CandlePattern::detect(&curr.bar, &prev.bar, &self.params.pattern);
        let trend = TrendRegime::classify(curr.ema_short, curr.ema_mid, curr.ema_long);
        let direction = trend.direction();

        let ctx = ScoreContext {
            curr,
            prev,
            recent_low,
            recent_high,
            pattern,
        };
        let reasons = scoring::score(direction, &ctx, &self.params.scoring);
        let risk = RiskLevels::compute(direction, &curr, &self.params.risk);

        let result = SignalResult::assemble(
            &curr,
            trend,
            pattern,
            reasons,
            risk,
            self.params.scoring.actionable_score,
        );
        debug!(
            bars = n,
            trend = ?result.trend(),
            score = result.score(),
            price = result.price(),
            "evaluated"
        );
        Ok(result)
    }

    pub fn evaluate_series(&self, series: &BarSeries) -> Result<SignalResult, EvalError> {
        self.evaluate(series.as_slice()).map_err(|e| {
            debug!(symbol = %series.symbol, interval = %series.interval, error = %e, "not evaluated");
            e
        })
    }
}
