//! Signal result: the engine's single output record.

use crate::frame::EvalRow;
use crate::pattern::CandlePattern;
use crate::risk::RiskLevels;
use crate::scoring::Reason;
use crate::trend::{Direction, TrendRegime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one evaluation. Fields are read-only; a new evaluation builds
/// a new record.
///
/// Invariants, upheld by [`SignalResult::assemble`]:
/// - `direction` is derived from `trend`
/// - `score == reasons.len()`, and every reason's polarity equals `direction`
/// - a flat direction has score 0, no reasons and no risk levels
///
/// Deserialization checks the same invariants and rejects records that
/// break them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSignalResult")]
pub struct SignalResult {
    timestamp: DateTime<Utc>,
    price: f64,
    trend: TrendRegime,
    direction: Direction,
    score: u8,
    reasons: Vec<Reason>,
    risk: Option<RiskLevels>,
    rsi: f64,
    pattern: CandlePattern,
    actionable: bool,
}

/// Wire form of [`SignalResult`], before the invariants are checked.
#[derive(Deserialize)]
struct RawSignalResult {
    timestamp: DateTime<Utc>,
    price: f64,
    trend: TrendRegime,
    direction: Direction,
    score: u8,
    reasons: Vec<Reason>,
    risk: Option<RiskLevels>,
    rsi: f64,
    pattern: CandlePattern,
    actionable: bool,
}

impl TryFrom<RawSignalResult> for SignalResult {
    type Error = String;

    fn try_from(raw: RawSignalResult) -> Result<Self, Self::Error> {
        let expected = raw.trend.direction();
        if raw.direction != expected {
            return Err(format!(
                "direction {} does not match trend {} (expected {})",
                raw.direction.sign(),
                raw.trend.label(),
                expected.sign()
            ));
        }
        if usize::from(raw.score) != raw.reasons.len() {
            return Err(format!(
                "score {} does not match {} reasons",
                raw.score,
                raw.reasons.len()
            ));
        }
        if let Some(r) = raw.reasons.iter().find(|r| r.polarity != raw.direction) {
            return Err(format!(
                "reason {} has polarity {}, signal direction is {}",
                r.check.name(),
                r.polarity.sign(),
                raw.direction.sign()
            ));
        }
        if raw.direction.is_flat() {
            if raw.risk.is_some() {
                return Err("flat signal carries risk levels".to_string());
            }
            if raw.actionable {
                return Err("flat signal marked actionable".to_string());
            }
        }

        Ok(Self {
            timestamp: raw.timestamp,
            price: raw.price,
            trend: raw.trend,
            direction: raw.direction,
            score: raw.score,
            reasons: raw.reasons,
            risk: raw.risk,
            rsi: raw.rsi,
            pattern: raw.pattern,
            actionable: raw.actionable,
        })
    }
}

impl SignalResult {
    /// Compose a result from the outputs of the pipeline stages.
    ///
    /// Reasons and levels for a flat regime are discarded, so the invariants
    /// hold whatever the caller passes.
    pub fn assemble(
        curr: &EvalRow,
        trend: TrendRegime,
        pattern: CandlePattern,
        reasons: Vec<Reason>,
        risk: Option<RiskLevels>,
        actionable_score: u8,
    ) -> Self {
        let direction = trend.direction();
        let (reasons, risk) = if direction.is_flat() {
            (Vec::new(), None)
        } else {
            let reasons: Vec<Reason> = reasons
                .into_iter()
                .filter(|r| r.polarity == direction)
                .collect();
            (reasons, risk)
        };
        let score = reasons.len().min(u8::MAX as usize) as u8;

        Self {
            timestamp: curr.bar.timestamp,
            price: curr.bar.close,
            trend,
            direction,
            score,
            reasons,
            risk,
            rsi: curr.rsi,
            pattern,
            actionable: !direction.is_flat() && score >= actionable_score,
        }
    }

    /// Open time of the evaluated bar.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Close of the evaluated bar.
    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn trend(&self) -> TrendRegime {
        self.trend
    }

    pub fn trend_label(&self) -> &'static str {
        self.trend.label()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn reasons(&self) -> &[Reason] {
        &self.reasons
    }

    /// Stop and targets; `None` when the direction is flat.
    pub fn risk(&self) -> Option<&RiskLevels> {
        self.risk.as_ref()
    }

    pub fn rsi(&self) -> f64 {
        self.rsi
    }

    pub fn pattern(&self) -> CandlePattern {
        self.pattern
    }

    /// Directional and scoring at or above the configured threshold.
    pub fn is_actionable(&self) -> bool {
        self.actionable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::scoring::ScoreCheck;
    use chrono::TimeZone;
    use serde_json::json;

    fn curr() -> EvalRow {
        EvalRow {
            bar: Bar {
                timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
                open: 100.0,
                high: 104.0,
                low: 99.0,
                close: 103.0,
                volume: 10.0,
            },
            ema_short: 110.0,
            ema_mid: 100.0,
            ema_long: 90.0,
            rsi: 57.5,
            bb_upper: 105.0,
            bb_mid: 100.0,
            bb_lower: 95.0,
            atr: 2.0,
            struct_high: 150.0,
            struct_low: 90.0,
            vol_ma: 8.0,
        }
    }

    fn reason(polarity: Direction, check: ScoreCheck) -> Reason {
        Reason {
            polarity,
            check,
            description: check.name().to_string(),
        }
    }

    fn levels() -> Option<RiskLevels> {
        Some(RiskLevels {
            stop_loss: 95.0,
            take_profit_1: 150.0,
            take_profit_2: 187.08,
        })
    }

    #[test]
    fn assemble_echoes_price_and_rsi() {
        let r = SignalResult::assemble(
            &curr(),
            TrendRegime::Bull,
            CandlePattern::default(),
            vec![reason(Direction::Long, ScoreCheck::VolumeExpansion)],
            levels(),
            3,
        );
        assert_eq!(r.price(), 103.0);
        assert_eq!(r.rsi(), 57.5);
        assert_eq!(r.direction(), Direction::Long);
        assert_eq!(r.score(), 1);
        assert!(!r.is_actionable());
        assert!(r.risk().is_some());
        assert_eq!(r.trend_label(), "Bull trend");
    }

    #[test]
    fn range_discards_reasons_and_levels() {
        let r = SignalResult::assemble(
            &curr(),
            TrendRegime::Range,
            CandlePattern::default(),
            vec![reason(Direction::Long, ScoreCheck::VolumeExpansion)],
            levels(),
            0,
        );
        assert_eq!(r.score(), 0);
        assert!(r.reasons().is_empty());
        assert!(r.risk().is_none());
        assert!(!r.is_actionable());
    }

    #[test]
    fn actionable_at_threshold() {
        let reasons = vec![
            reason(Direction::Short, ScoreCheck::LiquiditySweep),
            reason(Direction::Short, ScoreCheck::RsiReversal),
            reason(Direction::Short, ScoreCheck::VolumeExpansion),
        ];
        let r = SignalResult::assemble(
            &curr(),
            TrendRegime::Bear,
            CandlePattern::default(),
            reasons,
            levels(),
            3,
        );
        assert_eq!(r.score(), 3);
        assert!(r.is_actionable());
    }

    #[test]
    fn json_shape() {
        let r = SignalResult::assemble(
            &curr(),
            TrendRegime::Bear,
            CandlePattern::default(),
            vec![reason(Direction::Short, ScoreCheck::RsiReversal)],
            levels(),
            3,
        );
        let v: serde_json::Value = serde_json::to_value(&r).unwrap();
        assert_eq!(v["direction"], -1);
        assert_eq!(v["trend"], "BEAR");
        assert_eq!(v["reasons"][0]["polarity"], -1);
        assert_eq!(v["reasons"][0]["check"], "rsi_reversal");
        let back: SignalResult = serde_json::from_value(v).unwrap();
        assert_eq!(back, r);
    }

    fn bear_json() -> serde_json::Value {
        let r = SignalResult::assemble(
            &curr(),
            TrendRegime::Bear,
            CandlePattern::default(),
            vec![reason(Direction::Short, ScoreCheck::RsiReversal)],
            levels(),
            3,
        );
        serde_json::to_value(&r).unwrap()
    }

    fn parse(v: serde_json::Value) -> Result<SignalResult, serde_json::Error> {
        serde_json::from_value(v)
    }

    #[test]
    fn rejects_range_with_direction_and_score() {
        let mut v = bear_json();
        v["trend"] = json!("RANGE");
        v["direction"] = json!(1);
        v["score"] = json!(5);
        v["reasons"] = json!([]);
        v["risk"] = serde_json::Value::Null;
        v["actionable"] = json!(true);
        let err = parse(v).unwrap_err();
        assert!(err.to_string().contains("does not match trend"), "{err}");
    }

    #[test]
    fn rejects_score_not_matching_reasons() {
        let mut v = bear_json();
        v["score"] = json!(4);
        let err = parse(v).unwrap_err();
        assert!(err.to_string().contains("score 4"), "{err}");
    }

    #[test]
    fn rejects_reason_against_direction() {
        let mut v = bear_json();
        v["reasons"][0]["polarity"] = json!(1);
        assert!(parse(v).is_err());
    }

    #[test]
    fn rejects_flat_with_levels_or_actionable() {
        let flat = SignalResult::assemble(
            &curr(),
            TrendRegime::Range,
            CandlePattern::default(),
            Vec::new(),
            None,
            3,
        );
        let v = serde_json::to_value(&flat).unwrap();
        assert_eq!(parse(v.clone()).unwrap(), flat);

        let mut with_risk = v.clone();
        with_risk["risk"] = serde_json::to_value(levels()).unwrap();
        assert!(parse(with_risk).is_err());

        let mut actionable = v;
        actionable["actionable"] = json!(true);
        assert!(parse(actionable).is_err());
    }
}
