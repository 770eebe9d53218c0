//! Engine parameters: every window, threshold and multiplier the engine uses.
//!
//! All sections deserialize with defaults, so a partial TOML table overrides
//! only what it names:
//!
//! ```toml
//! [indicators]
//! ema_long = 100
//!
//! [scoring]
//! fib_levels = [0.5, 0.618]
//! actionable_score = 4
//! ```

use crate::indicators::AtrSmoothing;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid parameter combination.
#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("{name} must be >= 1 (got {value})")]
    ZeroWindow { name: &'static str, value: usize },

    #[error("{name} must be positive (got {value})")]
    NonPositive { name: &'static str, value: f64 },

    #[error("EMA windows must satisfy short < mid < long (got {short}/{mid}/{long})")]
    EmaOrdering { short: usize, mid: usize, long: usize },

    #[error("RSI thresholds must lie in [0, 100] (got bull={bull}, bear={bear})")]
    RsiThreshold { bull: f64, bear: f64 },

    #[error("at least one Fibonacci retracement level is required")]
    NoFibLevels,

    #[error("Fibonacci level {0} outside (0, 1)")]
    FibLevelOutOfRange(f64),

    #[error("actionable score {value} exceeds the number of checks ({max})")]
    ActionableScore { value: u8, max: u8 },

    #[error("pin-bar wick ratio must lie in (0, 1) (got {0})")]
    WickRatio(f64),

    #[error("failed to parse parameters: {0}")]
    Parse(String),
}

/// Indicator windows and band width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub ema_short: usize,
    pub ema_mid: usize,
    pub ema_long: usize,
    pub rsi_len: usize,
    pub bb_len: usize,
    pub bb_std: f64,
    pub atr_len: usize,
    pub atr_smoothing: AtrSmoothing,
    /// Window of the structural high/low range.
    pub struct_window: usize,
    pub vol_ma_len: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_short: 20,
            ema_mid: 50,
            ema_long: 200,
            rsi_len: 14,
            bb_len: 20,
            bb_std: 2.0,
            atr_len: 14,
            atr_smoothing: AtrSmoothing::Simple,
            struct_window: 100,
            vol_ma_len: 20,
        }
    }
}

/// Candlestick classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternParams {
    /// A wick longer than this fraction of the bar range marks a pin bar.
    pub pin_wick_ratio: f64,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            pin_wick_ratio: 0.6,
        }
    }
}

/// Thresholds of the six scoring checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    /// Bars before the current one that define the recent high/low for the sweep check.
    pub sweep_lookback: usize,
    /// Bull regime: RSI must cross up through this level.
    pub rsi_bull_threshold: f64,
    /// Bear regime: RSI must cross down through this level.
    pub rsi_bear_threshold: f64,
    pub volume_multiplier: f64,
    /// Retracement ratios measured down from the structural high.
    pub fib_levels: Vec<f64>,
    /// Maximum relative distance between price and a retracement level.
    pub fib_tolerance: f64,
    /// Minimum score for a signal to count as actionable.
    pub actionable_score: u8,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            sweep_lookback: 9,
            rsi_bull_threshold: 40.0,
            rsi_bear_threshold: 60.0,
            volume_multiplier: 1.2,
            fib_levels: FibPolicy::Golden.levels(),
            fib_tolerance: 0.005,
            actionable_score: 3,
        }
    }
}

/// Named retracement level sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FibPolicy {
    /// {0.618}
    Golden,
    /// {0.5, 0.618}
    HalfAndGolden,
}

impl FibPolicy {
    pub fn levels(self) -> Vec<f64> {
        match self {
            FibPolicy::Golden => vec![0.618],
            FibPolicy::HalfAndGolden => vec![0.5, 0.618],
        }
    }
}

/// Stop and target placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParams {
    /// Stop distance beyond the current bar's extreme, in ATRs.
    pub stop_atr_multiple: f64,
    /// Second target extends beyond the structural range by this fraction of it.
    pub extension_ratio: f64,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            stop_atr_multiple: 2.0,
            extension_ratio: 0.618,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub indicators: IndicatorParams,
    pub pattern: PatternParams,
    pub scoring: ScoringParams,
    pub risk: RiskParams,
}

/// Number of independent scoring checks.
pub const CHECK_COUNT: u8 = 6;

impl EngineParams {
    /// Defaults with a named Fibonacci level set.
    pub fn with_fib_policy(policy: FibPolicy) -> Self {
        let mut params = Self::default();
        params.scoring.fib_levels = policy.levels();
        params
    }

    /// Reject combinations the engine cannot evaluate meaningfully.
    pub fn validate(&self) -> Result<(), ParamError> {
        let ind = &self.indicators;
        for (name, value) in [
            ("ema_short", ind.ema_short),
            ("ema_mid", ind.ema_mid),
            ("ema_long", ind.ema_long),
            ("rsi_len", ind.rsi_len),
            ("bb_len", ind.bb_len),
            ("atr_len", ind.atr_len),
            ("struct_window", ind.struct_window),
            ("vol_ma_len", ind.vol_ma_len),
            ("sweep_lookback", self.scoring.sweep_lookback),
        ] {
            if value == 0 {
                return Err(ParamError::ZeroWindow { name, value });
            }
        }

        if !(ind.ema_short < ind.ema_mid && ind.ema_mid < ind.ema_long) {
            return Err(ParamError::EmaOrdering {
                short: ind.ema_short,
                mid: ind.ema_mid,
                long: ind.ema_long,
            });
        }

        for (name, value) in [
            ("bb_std", ind.bb_std),
            ("volume_multiplier", self.scoring.volume_multiplier),
            ("fib_tolerance", self.scoring.fib_tolerance),
            ("stop_atr_multiple", self.risk.stop_atr_multiple),
            ("extension_ratio", self.risk.extension_ratio),
        ] {
            if !(value > 0.0) {
                return Err(ParamError::NonPositive { name, value });
            }
        }

        let s = &self.scoring;
        let in_pct = |v: f64| (0.0..=100.0).contains(&v);
        if !in_pct(s.rsi_bull_threshold) || !in_pct(s.rsi_bear_threshold) {
            return Err(ParamError::RsiThreshold {
                bull: s.rsi_bull_threshold,
                bear: s.rsi_bear_threshold,
            });
        }

        if s.fib_levels.is_empty() {
            return Err(ParamError::NoFibLevels);
        }
        if let Some(&bad) = s.fib_levels.iter().find(|&&l| !(l > 0.0 && l < 1.0)) {
            return Err(ParamError::FibLevelOutOfRange(bad));
        }

        if s.actionable_score > CHECK_COUNT {
            return Err(ParamError::ActionableScore {
                value: s.actionable_score,
                max: CHECK_COUNT,
            });
        }

        let ratio = self.pattern.pin_wick_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ParamError::WickRatio(ratio));
        }

        Ok(())
    }

    /// Minimum series length for the last two rows to carry every field the
    /// engine reads.
    ///
    /// `curr` needs every indicator; `prev` only needs RSI (the scorer compares
    /// `prev.close` against `curr`'s midline). With defaults this is 200,
    /// governed by the long EMA.
    pub fn required_history(&self) -> usize {
        let ind = &self.indicators;
        [
            ind.ema_short,
            ind.ema_mid,
            ind.ema_long,
            ind.bb_len,
            ind.struct_window,
            ind.vol_ma_len,
            // ATR's first value sits at index atr_len
            ind.atr_len + 1,
            // prev.rsi at index n-2 needs n-2 >= rsi_len
            ind.rsi_len + 2,
            // sweep window precedes the current bar
            self.scoring.sweep_lookback + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(2)
        .max(2)
    }

    /// Parse from TOML; missing keys take defaults. Does not validate.
    pub fn from_toml_str(s: &str) -> Result<Self, ParamError> {
        toml::from_str(s).map_err(|e| ParamError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ParamError> {
        toml::to_string_pretty(self).map_err(|e| ParamError::Parse(e.to_string()))
    }

    /// Content hash of the parameter set (BLAKE3 over canonical JSON).
    ///
    /// Two reports with the same fingerprint were produced by the same rule set.
    pub fn fingerprint(&self) -> String {
        // Struct fields serialize in declaration order, so the JSON is canonical.
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let p = EngineParams::default();
        assert_eq!(
            (p.indicators.ema_short, p.indicators.ema_mid, p.indicators.ema_long),
            (20, 50, 200)
        );
        assert_eq!(p.indicators.rsi_len, 14);
        assert_eq!((p.indicators.bb_len, p.indicators.bb_std), (20, 2.0));
        assert_eq!(p.indicators.atr_len, 14);
        assert_eq!(p.indicators.struct_window, 100);
        assert_eq!(p.indicators.vol_ma_len, 20);
        assert_eq!(p.scoring.rsi_bull_threshold, 40.0);
        assert_eq!(p.scoring.rsi_bear_threshold, 60.0);
        assert_eq!(p.scoring.volume_multiplier, 1.2);
        assert_eq!(p.scoring.fib_levels, vec![0.618]);
        assert_eq!(p.scoring.fib_tolerance, 0.005);
        assert_eq!(p.scoring.actionable_score, 3);
        assert_eq!(p.pattern.pin_wick_ratio, 0.6);
        assert_eq!(p.risk.stop_atr_multiple, 2.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn required_history_defaults_to_long_ema() {
        assert_eq!(EngineParams::default().required_history(), 200);
    }

    #[test]
    fn required_history_tracks_largest_window() {
        let mut p = EngineParams::default();
        p.indicators.ema_long = 60;
        p.indicators.struct_window = 120;
        assert_eq!(p.required_history(), 120);
        p.indicators.struct_window = 10;
        p.indicators.rsi_len = 70;
        assert_eq!(p.required_history(), 72);
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let p = EngineParams::from_toml_str(
            r#"
            [indicators]
            ema_long = 150

            [scoring]
            fib_levels = [0.5, 0.618]
            "#,
        )
        .unwrap();
        assert_eq!(p.indicators.ema_long, 150);
        assert_eq!(p.indicators.ema_short, 20);
        assert_eq!(p.scoring.fib_levels, FibPolicy::HalfAndGolden.levels());
        assert_eq!(p.scoring.actionable_score, 3);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(EngineParams::from_toml_str("").unwrap(), EngineParams::default());
    }

    #[test]
    fn toml_roundtrip() {
        let p = EngineParams::with_fib_policy(FibPolicy::HalfAndGolden);
        let text = p.to_toml_string().unwrap();
        assert_eq!(EngineParams::from_toml_str(&text).unwrap(), p);
    }

    #[test]
    fn rejects_bad_params() {
        let mut p = EngineParams::default();
        p.indicators.rsi_len = 0;
        assert_eq!(
            p.validate(),
            Err(ParamError::ZeroWindow {
                name: "rsi_len",
                value: 0
            })
        );

        let mut p = EngineParams::default();
        p.indicators.ema_mid = 300;
        assert!(matches!(p.validate(), Err(ParamError::EmaOrdering { .. })));

        let mut p = EngineParams::default();
        p.scoring.fib_levels.clear();
        assert_eq!(p.validate(), Err(ParamError::NoFibLevels));

        let mut p = EngineParams::default();
        p.scoring.fib_levels = vec![1.618];
        assert_eq!(p.validate(), Err(ParamError::FibLevelOutOfRange(1.618)));

        let mut p = EngineParams::default();
        p.scoring.actionable_score = 7;
        assert!(matches!(p.validate(), Err(ParamError::ActionableScore { .. })));

        let mut p = EngineParams::default();
        p.scoring.volume_multiplier = f64::NAN;
        assert!(matches!(p.validate(), Err(ParamError::NonPositive { .. })));
    }

    #[test]
    fn fingerprint_changes_with_params() {
        let a = EngineParams::default();
        let b = EngineParams::with_fib_policy(FibPolicy::HalfAndGolden);
        assert_eq!(a.fingerprint(), EngineParams::default().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }
}
