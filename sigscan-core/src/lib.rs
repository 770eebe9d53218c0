//! SigScan Core: technical signal scoring for a single instrument.
//!
//! This crate contains the evaluation engine:
//! - Domain types (bars, bar series, intervals)
//! - Indicator pipeline (EMA, RSI, Bollinger, ATR, rolling extremes, volume MA)
//! - Candlestick pattern detection and EMA-stack trend classification
//! - Six-check signal scorer with ATR/structure-based risk levels
//! - Engine parameters with TOML overrides and a content fingerprint
//!
//! Everything here is pure computation over an in-memory bar window. Fetching,
//! caching and presentation live in `sigscan-runner`.

pub mod domain;
pub mod engine;
pub mod error;
pub mod frame;
pub mod indicators;
pub mod params;
pub mod pattern;
pub mod risk;
pub mod scoring;
pub mod signal;
pub mod trend;

pub use engine::SignalEngine;
pub use error::EvalError;
pub use params::{EngineParams, ParamError};
pub use signal::SignalResult;
pub use trend::{Direction, TrendRegime};
