//! Domain types for SigScan

pub mod bar;
pub mod interval;
pub mod series;

pub use bar::Bar;
pub use interval::{Interval, ParseIntervalError};
pub use series::BarSeries;

/// Symbol type alias
pub type Symbol = String;
