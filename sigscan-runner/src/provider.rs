//! Bar provider trait and structured error types.
//!
//! The BarProvider trait abstracts over bar sources (Kraken REST, CSV files,
//! synthetic walks) so the scanner can swap implementations by configuration
//! and tests can run offline. The series cache sits above this trait;
//! providers don't know about it.

use serde::{Deserialize, Serialize};
use sigscan_core::domain::{BarSeries, Interval};
use thiserror::Error;

/// Structured error types for data operations.
///
/// Displayable as-is in a terminal report.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("interval {interval} not supported by {provider}")]
    UnsupportedInterval { provider: String, interval: Interval },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("no data file for '{symbol}' at {path}")]
    NoDataFile { symbol: String, path: String },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Kraken,
    CsvImport,
    Synthetic,
    Cache,
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub series: BarSeries,
    pub source: DataSource,
}

/// Trait for bar providers.
///
/// `fetch` returns at most `limit` bars, oldest first, ending at the newest
/// bar the source has.
pub trait BarProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn fetch(&self, symbol: &str, interval: Interval, limit: usize)
        -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

/// Split a `BASE/QUOTE` symbol. A bare symbol is treated as quoted in USD.
pub fn split_symbol(symbol: &str) -> Result<(&str, &str), DataError> {
    let symbol = symbol.trim();
    match symbol.split_once('/') {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() => Ok((base, quote)),
        Some(_) => Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        }),
        None if !symbol.is_empty() => Ok((symbol, "USD")),
        None => Err(DataError::SymbolNotFound {
            symbol: String::new(),
        }),
    }
}

/// Keep the newest `limit` bars and reject series whose bars are not sane.
pub(crate) fn finish_series(mut series: BarSeries, limit: usize) -> Result<BarSeries, DataError> {
    series.truncate_front(limit);
    if !series.is_ordered() {
        return Err(DataError::ValidationError(format!(
            "{}: timestamps are not strictly increasing",
            series.symbol
        )));
    }
    if let Some((i, _)) = series
        .bars
        .iter()
        .enumerate()
        .find(|(_, b)| !b.is_void() && !b.is_sane())
    {
        return Err(DataError::ValidationError(format!(
            "{}: bar {i} has inconsistent OHLC values",
            series.symbol
        )));
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_symbol_pairs() {
        assert_eq!(split_symbol("BTC/USD").unwrap(), ("BTC", "USD"));
        assert_eq!(split_symbol(" eth/eur ").unwrap(), ("eth", "eur"));
        assert_eq!(split_symbol("SOL").unwrap(), ("SOL", "USD"));
        assert!(split_symbol("/USD").is_err());
        assert!(split_symbol("").is_err());
    }

    #[test]
    fn error_messages_are_displayable() {
        let e = DataError::UnsupportedInterval {
            provider: "kraken".into(),
            interval: Interval::M15,
        };
        assert_eq!(e.to_string(), "interval 15m not supported by kraken");
        assert!(DataError::CircuitBreakerTripped.to_string().contains("circuit breaker"));
    }
}
