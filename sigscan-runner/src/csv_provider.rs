//! CSV bar files.
//!
//! Layout: `{dir}/{SYMBOL}_{interval}.csv`, slash stripped from the symbol
//! (`BTC/USD` at 15m → `BTCUSD_15m.csv`). Header:
//! `timestamp,open,high,low,close,volume`. Timestamps are RFC 3339 strings
//! or Unix epoch milliseconds.

use super::provider::{finish_series, BarProvider, DataError, DataSource, FetchResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sigscan_core::domain::{Bar, BarSeries, Interval};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Provider backed by a directory of CSV files.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `symbol` at `interval`.
    pub fn file_path(&self, symbol: &str, interval: Interval) -> PathBuf {
        let stem: String = symbol
            .trim()
            .chars()
            .filter(|c| *c != '/')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        self.dir.join(format!("{stem}_{interval}.csv"))
    }
}

impl BarProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<FetchResult, DataError> {
        let path = self.file_path(symbol, interval);
        if !path.exists() {
            return Err(DataError::NoDataFile {
                symbol: symbol.to_string(),
                path: path.display().to_string(),
            });
        }
        let bars = read_bars_csv(&path)?;
        debug!(symbol, path = %path.display(), bars = bars.len(), "csv load");
        let series = BarSeries::new(symbol, interval, bars);
        Ok(FetchResult {
            series: finish_series(series, limit)?,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}

/// Read every bar from one CSV file, sorted oldest first.
///
/// Rows with duplicate timestamps are rejected rather than merged.
pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;

    let mut bars = Vec::new();
    for (line, record) in reader.deserialize::<CsvRecord>().enumerate() {
        let record = record.map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| {
            DataError::Csv(format!(
                "{}: row {}: unrecognised timestamp {:?}",
                path.display(),
                line + 1,
                record.timestamp
            ))
        })?;
        bars.push(Bar {
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    if let Some(w) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(DataError::Csv(format!(
            "{}: duplicate timestamp {}",
            path.display(),
            w[0].timestamp.to_rfc3339()
        )));
    }
    Ok(bars)
}

/// RFC 3339 first, then integer epoch milliseconds.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}
