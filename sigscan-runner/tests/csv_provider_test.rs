//! Integration tests for CSV bar files.
//!
//! Files are written into a temp directory, then read back through the
//! provider, the cache and a full scan.

use chrono::{TimeZone, Utc};
use sigscan_core::domain::Interval;
use sigscan_runner::{
    BarProvider, CsvProvider, DataError, DataSource, EntryStatus, ProviderKind, ScanConfig,
    Scanner, SeriesCache, WatchEntry,
};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

/// Write `n` 15m bars on a gentle uptrend, newest last.
fn write_series(dir: &Path, file: &str, n: usize, epoch_ms: bool) {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let mut text = String::from("timestamp,open,high,low,close,volume\n");
    for i in 0..n {
        let ts = start + chrono::Duration::minutes(15 * i as i64);
        let close = 100.0 + i as f64 * 0.5;
        let open = close - 0.25;
        let stamp = if epoch_ms {
            ts.timestamp_millis().to_string()
        } else {
            ts.to_rfc3339()
        };
        writeln!(
            text,
            "{stamp},{open},{},{},{close},{}",
            close + 0.5,
            open - 0.5,
            1000 + i
        )
        .unwrap();
    }
    std::fs::write(dir.join(file), text).unwrap();
}

#[test]
fn reads_rfc3339_file() {
    let dir = tempfile::tempdir().unwrap();
    write_series(dir.path(), "BTCUSD_15m.csv", 50, false);

    let provider = CsvProvider::new(dir.path());
    assert!(provider.is_available());
    let result = provider.fetch("BTC/USD", Interval::M15, 200).unwrap();
    assert_eq!(result.source, DataSource::CsvImport);
    assert_eq!(result.series.symbol, "BTC/USD");
    assert_eq!(result.series.len(), 50);
    assert_eq!(result.series.bars[0].close, 100.0);
    assert!(result.series.is_ordered());
}

#[test]
fn reads_epoch_millis_and_keeps_newest() {
    let dir = tempfile::tempdir().unwrap();
    write_series(dir.path(), "ETHUSD_15m.csv", 60, true);

    let provider = CsvProvider::new(dir.path());
    let result = provider.fetch("ETH/USD", Interval::M15, 20).unwrap();
    assert_eq!(result.series.len(), 20);
    // last 20 of 60 bars: closes 100 + 40*0.5 .. 100 + 59*0.5
    assert_eq!(result.series.bars[0].close, 120.0);
    assert_eq!(result.series.last().unwrap().close, 129.5);
}

#[test]
fn unsorted_rows_are_sorted() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("SOLUSD_1h.csv"),
        "timestamp,open,high,low,close,volume\n\
         2024-01-01T02:00:00Z,3,4,2,3.5,10\n\
         2024-01-01T00:00:00Z,1,2,0.5,1.5,10\n\
         2024-01-01T01:00:00Z,2,3,1.5,2.5,10\n",
    )
    .unwrap();
    let result = CsvProvider::new(dir.path())
        .fetch("SOL/USD", Interval::H1, 10)
        .unwrap();
    let closes: Vec<f64> = result.series.bars.iter().map(|b| b.close).collect();
    assert_eq!(closes, vec![1.5, 2.5, 3.5]);
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = CsvProvider::new(dir.path())
        .fetch("DOGE/USD", Interval::M15, 200)
        .unwrap_err();
    assert!(matches!(err, DataError::NoDataFile { ref symbol, .. } if symbol == "DOGE/USD"));
}

#[test]
fn bad_rows_are_csv_errors() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("ADAUSD_15m.csv"),
        "timestamp,open,high,low,close,volume\nyesterday,1,2,0.5,1.5,10\n",
    )
    .unwrap();
    let err = CsvProvider::new(dir.path())
        .fetch("ADA/USD", Interval::M15, 200)
        .unwrap_err();
    assert!(matches!(err, DataError::Csv(_)));

    std::fs::write(
        dir.path().join("XRPUSD_15m.csv"),
        "timestamp,open,high,low,close,volume\n\
         2024-01-01T00:00:00Z,1,2,0.5,1.5,10\n\
         2024-01-01T00:00:00Z,1,2,0.5,1.5,10\n",
    )
    .unwrap();
    let err = CsvProvider::new(dir.path())
        .fetch("XRP/USD", Interval::M15, 200)
        .unwrap_err();
    assert!(matches!(err, DataError::Csv(ref m) if m.contains("duplicate")));
}

#[test]
fn inconsistent_bar_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("PEPEUSD_15m.csv"),
        "timestamp,open,high,low,close,volume\n2024-01-01T00:00:00Z,1,0.5,2,1.5,10\n",
    )
    .unwrap();
    let err = CsvProvider::new(dir.path())
        .fetch("PEPE/USD", Interval::M15, 200)
        .unwrap_err();
    assert!(matches!(err, DataError::ValidationError(_)));
}

#[test]
fn cache_serves_second_read_after_file_removed() {
    let dir = tempfile::tempdir().unwrap();
    write_series(dir.path(), "BTCUSD_15m.csv", 30, false);
    let provider = CsvProvider::new(dir.path());
    let cache = SeriesCache::new(Duration::from_secs(60));

    let first = cache.get_or_fetch(&provider, "BTC/USD", Interval::M15, 30).unwrap();
    std::fs::remove_file(dir.path().join("BTCUSD_15m.csv")).unwrap();
    let second = cache.get_or_fetch(&provider, "BTC/USD", Interval::M15, 30).unwrap();
    assert_eq!(second.source, DataSource::Cache);
    assert_eq!(first.series, second.series);

    cache.invalidate_all();
    assert!(cache.get_or_fetch(&provider, "BTC/USD", Interval::M15, 30).is_err());
}

#[test]
fn scan_over_csv_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_series(dir.path(), "BTCUSD_15m.csv", 240, false);
    write_series(dir.path(), "ETHUSD_15m.csv", 120, false);

    let config = ScanConfig {
        provider: ProviderKind::Csv,
        csv_dir: Some(dir.path().to_path_buf()),
        workers: 2,
        watchlist: vec![
            WatchEntry::new("BTC", "BTC/USD"),
            WatchEntry::new("ETH", "ETH/USD"),
            WatchEntry::new("SOL", "SOL/USD"),
        ],
        ..ScanConfig::default()
    };
    let scanner = Scanner::from_config(&config).unwrap();
    let report = scanner.scan();

    assert_eq!(report.provider, "csv");
    let names: Vec<&str> = report.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["BTC", "ETH", "SOL"]);

    // A steady ramp stacks the EMAs bullishly.
    let btc = &report.entries[0];
    assert_ne!(btc.status, EntryStatus::Unavailable);
    assert_eq!(btc.bars, 200);
    let signal = btc.signal.as_ref().unwrap();
    assert_eq!(signal.price(), 100.0 + 239.0 * 0.5);
    assert_eq!(signal.trend(), sigscan_core::TrendRegime::Bull);

    // 120 bars is short of the 200-bar history.
    let eth = &report.entries[1];
    assert_eq!(eth.status, EntryStatus::Unavailable);
    assert_eq!(eth.bars, 120);
    assert!(eth.error.as_deref().unwrap().contains("200"));

    let sol = &report.entries[2];
    assert_eq!(sol.status, EntryStatus::Unavailable);
    assert!(sol.signal.is_none());
}
