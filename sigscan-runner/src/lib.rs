//! SigScan Runner: bar sources, caching, and watchlist scans.
//!
//! This crate builds on `sigscan-core` to provide:
//! - Bar providers (Kraken REST, CSV files, deterministic synthetic walks)
//! - A circuit breaker shared by network fetches
//! - A TTL series cache keyed by (symbol, interval)
//! - TOML scan configuration
//! - A parallel watchlist scanner with per-instrument outcomes
//! - Text and JSON reports

pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod csv_provider;
pub mod kraken;
pub mod provider;
pub mod report;
pub mod scanner;
pub mod synthetic;

pub use cache::SeriesCache;
pub use circuit_breaker::CircuitBreaker;
pub use config::{default_watchlist, ConfigError, ProviderKind, ScanConfig, WatchEntry};
pub use csv_provider::{read_bars_csv, CsvProvider};
pub use kraken::KrakenProvider;
pub use provider::{BarProvider, DataError, DataSource, FetchResult};
pub use scanner::{build_provider, EntryStatus, ScanEntry, ScanError, ScanReport, Scanner};
pub use synthetic::SyntheticProvider;
