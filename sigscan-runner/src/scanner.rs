//! Watchlist scanner.
//!
//! One fetch + evaluate job per watchlist entry, run on a private rayon
//! pool sized by `workers`. Failures stay per-instrument: a symbol that
//! cannot be fetched or lacks history becomes an `Unavailable` entry and the
//! rest of the scan carries on. Entries come back in watchlist order.

use crate::cache::SeriesCache;
use crate::circuit_breaker::CircuitBreaker;
use crate::config::{ConfigError, ProviderKind, ScanConfig, WatchEntry};
use crate::csv_provider::CsvProvider;
use crate::kraken::KrakenProvider;
use crate::provider::{BarProvider, DataError, DataSource};
use crate::synthetic::SyntheticProvider;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sigscan_core::domain::Interval;
use sigscan_core::{ParamError, SignalEngine, SignalResult};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid engine parameters: {0}")]
    Params(#[from] ParamError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("failed to build scan thread pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Display classification of one scanned instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Directional with score at or above the actionable threshold.
    Actionable,
    /// Range regime.
    Neutral,
    /// Directional but below the threshold.
    Weak,
    /// Fetch failed or not enough data to evaluate.
    Unavailable,
}

impl EntryStatus {
    pub fn of(signal: &SignalResult) -> Self {
        if signal.is_actionable() {
            EntryStatus::Actionable
        } else if signal.direction().is_flat() {
            EntryStatus::Neutral
        } else {
            EntryStatus::Weak
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryStatus::Actionable => "ACTIONABLE",
            EntryStatus::Neutral => "NEUTRAL",
            EntryStatus::Weak => "WEAK",
            EntryStatus::Unavailable => "N/A",
        }
    }
}

/// Outcome for one watchlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub name: String,
    pub symbol: String,
    pub status: EntryStatus,
    pub source: Option<DataSource>,
    /// Bars the evaluation saw.
    pub bars: usize,
    pub signal: Option<SignalResult>,
    pub error: Option<String>,
}

impl ScanEntry {
    fn unavailable(entry: &WatchEntry, source: Option<DataSource>, bars: usize, error: String) -> Self {
        Self {
            name: entry.name.clone(),
            symbol: entry.symbol.clone(),
            status: EntryStatus::Unavailable,
            source,
            bars,
            signal: None,
            error: Some(error),
        }
    }
}

/// One complete pass over the watchlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub interval: Interval,
    pub provider: String,
    /// Fingerprint of the engine parameters that scored this report.
    pub params_fingerprint: String,
    pub entries: Vec<ScanEntry>,
}

impl ScanReport {
    /// Look up an entry by display name or symbol, ignoring case.
    pub fn entry(&self, key: &str) -> Option<&ScanEntry> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(key) || e.symbol.eq_ignore_ascii_case(key))
    }

    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    pub fn actionable(&self) -> impl Iterator<Item = &ScanEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::Actionable)
    }
}

/// Build the provider a configuration selects.
pub fn build_provider(config: &ScanConfig) -> Result<Box<dyn BarProvider>, ScanError> {
    let provider: Box<dyn BarProvider> = match config.provider {
        ProviderKind::Kraken => Box::new(KrakenProvider::new(Arc::new(
            CircuitBreaker::default_provider(),
        ))?),
        ProviderKind::Csv => {
            let dir = config.csv_dir.clone().ok_or(ConfigError::MissingCsvDir)?;
            Box::new(CsvProvider::new(dir))
        }
        ProviderKind::Synthetic => Box::new(SyntheticProvider::new()),
    };
    Ok(provider)
}

/// Scans a watchlist with one engine, one provider and one shared cache.
pub struct Scanner {
    engine: SignalEngine,
    provider: Box<dyn BarProvider>,
    cache: SeriesCache,
    pool: rayon::ThreadPool,
    interval: Interval,
    limit: usize,
    watchlist: Vec<WatchEntry>,
}

impl Scanner {
    /// Build a scanner with the provider the configuration names.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        let provider = build_provider(config)?;
        Self::with_provider(config, provider)
    }

    /// Build a scanner around an explicit provider.
    pub fn with_provider(
        config: &ScanConfig,
        provider: Box<dyn BarProvider>,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        let engine = SignalEngine::new(config.engine.clone())?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("sigscan-worker-{i}"))
            .build()?;
        Ok(Self {
            engine,
            provider,
            cache: SeriesCache::new(config.cache_ttl()),
            pool,
            interval: config.interval,
            limit: config.limit,
            watchlist: config.watchlist.clone(),
        })
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Switch timeframe. Cached series are keyed by interval and stay valid.
    pub fn set_interval(&mut self, interval: Interval) {
        self.interval = interval;
    }

    pub fn watchlist(&self) -> &[WatchEntry] {
        &self.watchlist
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    /// Scan every watchlist entry, reusing fresh cached series.
    pub fn scan(&self) -> ScanReport {
        let started = Instant::now();
        if !self.provider.is_available() {
            warn!(provider = self.provider.name(), "provider reports unavailable");
        }

        // par_iter + collect keeps input order
        let entries: Vec<ScanEntry> = self.pool.install(|| {
            self.watchlist
                .par_iter()
                .map(|entry| self.scan_one(entry))
                .collect()
        });

        let report = ScanReport {
            generated_at: Utc::now(),
            interval: self.interval,
            provider: self.provider.name().to_string(),
            params_fingerprint: self.engine.params().fingerprint(),
            entries,
        };
        info!(
            interval = %self.interval,
            instruments = report.entries.len(),
            actionable = report.count(EntryStatus::Actionable),
            unavailable = report.count(EntryStatus::Unavailable),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scan complete"
        );
        report
    }

    /// Drop cached series and scan again.
    pub fn refresh(&self) -> ScanReport {
        self.cache.invalidate_all();
        self.scan()
    }

    fn scan_one(&self, entry: &WatchEntry) -> ScanEntry {
        let fetched = match self.cache.get_or_fetch(
            self.provider.as_ref(),
            &entry.symbol,
            self.interval,
            self.limit,
        ) {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(symbol = %entry.symbol, error = %e, "fetch failed");
                return ScanEntry::unavailable(entry, None, 0, e.to_string());
            }
        };

        let bars = fetched.series.len();
        match self.engine.evaluate_series(&fetched.series) {
            Ok(signal) => ScanEntry {
                name: entry.name.clone(),
                symbol: entry.symbol.clone(),
                status: EntryStatus::of(&signal),
                source: Some(fetched.source),
                bars,
                signal: Some(signal),
                error: None,
            },
            Err(e) => {
                warn!(symbol = %entry.symbol, error = %e, "not evaluated");
                ScanEntry::unavailable(entry, Some(fetched.source), bars, e.to_string())
            }
        }
    }
}
