//! In-memory series cache with a time-to-live.
//!
//! Keyed by (symbol, interval). Workers share one cache; the lock is held
//! only for map access, never across a fetch, so two workers asking for the
//! same cold key may both fetch it. The later insert wins.

use super::provider::{BarProvider, DataError, DataSource, FetchResult};
use sigscan_core::domain::{BarSeries, Interval};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    series: BarSeries,
    fetched_at: Instant,
    limit: usize,
}

/// Get-or-fetch cache in front of a [`BarProvider`].
#[derive(Debug)]
pub struct SeriesCache {
    ttl: Duration,
    entries: Mutex<HashMap<(String, Interval), CacheEntry>>,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(String, Interval), CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return a fresh cached series or fetch through `provider`.
    ///
    /// An entry is fresh when younger than the TTL and fetched with a limit
    /// at least as large as the one requested. Cached hits report
    /// [`DataSource::Cache`]. Failed fetches are not cached.
    pub fn get_or_fetch(
        &self,
        provider: &dyn BarProvider,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<FetchResult, DataError> {
        let key = (symbol.to_string(), interval);

        if let Some(entry) = self.lock().get(&key) {
            if entry.fetched_at.elapsed() < self.ttl && entry.limit >= limit {
                debug!(symbol, %interval, "cache hit");
                let mut series = entry.series.clone();
                series.truncate_front(limit);
                return Ok(FetchResult {
                    series,
                    source: DataSource::Cache,
                });
            }
        }

        debug!(symbol, %interval, provider = provider.name(), "cache miss");
        let fetched = provider.fetch(symbol, interval, limit)?;
        self.lock().insert(
            key,
            CacheEntry {
                series: fetched.series.clone(),
                fetched_at: Instant::now(),
                limit,
            },
        );
        Ok(fetched)
    }

    /// Drop every entry (manual refresh).
    pub fn invalidate_all(&self) {
        self.lock().clear();
    }

    pub fn invalidate(&self, symbol: &str, interval: Interval) {
        self.lock().remove(&(symbol.to_string(), interval));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
