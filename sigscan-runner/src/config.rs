//! Scan configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration:
//! Kraken, 15m bars, 200-bar windows, 10 s cache, 8 workers, and the eight
//! default coins.
//!
//! ```toml
//! provider = "synthetic"
//! interval = "1h"
//!
//! [[watchlist]]
//! name = "BTC"
//! symbol = "BTC/USD"
//!
//! [engine.scoring]
//! actionable_score = 4
//! ```

use serde::{Deserialize, Serialize};
use sigscan_core::domain::Interval;
use sigscan_core::{EngineParams, ParamError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid engine parameters: {0}")]
    Params(#[from] ParamError),

    #[error("{field} must be > 0")]
    Zero { field: &'static str },

    #[error("watchlist is empty")]
    EmptyWatchlist,

    #[error("duplicate watchlist name '{0}'")]
    DuplicateName(String),

    #[error("bar limit {limit} is below the {required} bars the engine needs")]
    LimitTooSmall { limit: usize, required: usize },

    #[error("provider 'csv' requires csv_dir")]
    MissingCsvDir,

    #[error("unknown provider '{0}' (expected kraken, csv or synthetic)")]
    UnknownProvider(String),
}

/// Which bar source the scanner uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Kraken,
    Csv,
    Synthetic,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderKind::Kraken => "kraken",
            ProviderKind::Csv => "csv",
            ProviderKind::Synthetic => "synthetic",
        })
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kraken" => Ok(ProviderKind::Kraken),
            "csv" => Ok(ProviderKind::Csv),
            "synthetic" => Ok(ProviderKind::Synthetic),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// One watchlist row: display name and provider symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub name: String,
    pub symbol: String,
}

impl WatchEntry {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

/// Default watchlist: eight majors and meme coins quoted in USD.
pub fn default_watchlist() -> Vec<WatchEntry> {
    ["BTC", "ETH", "SOL", "DOGE", "XRP", "ADA", "PEPE", "SHIB"]
        .into_iter()
        .map(|coin| WatchEntry::new(coin, format!("{coin}/USD")))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub provider: ProviderKind,
    pub interval: Interval,
    /// Bars requested per instrument.
    pub limit: usize,
    pub cache_ttl_secs: u64,
    /// Size of the scan thread pool.
    pub workers: usize,
    /// Directory for the csv provider.
    pub csv_dir: Option<PathBuf>,
    pub watchlist: Vec<WatchEntry>,
    pub engine: EngineParams,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            interval: Interval::M15,
            limit: 200,
            cache_ttl_secs: 10,
            workers: 8,
            csv_dir: None,
            watchlist: default_watchlist(),
            engine: EngineParams::default(),
        }
    }
}

impl ScanConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.workers == 0 {
            return Err(ConfigError::Zero { field: "workers" });
        }
        if self.limit == 0 {
            return Err(ConfigError::Zero { field: "limit" });
        }
        let required = self.engine.required_history();
        if self.limit < required {
            return Err(ConfigError::LimitTooSmall {
                limit: self.limit,
                required,
            });
        }
        if self.watchlist.is_empty() {
            return Err(ConfigError::EmptyWatchlist);
        }
        let mut seen = std::collections::HashSet::new();
        for entry in &self.watchlist {
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateName(entry.name.clone()));
            }
        }
        if self.provider == ProviderKind::Csv && self.csv_dir.is_none() {
            return Err(ConfigError::MissingCsvDir);
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_secs)
    }
}
