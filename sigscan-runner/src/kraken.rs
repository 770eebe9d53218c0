//! Kraken public OHLC provider.
//!
//! Fetches bars from `GET /0/public/OHLC?pair=XBTUSD&interval=15`. No API key
//! is needed. Handles rate limiting, retries with exponential backoff,
//! response parsing, and the circuit breaker.
//!
//! Kraken reports errors inside a 200 response (`{"error": ["EQuery:Unknown
//! asset pair"], "result": {}}`), so the error array is checked before the
//! payload. Rows are `[time, open, high, low, close, vwap, volume, count]`
//! with prices and volume encoded as strings. The newest row is the bar
//! still forming; it is kept.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{
    finish_series, split_symbol, BarProvider, DataError, DataSource, FetchResult,
};
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use sigscan_core::domain::{Bar, BarSeries, Interval};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.kraken.com";

/// Longest server-requested wait a fetch will sleep through before giving up.
const DEFAULT_MAX_RETRY_WAIT: Duration = Duration::from_secs(30);

/// Raw Kraken response envelope.
#[derive(Debug, Deserialize)]
struct OhlcResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: Option<BTreeMap<String, Value>>,
}

/// Kraken public-market-data provider.
pub struct KrakenProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
    max_retry_wait: Duration,
}

impl KrakenProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("sigscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_retry_wait: DEFAULT_MAX_RETRY_WAIT,
        })
    }

    /// Point the provider at another host (a mirror or a local test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Cap on a `Retry-After` wait. A rate limit asking for longer fails the
    /// fetch instead of blocking the worker.
    pub fn with_max_retry_wait(mut self, max_retry_wait: Duration) -> Self {
        self.max_retry_wait = max_retry_wait;
        self
    }

    /// Delay before retry `attempt` (1-based) given the previous failure.
    ///
    /// Exponential backoff, stretched to the server's requested wait after a
    /// rate limit. `None` when that wait exceeds `max_retry_wait`.
    fn retry_delay(&self, attempt: u32, last_error: Option<&DataError>) -> Option<Duration> {
        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        match last_error {
            Some(DataError::RateLimited { retry_after_secs }) => {
                let wait = Duration::from_secs(*retry_after_secs);
                (wait <= self.max_retry_wait).then(|| backoff.max(wait))
            }
            _ => Some(backoff),
        }
    }

    /// Map `BTC/USD` to Kraken's pair name `XBTUSD`.
    pub fn pair_name(symbol: &str) -> Result<String, DataError> {
        let (base, quote) = split_symbol(symbol)?;
        let base = base.to_ascii_uppercase();
        let quote = quote.to_ascii_uppercase();
        let base = match base.as_str() {
            "BTC" => "XBT",
            "DOGE" => "XDG",
            other => other,
        };
        let quote = if quote == "BTC" { "XBT" } else { quote.as_str() };
        Ok(format!("{base}{quote}"))
    }

    fn ohlc_url(&self, pair: &str, interval: Interval) -> String {
        format!(
            "{}/0/public/OHLC?pair={pair}&interval={}",
            self.base_url,
            interval.minutes()
        )
    }

    /// Parse a decoded response body into a series.
    fn parse_response(
        symbol: &str,
        interval: Interval,
        resp: OhlcResponse,
    ) -> Result<BarSeries, DataError> {
        if let Some(err) = resp.error.first() {
            return Err(classify_api_error(symbol, err));
        }

        let result = resp
            .result
            .ok_or_else(|| DataError::ResponseFormatChanged("missing result object".into()))?;

        // The result holds one pair key (Kraken's canonical name) plus "last".
        let rows = result
            .into_iter()
            .find(|(k, _)| k != "last")
            .map(|(_, v)| v)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;

        let rows = match rows {
            Value::Array(rows) => rows,
            other => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "expected row array, got {other}"
                )))
            }
        };

        let bars = rows
            .iter()
            .map(parse_row)
            .collect::<Result<Vec<_>, _>>()?;

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(BarSeries::new(symbol, interval, bars))
    }

    /// Execute the request with retry and circuit breaker logic.
    fn fetch_with_retry(&self, symbol: &str, interval: Interval) -> Result<BarSeries, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let pair = Self::pair_name(symbol)?;
        let url = self.ohlc_url(&pair, interval);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let Some(delay) = self.retry_delay(attempt, last_error.as_ref()) else {
                    warn!(symbol, error = ?last_error, "rate limit wait too long, giving up");
                    break;
                };
                debug!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        // IP ban: stop every worker immediately
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let body: OhlcResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    match Self::parse_response(symbol, interval, body) {
                        Ok(series) => {
                            self.circuit_breaker.record_success();
                            return Ok(series);
                        }
                        Err(e @ DataError::RateLimited { .. }) => {
                            self.circuit_breaker.record_failure();
                            last_error = Some(e);
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        warn!(symbol, error = %e, "kraken request failed");
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl BarProvider for KrakenProvider {
    fn name(&self) -> &str {
        "kraken"
    }

    fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<FetchResult, DataError> {
        let series = self.fetch_with_retry(symbol, interval)?;
        debug!(symbol, %interval, bars = series.len(), "kraken fetch ok");
        Ok(FetchResult {
            series: finish_series(series, limit)?,
            source: DataSource::Kraken,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

fn classify_api_error(symbol: &str, err: &str) -> DataError {
    if err.contains("Unknown asset pair") {
        DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        }
    } else if err.contains("Rate limit") || err.contains("Too many requests") {
        DataError::RateLimited {
            retry_after_secs: 5,
        }
    } else {
        DataError::Other(format!("kraken: {err}"))
    }
}

fn parse_row(row: &Value) -> Result<Bar, DataError> {
    let fields = row
        .as_array()
        .filter(|f| f.len() >= 7)
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("malformed OHLC row: {row}")))?;

    let secs = fields[0]
        .as_i64()
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("bad timestamp: {}", fields[0])))?;
    let timestamp = DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {secs}")))?;

    Ok(Bar {
        timestamp,
        open: number(&fields[1])?,
        high: number(&fields[2])?,
        low: number(&fields[3])?,
        close: number(&fields[4])?,
        // fields[5] is the VWAP
        volume: number(&fields[6])?,
    })
}

/// Kraken sends decimals as strings; accept bare numbers too.
fn number(v: &Value) -> Result<f64, DataError> {
    match v {
        Value::String(s) => s
            .parse()
            .map_err(|_| DataError::ResponseFormatChanged(format!("not a number: {s:?}"))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("not a number: {n}"))),
        other => Err(DataError::ResponseFormatChanged(format!(
            "not a number: {other}"
        ))),
    }
}
