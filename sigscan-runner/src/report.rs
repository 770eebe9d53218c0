//! Text and JSON rendering of scan results.

use crate::scanner::{EntryStatus, ScanEntry, ScanReport};
use anyhow::{Context, Result};
use sigscan_core::params::CHECK_COUNT;
use sigscan_core::{Direction, SignalResult};
use std::path::Path;

/// Format a price with precision scaled to its magnitude.
///
/// Below 0.0001: 8 decimals. Below 10: 4 decimals. Otherwise 2 decimals
/// with thousands separators. Zero and non-finite values print `$0.00`.
pub fn format_price(price: f64) -> String {
    if !price.is_finite() || price == 0.0 {
        return "$0.00".to_string();
    }
    let sign = if price < 0.0 { "-" } else { "" };
    let abs = price.abs();
    if abs < 0.0001 {
        format!("{sign}${abs:.8}")
    } else if abs < 10.0 {
        format!("{sign}${abs:.4}")
    } else {
        let fixed = format!("{abs:.2}");
        let (int_part, frac) = fixed.split_at(fixed.len() - 3);
        format!("{sign}${}{frac}", group_thousands(int_part))
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn side(direction: Direction) -> &'static str {
    match direction {
        Direction::Long => "LONG",
        Direction::Short => "SHORT",
        Direction::Flat => "FLAT",
    }
}

/// One-line verdict for a signal.
pub fn verdict(signal: &SignalResult) -> String {
    if signal.is_actionable() {
        format!("Signal (Score {}) - {}", signal.score(), side(signal.direction()))
    } else {
        format!("Conditions not met (Score {}/{CHECK_COUNT})", signal.score())
    }
}

/// One summary row: name, price, status, verdict.
pub fn summary_line(entry: &ScanEntry) -> String {
    match (&entry.signal, entry.status) {
        (Some(signal), status) => format!(
            "{:<6} {:>16}  {:<10}  {:<16}  {}",
            entry.name,
            format_price(signal.price()),
            status.label(),
            signal.trend_label(),
            verdict(signal)
        ),
        (None, _) => format!(
            "{:<6} {:>16}  {:<10}  {}",
            entry.name,
            "-",
            EntryStatus::Unavailable.label(),
            entry.error.as_deref().unwrap_or("no data")
        ),
    }
}

/// Header, one line per instrument, and a count footer.
pub fn summary(report: &ScanReport) -> String {
    let mut out = format!(
        "Scan {} via {} at {} (params {})\n",
        report.interval,
        report.provider,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.params_fingerprint
    );
    for entry in &report.entries {
        out.push_str(&summary_line(entry));
        out.push('\n');
    }
    out.push_str(&format!(
        "{} actionable, {} weak, {} neutral, {} unavailable\n",
        report.count(EntryStatus::Actionable),
        report.count(EntryStatus::Weak),
        report.count(EntryStatus::Neutral),
        report.count(EntryStatus::Unavailable),
    ));
    out
}

/// Full breakdown of one evaluated signal.
pub fn signal_detail(title: &str, signal: &SignalResult) -> String {
    let mut out = format!("{title}\n");
    out.push_str(&format!("  Bar:      {}\n", signal.timestamp().to_rfc3339()));
    out.push_str(&format!("  Price:    {}\n", format_price(signal.price())));
    out.push_str(&format!("  Trend:    {}\n", signal.trend_label()));
    out.push_str(&format!("  Verdict:  {}\n", verdict(signal)));
    out.push_str(&format!("  RSI:      {:.1}\n", signal.rsi()));

    let pattern = signal.pattern();
    let mut shapes = Vec::new();
    if pattern.pin_bull {
        shapes.push("bullish pin");
    }
    if pattern.pin_bear {
        shapes.push("bearish pin");
    }
    if pattern.engulf_bull {
        shapes.push("bullish engulfing");
    }
    if pattern.engulf_bear {
        shapes.push("bearish engulfing");
    }
    if !shapes.is_empty() {
        out.push_str(&format!("  Pattern:  {}\n", shapes.join(", ")));
    }

    if signal.reasons().is_empty() {
        out.push_str("  No conditions triggered\n");
    } else {
        out.push_str("  Reasons:\n");
        for reason in signal.reasons() {
            out.push_str(&format!("    - {}\n", reason.description));
        }
    }

    if let Some(risk) = signal.risk() {
        out.push_str(&format!("  Stop:     {}\n", format_price(risk.stop_loss)));
        out.push_str(&format!("  Target 1: {}\n", format_price(risk.take_profit_1)));
        out.push_str(&format!("  Target 2: {}\n", format_price(risk.take_profit_2)));
        if let Some(rr) = risk.reward_risk(signal.price()) {
            out.push_str(&format!("  R:R (T1): {rr:.2}\n"));
        }
    }
    out
}

/// Detail block for one scan entry.
pub fn detail(entry: &ScanEntry) -> String {
    let title = format!("{} ({})", entry.name, entry.symbol);
    match &entry.signal {
        Some(signal) => signal_detail(&title, signal),
        None => format!(
            "{title}\n  Data unavailable: {}\n",
            entry.error.as_deref().unwrap_or("no data")
        ),
    }
}

pub fn to_json(report: &ScanReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize scan report")
}

/// Write the report as pretty JSON.
pub fn write_json(path: &Path, report: &ScanReport) -> Result<()> {
    let json = to_json(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write scan report to {}", path.display()))?;
    Ok(())
}
