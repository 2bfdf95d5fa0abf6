//! Common utilities for all binaries
//!
//! Shared initialization, CLI parsing, and fill replay.

use anyhow::{bail, Context, Result};
use clap::Parser;
use ledger_core::engine::{PnlSummary, PositionManager};
use ledger_core::{AccountingConfig, CostBasisMethod, ExecutionReport, FillError, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

/// Common CLI arguments for all binaries
#[derive(Parser, Debug)]
pub struct CommonArgs {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl CommonArgs {
    /// Load the configuration file, then apply CLI overrides
    pub fn load_config(&self) -> Result<AccountingConfig> {
        let mut config = match &self.config {
            Some(path) => AccountingConfig::load(path)?,
            None => AccountingConfig::default(),
        };

        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if self.json_logs {
            config.json_logs = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Initialize tracing/logging
pub fn init_logging(config: &AccountingConfig) -> Result<()> {
    ledger_core::utils::init_from_config(config)
}

/// Parse a cost basis method argument
pub fn parse_method(s: &str) -> Result<CostBasisMethod, String> {
    CostBasisMethod::from_str(s)
}

/// Parse a `SYMBOL=PRICE` mark argument
pub fn parse_mark(s: &str) -> Result<(String, Decimal), String> {
    let (symbol, price) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=PRICE, got '{}'", s))?;

    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(format!("missing symbol in '{}'", s));
    }

    let price = Decimal::from_str(price.trim())
        .map_err(|e| format!("invalid price in '{}': {}", s, e))?;
    if price <= Decimal::ZERO {
        return Err(format!("price must be positive in '{}'", s));
    }

    Ok((symbol.to_string(), price))
}

/// One line of a replay file: the fill side plus the execution report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillRecord {
    pub side: Side,
    #[serde(flatten)]
    pub report: ExecutionReport,
}

/// Counters from one replay run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub records: u64,
    pub applied: u64,
    /// Reports without an execution (acks, cancels)
    pub skipped: u64,
    pub rejected: u64,
}

/// Apply every fill record read from `reader` in file order
///
/// Returns the counters and the last fill price seen per symbol. Rejected
/// fills are logged and skipped, or abort the replay when `strict` is set.
/// Malformed lines always abort.
pub fn replay_fills<R: BufRead>(
    reader: R,
    manager: &mut PositionManager,
    strict: bool,
) -> Result<(ReplayStats, HashMap<String, Decimal>)> {
    let mut stats = ReplayStats::default();
    let mut last_prices = HashMap::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: FillRecord = serde_json::from_str(&line)
            .with_context(|| format!("Malformed fill record on line {}", line_no))?;
        stats.records += 1;

        if !record.report.has_fill() {
            debug!(
                "Line {}: {:?} report for {} carries no fill, skipping",
                line_no, record.report.status, record.report.symbol
            );
            stats.skipped += 1;
            continue;
        }

        match manager.apply_execution_report(&record.report, record.side) {
            Ok(_) => {
                stats.applied += 1;
                last_prices.insert(
                    record.report.symbol.clone(),
                    record.report.last_fill_price,
                );
            }
            Err(e) => {
                stats.rejected += 1;
                warn!(
                    "Line {}: rejected {} fill for {} (client order {}): {}",
                    line_no, record.side, record.report.symbol, record.report.client_order_id, e
                );
                if strict {
                    return Err(reject_error(e, line_no));
                }
            }
        }
    }

    Ok((stats, last_prices))
}

fn reject_error(err: FillError, line_no: usize) -> anyhow::Error {
    anyhow::Error::new(err).context(format!("Replay stopped at line {}", line_no))
}

/// Log final replay statistics
pub fn print_stats(stats: &ReplayStats, summary: &PnlSummary) {
    tracing::info!("=== Replay Summary ===");
    tracing::info!("Records read: {}", stats.records);
    tracing::info!("Fills applied: {}", stats.applied);
    tracing::info!("Reports skipped: {}", stats.skipped);
    tracing::info!("Fills rejected: {}", stats.rejected);
    tracing::info!("Open positions: {}", summary.open_positions);
    tracing::info!("Realized PnL: {}", summary.realized_pnl);
    tracing::info!("Unrealized PnL: {}", summary.unrealized_pnl);
    tracing::info!("Total PnL: {}", summary.total_pnl);

    if !summary.unpriced_symbols.is_empty() {
        tracing::warn!("No mark price for: {}", summary.unpriced_symbols.join(", "));
    }
}

/// Fail if the replay produced nothing to report
pub fn ensure_records(stats: &ReplayStats) -> Result<()> {
    if stats.records == 0 {
        bail!("No fill records found in input");
    }
    Ok(())
}
