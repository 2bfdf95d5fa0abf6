//! Fill Replay
//!
//! Replays a JSON-lines file of execution reports through a fresh
//! PositionManager and prints the resulting positions:
//! - one snapshot per symbol as a JSON line on stdout
//! - a final PnL summary JSON line
//!
//! Positions are marked at `--mark SYMBOL=PRICE` values, falling back to the
//! last fill price seen for each symbol.

use anyhow::{Context, Result};
use clap::Parser;
use ledger_bins::common::{
    ensure_records, init_logging, parse_mark, parse_method, print_stats, replay_fills,
    CommonArgs,
};
use ledger_core::engine::PositionManager;
use ledger_core::CostBasisMethod;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct ReplayArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// JSON-lines file of fill records
    #[arg(short, long)]
    input: PathBuf,

    /// Cost basis method for every position (overrides the configuration file)
    #[arg(short, long, value_parser = parse_method)]
    method: Option<CostBasisMethod>,

    /// Mark price for a symbol, repeatable
    #[arg(long = "mark", value_name = "SYMBOL=PRICE", value_parser = parse_mark)]
    marks: Vec<(String, Decimal)>,

    /// Abort on the first rejected fill instead of skipping it
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = ReplayArgs::parse();

    let mut config = args.common.load_config()?;
    if let Some(method) = args.method {
        config.default_cost_basis_method = method;
    }

    // Initialize logging
    init_logging(&config)?;

    tracing::info!("=== Ledger: Fill Replay ===");
    tracing::info!("Input: {}", args.input.display());

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let mut manager = PositionManager::with_config(&config);
    let (stats, mut prices) = replay_fills(BufReader::new(file), &mut manager, args.strict)?;
    ensure_records(&stats)?;

    // Explicit marks win over last fill prices
    prices.extend(args.marks);

    for snapshot in manager.snapshots(&prices) {
        println!("{}", serde_json::to_string(&snapshot)?);
    }

    let summary = manager.pnl_summary(&prices);
    println!("{}", serde_json::to_string(&summary)?);

    print_stats(&stats, &summary);

    Ok(())
}
