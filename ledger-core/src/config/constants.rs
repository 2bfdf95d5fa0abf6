//! Compile-time defaults for position accounting
//!
//! These can be switched via Cargo features at build time. Runtime values in
//! [`AccountingConfig`](super::AccountingConfig) fall back to them.

use crate::core::CostBasisMethod;

// ===== COST BASIS =====

/// Cost basis for positions created without an explicit method
/// Default: weighted-average
#[cfg(not(feature = "fifo-default"))]
pub const DEFAULT_COST_BASIS_METHOD: CostBasisMethod = CostBasisMethod::WeightedAverage;
#[cfg(feature = "fifo-default")]
pub const DEFAULT_COST_BASIS_METHOD: CostBasisMethod = CostBasisMethod::Fifo;

/// Decimal places kept for averaged entry prices
/// Realized PnL booked against a bounded-scale average stays exact, so the
/// running total always equals the sum of per-fill amounts. Prices quoted at
/// a finer scale keep their own scale.
pub const AVG_PRICE_DECIMALS: u32 = 12;

// ===== UPDATE FAN-OUT =====

/// Buffered position updates per subscriber channel
/// Default: 4096 updates (absorbs fill bursts without blocking the writer)
#[cfg(not(feature = "update-channel-16k"))]
pub const DEFAULT_UPDATE_CHANNEL_CAPACITY: usize = 4096;
#[cfg(feature = "update-channel-16k")]
pub const DEFAULT_UPDATE_CHANNEL_CAPACITY: usize = 16_384;

// ===== LOGGING =====

/// Default tracing filter when RUST_LOG is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Accepted values for the `log_level` setting
pub const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
