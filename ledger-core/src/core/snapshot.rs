//! Immutable point-in-time view of a position
//!
//! Snapshots own all of their data and hold no reference back to the live
//! [`Position`](super::Position), so they can cross thread boundaries and be
//! serialized for reporting.

use super::types::{CostBasisMethod, PositionSide};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Position state marked at a caller-supplied price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub size: Decimal,
    pub avg_price: Decimal,
    pub side: PositionSide,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub notional_value: Decimal,
    /// Price the unrealized PnL and notional were computed at
    pub mark_price: Decimal,
    pub cost_basis_method: CostBasisMethod,
    pub lot_count: usize,
    pub trade_count: u64,
}

impl PositionSnapshot {
    pub fn total_pnl(&self) -> Decimal {
        self.realized_pnl.saturating_add(self.unrealized_pnl)
    }

    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::Flat
    }
}
