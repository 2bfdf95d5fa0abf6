//! Per-symbol position and cost-basis accounting
//!
//! A [`Position`] owns a queue of [`Lot`]s and derives everything else from it:
//!
//! ```text
//! Opening / adding fill          Closing fill
//! ─────────────────────          ────────────
//! FIFO:   push lot to back       consume lots from front
//! W-Avg:  merge into one lot     consume from the single lot
//! ```
//!
//! Weighted-average is the degenerate ledger with at most one synthetic lot
//! re-priced on every add, so realized PnL is computed by one routine for both
//! methods.
//!
//! ## Invariants (hold after every call)
//!
//! - `size == 0` ⇔ `side() == Flat`, `size > 0` ⇔ `Long`, `size < 0` ⇔ `Short`
//! - `|size| == Σ lot.quantity` and `lots.is_empty()` ⇔ `size == 0`
//! - `avg_price == 0` whenever `size == 0`
//! - `realized_pnl` only moves on fills against the current side
//!
//! ## Closing more than is open
//!
//! A closing fill larger than `|size|` is rejected whole with
//! [`FillError::InsufficientPosition`]. Flip-through-zero must be sent as two
//! fills: one that flattens, one that opens the other side.

use super::errors::{CostBasisError, FillError};
use super::lot::{average_price, Lot};
use super::snapshot::PositionSnapshot;
use super::types::{CostBasisMethod, PositionSide, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::info;

/// Result of a successfully applied fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FillOutcome {
    /// Quantity that opened or added to the position
    pub opened_qty: Decimal,
    /// Quantity that closed existing exposure
    pub closed_qty: Decimal,
    /// Realized PnL booked by this fill alone
    pub realized_pnl: Decimal,
}

impl FillOutcome {
    /// Whether this fill reduced the position
    pub fn is_closing(&self) -> bool {
        self.closed_qty > Decimal::ZERO
    }
}

/// Net holding in one symbol with its cost-basis ledger
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    symbol: String,

    /// Signed quantity: positive = long, negative = short
    size: Decimal,

    /// Size-weighted entry price of the open lots (zero when flat)
    avg_price: Decimal,

    cost_basis_method: CostBasisMethod,

    /// Oldest first
    lots: VecDeque<Lot>,

    realized_pnl: Decimal,

    /// Number of fills applied
    trade_count: u64,
}

impl Position {
    /// Create a flat position
    pub fn new(symbol: impl Into<String>, cost_basis_method: CostBasisMethod) -> Self {
        Self {
            symbol: symbol.into(),
            size: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            cost_basis_method,
            lots: VecDeque::new(),
            realized_pnl: Decimal::ZERO,
            trade_count: 0,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Signed size (positive = long, negative = short)
    #[inline(always)]
    pub fn size(&self) -> Decimal {
        self.size
    }

    /// Average entry price of the open quantity, zero when flat
    #[inline(always)]
    pub fn avg_price(&self) -> Decimal {
        self.avg_price
    }

    #[inline(always)]
    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    pub fn cost_basis_method(&self) -> CostBasisMethod {
        self.cost_basis_method
    }

    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }

    /// Open lots, oldest first
    pub fn lots(&self) -> &VecDeque<Lot> {
        &self.lots
    }

    /// Number of open lots
    ///
    /// Under weighted-average this is 0 when flat and 1 otherwise.
    pub fn lot_count(&self) -> usize {
        self.lots.len()
    }

    #[inline]
    pub fn side(&self) -> PositionSide {
        if self.size > Decimal::ZERO {
            PositionSide::Long
        } else if self.size < Decimal::ZERO {
            PositionSide::Short
        } else {
            PositionSide::Flat
        }
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }

    /// Apply one execution to the position
    ///
    /// # Errors
    ///
    /// - [`FillError::InvalidFill`] if `qty` or `price` is not positive
    /// - [`FillError::InsufficientPosition`] if a closing fill exceeds `|size|`
    /// - [`FillError::Overflow`] if the new cost, size or realized PnL does
    ///   not fit in a `Decimal`
    ///
    /// On error the position is untouched.
    pub fn apply_fill(
        &mut self,
        side: Side,
        qty: Decimal,
        price: Decimal,
    ) -> Result<FillOutcome, FillError> {
        if qty <= Decimal::ZERO || price <= Decimal::ZERO {
            return Err(FillError::InvalidFill { qty, price });
        }

        let outcome = match self.side().opening_side() {
            Some(opening) if opening != side => self.close(qty, price)?,
            _ => self.open(side, qty, price)?,
        };

        self.trade_count += 1;

        Ok(outcome)
    }

    /// Open from flat or add in the current direction
    fn open(&mut self, side: Side, qty: Decimal, price: Decimal) -> Result<FillOutcome, FillError> {
        let lot = Lot::new(qty, price).ok_or_else(|| self.overflow("lot cost", qty, price))?;

        let size = match side {
            Side::Buy => self.size.checked_add(qty),
            Side::Sell => self.size.checked_sub(qty),
        }
        .ok_or_else(|| self.overflow("position size", qty, price))?;

        let merged = match (self.cost_basis_method, self.lots.back()) {
            (CostBasisMethod::WeightedAverage, Some(average)) => Some(
                average
                    .merged(&lot)
                    .ok_or_else(|| self.overflow("average price", qty, price))?,
            ),
            _ => None,
        };

        let avg_price = match &merged {
            Some(average) => average.price(),
            None => average_price(self.lots.iter().copied().chain(Some(lot)))
                .ok_or_else(|| self.overflow("average price", qty, price))?,
        };

        // Nothing below can fail
        let next = match merged {
            Some(average) => {
                self.lots.pop_back();
                average
            }
            None => lot,
        };
        self.lots.push_back(next);
        self.size = size;
        self.avg_price = avg_price;

        Ok(FillOutcome {
            opened_qty: qty,
            closed_qty: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
        })
    }

    /// Reduce the position, consuming lots from the front
    ///
    /// The ledger is walked read-only first; lots are only consumed once the
    /// realized PnL is known to fit.
    fn close(&mut self, qty: Decimal, price: Decimal) -> Result<FillOutcome, FillError> {
        let available = self.size.abs();
        if qty > available {
            return Err(FillError::InsufficientPosition {
                symbol: self.symbol.clone(),
                requested: qty,
                available,
            });
        }

        let direction = if self.size > Decimal::ZERO {
            Decimal::ONE
        } else {
            Decimal::NEGATIVE_ONE
        };

        let mut remaining = qty;
        let mut realized = Decimal::ZERO;
        // Lots closed outright, then the amount taken from the next one
        let mut exhausted = 0;
        let mut partial = Decimal::ZERO;

        for lot in &self.lots {
            if remaining.is_zero() {
                break;
            }

            let consumed = remaining.min(lot.quantity());
            realized = (price - lot.price())
                .checked_mul(consumed * direction)
                .and_then(|pnl| realized.checked_add(pnl))
                .ok_or_else(|| self.overflow("realized pnl", qty, price))?;
            remaining -= consumed;

            if consumed == lot.quantity() {
                exhausted += 1;
            } else {
                partial = consumed;
            }
        }
        debug_assert!(remaining.is_zero(), "lots must cover the open size");

        let realized_pnl = self
            .realized_pnl
            .checked_add(realized)
            .ok_or_else(|| self.overflow("realized pnl", qty, price))?;

        let survivors = self.lots.iter().skip(exhausted).enumerate().map(|(i, lot)| {
            let mut lot = *lot;
            if i == 0 {
                lot.consume(partial);
            }
            lot
        });
        let avg_price =
            average_price(survivors).ok_or_else(|| self.overflow("average price", qty, price))?;

        // Nothing below can fail
        for _ in 0..exhausted {
            self.lots.pop_front();
        }
        if let Some(front) = self.lots.front_mut() {
            front.consume(partial);
        }

        self.realized_pnl = realized_pnl;
        self.size -= qty * direction;
        self.avg_price = avg_price;

        if self.size.is_zero() {
            // Normalise away any negative zero
            self.size = Decimal::ZERO;
            self.avg_price = Decimal::ZERO;
            self.lots.clear();
        }

        Ok(FillOutcome {
            opened_qty: Decimal::ZERO,
            closed_qty: qty,
            realized_pnl: realized,
        })
    }

    fn overflow(&self, operation: &'static str, qty: Decimal, price: Decimal) -> FillError {
        FillError::Overflow {
            symbol: self.symbol.clone(),
            operation,
            qty,
            price,
        }
    }

    /// Mark-to-market PnL of the open quantity
    ///
    /// The sign of `size` gives the right direction for both longs and shorts.
    /// Saturates at the `Decimal` bounds when the mark is too far from the
    /// entry to represent.
    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        if self.is_flat() {
            return Decimal::ZERO;
        }
        self.size.saturating_mul(current_price.saturating_sub(self.avg_price))
    }

    /// Realized plus unrealized PnL, saturating
    pub fn total_pnl(&self, current_price: Decimal) -> Decimal {
        self.realized_pnl.saturating_add(self.unrealized_pnl(current_price))
    }

    /// Absolute exposure at `current_price`, saturating
    pub fn notional_value(&self, current_price: Decimal) -> Decimal {
        self.size.abs().saturating_mul(current_price)
    }

    /// Detached copy of the current state marked at `current_price`
    pub fn snapshot(&self, current_price: Decimal) -> PositionSnapshot {
        PositionSnapshot {
            symbol: self.symbol.clone(),
            size: self.size,
            avg_price: self.avg_price,
            side: self.side(),
            realized_pnl: self.realized_pnl,
            unrealized_pnl: self.unrealized_pnl(current_price),
            notional_value: self.notional_value(current_price),
            mark_price: current_price,
            cost_basis_method: self.cost_basis_method,
            lot_count: self.lot_count(),
            trade_count: self.trade_count,
        }
    }

    /// Switch accounting method
    ///
    /// Only allowed while flat, so no ledger migration is ever needed.
    /// Realized PnL is kept.
    pub fn set_cost_basis_method(&mut self, method: CostBasisMethod) -> Result<(), CostBasisError> {
        if method == self.cost_basis_method {
            return Ok(());
        }

        if !self.is_flat() {
            return Err(CostBasisError::PositionOpen {
                symbol: self.symbol.clone(),
                size: self.size,
            });
        }

        info!(
            "Cost basis method for {} changed: {} -> {}",
            self.symbol, self.cost_basis_method, method
        );
        self.cost_basis_method = method;
        Ok(())
    }
}
