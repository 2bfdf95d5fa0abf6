//! Open quantity at a single entry price
//!
//! A position's cost-basis ledger is a queue of lots, oldest first. Under FIFO
//! every opening fill becomes its own lot; under weighted-average the queue
//! holds one synthetic lot at the running average price.

use crate::config::constants::AVG_PRICE_DECIMALS;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Open quantity at a price
///
/// Quantity is always positive while the lot is in a ledger. The price never
/// changes after creation; only the remaining quantity is consumed.
///
/// `quantity * price` is checked on construction and quantity only shrinks
/// afterwards, so [`Lot::cost`] is always representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    quantity: Decimal,
    price: Decimal,
}

impl Lot {
    /// `None` if the lot's cost does not fit in a `Decimal`
    pub(crate) fn new(quantity: Decimal, price: Decimal) -> Option<Self> {
        debug_assert!(quantity > Decimal::ZERO, "lot quantity must be positive");
        debug_assert!(price > Decimal::ZERO, "lot price must be positive");
        quantity.checked_mul(price)?;
        Some(Self { quantity, price })
    }

    /// Remaining open quantity
    #[inline(always)]
    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Entry price
    #[inline(always)]
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Quantity times entry price
    #[inline]
    pub fn cost(&self) -> Decimal {
        self.quantity * self.price
    }

    /// Close up to `qty` from this lot, returning the amount consumed
    pub(crate) fn consume(&mut self, qty: Decimal) -> Decimal {
        let consumed = qty.min(self.quantity);
        self.quantity -= consumed;
        consumed
    }

    /// This lot and `other` folded into one at the quantity-weighted mean price
    ///
    /// The mean is rounded to [`AVG_PRICE_DECIMALS`], or to the finer of the
    /// two input price scales, so PnL booked against it stays exact. `None` on
    /// overflow.
    pub(crate) fn merged(&self, other: &Lot) -> Option<Lot> {
        let quantity = self.quantity.checked_add(other.quantity)?;
        let cost = self.cost().checked_add(other.cost())?;
        let scale = AVG_PRICE_DECIMALS
            .max(self.price.scale())
            .max(other.price.scale());
        let price = cost.checked_div(quantity)?.round_dp(scale);
        Lot::new(quantity, price)
    }
}

/// Quantity-weighted mean entry price over `lots`
///
/// Zero for an empty ledger, the lot's own price for a single lot, otherwise
/// `Σ cost / Σ quantity` rounded like [`Lot::merged`]. `None` on overflow.
pub(crate) fn average_price<I>(lots: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Lot>,
{
    let mut open = Decimal::ZERO;
    let mut cost = Decimal::ZERO;
    let mut scale = AVG_PRICE_DECIMALS;
    let mut last = None;
    let mut count = 0usize;

    for lot in lots {
        open = open.checked_add(lot.quantity)?;
        cost = cost.checked_add(lot.cost())?;
        scale = scale.max(lot.price.scale());
        last = Some(lot.price);
        count += 1;
    }

    match last {
        None => Some(Decimal::ZERO),
        Some(price) if count == 1 => Some(price),
        Some(_) => Some(cost.checked_div(open)?.round_dp(scale)),
    }
}
