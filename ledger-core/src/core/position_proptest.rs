//! Property-based tests for position accounting
//!
//! These tests drive positions through thousands of randomized fill
//! sequences and check the ledger invariants after every single call.

#[cfg(test)]
mod tests {
    use super::super::errors::FillError;
    use super::super::position::Position;
    use super::super::types::{CostBasisMethod, PositionSide, Side};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    /// (side, qty in thousandths, price in cents)
    fn fill_strategy() -> impl Strategy<Value = (Side, i64, i64)> {
        (
            prop_oneof![Just(Side::Buy), Just(Side::Sell)],
            1i64..5_000,
            1i64..10_000_000,
        )
    }

    fn method_strategy() -> impl Strategy<Value = CostBasisMethod> {
        prop_oneof![
            Just(CostBasisMethod::WeightedAverage),
            Just(CostBasisMethod::Fifo)
        ]
    }

    fn check_invariants(pos: &Position) -> Result<(), TestCaseError> {
        let lot_total: Decimal = pos.lots().iter().map(|lot| lot.quantity()).sum();

        prop_assert_eq!(pos.size().abs(), lot_total, "size must equal open lot quantity");
        prop_assert_eq!(pos.lots().is_empty(), pos.size().is_zero());

        match pos.side() {
            PositionSide::Flat => {
                prop_assert!(pos.size().is_zero());
                prop_assert_eq!(pos.avg_price(), Decimal::ZERO);
            }
            PositionSide::Long => prop_assert!(pos.size() > Decimal::ZERO),
            PositionSide::Short => prop_assert!(pos.size() < Decimal::ZERO),
        }

        for lot in pos.lots() {
            prop_assert!(lot.quantity() > Decimal::ZERO, "exhausted lot left in ledger");
        }

        if pos.cost_basis_method() == CostBasisMethod::WeightedAverage {
            prop_assert!(pos.lot_count() <= 1);
        }

        Ok(())
    }

    proptest! {
        /// Property: ledger invariants hold after every accepted or rejected fill
        #[test]
        fn prop_invariants_hold_for_any_sequence(
            method in method_strategy(),
            fills in prop::collection::vec(fill_strategy(), 1..60),
        ) {
            let mut pos = Position::new("BTCUSDT", method);

            for (side, qty, price) in fills {
                let qty = Decimal::new(qty, 3);
                let price = Decimal::new(price, 2);
                let before = pos.clone();

                match pos.apply_fill(side, qty, price) {
                    Ok(outcome) => {
                        prop_assert_eq!(outcome.opened_qty + outcome.closed_qty, qty);
                        prop_assert_eq!(
                            pos.realized_pnl() - before.realized_pnl(),
                            outcome.realized_pnl
                        );
                    }
                    Err(FillError::InsufficientPosition { .. }) => {
                        prop_assert_eq!(&pos, &before, "rejected fill mutated state");
                    }
                    Err(e) => prop_assert!(false, "unexpected error: {}", e),
                }

                check_invariants(&pos)?;
            }
        }

        /// Property: fills anywhere in the decimal range apply or reject, never panic
        #[test]
        fn prop_extreme_magnitudes_reject_cleanly(
            method in method_strategy(),
            fills in prop::collection::vec(
                (
                    prop_oneof![Just(Side::Buy), Just(Side::Sell)],
                    1i64..i64::MAX,
                    0u32..6,
                    1i64..i64::MAX,
                    0u32..6,
                ),
                1..20,
            ),
        ) {
            let mut pos = Position::new("BTCUSDT", method);

            for (side, qty, qty_scale, price, price_scale) in fills {
                let qty = Decimal::new(qty, qty_scale);
                let price = Decimal::new(price, price_scale);
                let before = pos.clone();

                match pos.apply_fill(side, qty, price) {
                    Ok(outcome) => prop_assert_eq!(outcome.opened_qty + outcome.closed_qty, qty),
                    Err(FillError::InvalidFill { .. }) => prop_assert!(false, "inputs are positive"),
                    Err(_) => prop_assert_eq!(&pos, &before, "rejected fill mutated state"),
                }

                check_invariants(&pos)?;

                // Marking at any price is a total function
                let snapshot = pos.snapshot(price);
                prop_assert_eq!(snapshot.size, pos.size());
            }
        }

        /// Property: realized PnL only moves on fills against the current side
        #[test]
        fn prop_realized_pnl_only_changes_on_closing_fills(
            method in method_strategy(),
            fills in prop::collection::vec(fill_strategy(), 1..40),
        ) {
            let mut pos = Position::new("ETHUSDT", method);

            for (side, qty, price) in fills {
                let opening = pos.side().opening_side();
                let realized_before = pos.realized_pnl();

                if pos
                    .apply_fill(side, Decimal::new(qty, 3), Decimal::new(price, 2))
                    .is_ok()
                    && opening.map_or(true, |open_side| open_side == side)
                {
                    prop_assert_eq!(pos.realized_pnl(), realized_before);
                }
            }
        }

        /// Property: snapshots are pure reads
        #[test]
        fn prop_snapshot_is_idempotent(
            method in method_strategy(),
            fills in prop::collection::vec(fill_strategy(), 1..30),
            mark in 1i64..10_000_000,
        ) {
            let mut pos = Position::new("SOLUSDT", method);
            for (side, qty, price) in fills {
                let _ = pos.apply_fill(side, Decimal::new(qty, 3), Decimal::new(price, 2));
            }

            let before = pos.clone();
            let mark = Decimal::new(mark, 2);
            let first = pos.snapshot(mark);
            let second = pos.snapshot(mark);

            prop_assert_eq!(first, second);
            prop_assert_eq!(&pos, &before);
        }

        /// Property: flatten-then-reopen replaces an oversized closing fill
        #[test]
        fn prop_two_fill_flip_lands_on_other_side(
            method in method_strategy(),
            open_qty in 1i64..5_000,
            extra in 1i64..5_000,
            price in 1i64..10_000_000,
        ) {
            let mut pos = Position::new("BTCUSDT", method);
            let open_qty = Decimal::new(open_qty, 3);
            let extra = Decimal::new(extra, 3);
            let price = Decimal::new(price, 2);

            pos.apply_fill(Side::Buy, open_qty, price).unwrap();
            prop_assert!(pos.apply_fill(Side::Sell, open_qty + extra, price).is_err());

            pos.apply_fill(Side::Sell, open_qty, price).unwrap();
            pos.apply_fill(Side::Sell, extra, price).unwrap();

            prop_assert_eq!(pos.side(), PositionSide::Short);
            prop_assert_eq!(pos.size(), -extra);
            prop_assert_eq!(pos.avg_price(), price);
        }
    }
}
