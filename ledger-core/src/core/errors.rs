//! Domain-specific error types for position accounting
//!
//! Every error here is returned to the immediate caller with the position
//! left exactly as it was before the call.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while applying a fill to a position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillError {
    /// Quantity or price is zero or negative
    #[error("Invalid fill: quantity {qty} and price {price} must both be positive")]
    InvalidFill {
        /// Quantity as received
        qty: Decimal,
        /// Price as received
        price: Decimal,
    },

    /// Closing fill is larger than the open position
    ///
    /// Flipping through zero in one fill is not supported; the caller has to
    /// flatten first and open the other side with a separate fill.
    #[error(
        "Insufficient position in {symbol}: closing fill of {requested} exceeds open size {available}"
    )]
    InsufficientPosition {
        /// Symbol of the rejected fill
        symbol: String,
        /// Quantity the fill tried to close
        requested: Decimal,
        /// Absolute open size at the time of the fill
        available: Decimal,
    },

    /// Cost, size or realized PnL would leave the `Decimal` range
    #[error("Arithmetic overflow in {symbol}: {operation} for fill of {qty} @ {price}")]
    Overflow {
        /// Symbol of the rejected fill
        symbol: String,
        /// Computation that failed to fit
        operation: &'static str,
        /// Quantity as received
        qty: Decimal,
        /// Price as received
        price: Decimal,
    },
}

/// Errors raised when changing a position's accounting policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CostBasisError {
    /// The method can only change while the position is flat
    #[error("Cannot change cost basis method of {symbol} while position is open (size {size})")]
    PositionOpen {
        /// Symbol of the open position
        symbol: String,
        /// Signed open size
        size: Decimal,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_fill_display() {
        let err = FillError::InvalidFill {
            qty: dec!(0),
            price: dec!(50000),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid fill"));
        assert!(msg.contains("50000"));
    }

    #[test]
    fn test_insufficient_position_display() {
        let err = FillError::InsufficientPosition {
            symbol: "BTCUSDT".to_string(),
            requested: dec!(1.5),
            available: dec!(1.0),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("BTCUSDT"));
        assert!(msg.contains("1.5"));
        assert!(msg.contains("exceeds open size 1.0"));
    }

    #[test]
    fn test_overflow_display() {
        let err = FillError::Overflow {
            symbol: "BTCUSDT".to_string(),
            operation: "lot cost",
            qty: dec!(2),
            price: dec!(3),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("overflow in BTCUSDT"));
        assert!(msg.contains("lot cost"));
    }

    #[test]
    fn test_cost_basis_error_display() {
        let err = CostBasisError::PositionOpen {
            symbol: "ETHUSDT".to_string(),
            size: dec!(-2),
        };
        assert!(format!("{}", err).contains("while position is open"));
    }

    #[test]
    fn test_errors_convert_to_anyhow() {
        let err: anyhow::Error = FillError::InvalidFill {
            qty: dec!(-1),
            price: dec!(1),
        }
        .into();
        assert!(err.downcast_ref::<FillError>().is_some());
    }
}
