//! Core accounting types
//!
//! This module provides the building blocks of position accounting:
//! - `Lot`: open quantity at an entry price
//! - `Position`: per-symbol cost-basis ledger and PnL
//! - `PositionSnapshot`: detached, serializable copy of a position
//! - `FillError` / `CostBasisError`: rejection reasons
//!
//! Everything here is single-owner and synchronous. Sharing across threads
//! is handled one level up in [`crate::engine`].

pub mod errors;
pub mod lot;
pub mod position;
mod position_proptest;
pub mod snapshot;
pub mod types;

// Re-export commonly used types
pub use errors::{CostBasisError, FillError};
pub use lot::Lot;
pub use position::{FillOutcome, Position};
pub use snapshot::PositionSnapshot;
pub use types::{CostBasisMethod, PositionSide, Side};
