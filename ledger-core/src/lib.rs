//! Ledger Core - Position & PnL Accounting
//!
//! Turns a stream of execution reports into authoritative per-symbol position
//! state: signed size, cost basis, realized and unrealized PnL.
//!
//! ## Architecture
//! - **Exact decimals** for every quantity, price and PnL value
//! - **One ledger shape** for both cost-basis methods (weighted-average is a
//!   single synthetic lot)
//! - **Atomic fills**: a rejected fill leaves the position untouched
//! - **Single writer**, snapshot-copying readers
//!
//! ## Core Modules
//! - `core`: Lot, Position, PositionSnapshot, errors
//! - `execution`: ExecutionReport boundary type
//! - `engine`: PositionManager, update channels, shared handle
//! - `config`: compile-time defaults and runtime configuration
//! - `utils`: logging setup

pub mod config;
pub mod core;
pub mod engine;
pub mod execution;
pub mod utils;

// Re-export core types
pub use self::core::{
    CostBasisError, CostBasisMethod, FillError, FillOutcome, Lot, Position, PositionSide,
    PositionSnapshot, Side,
};

pub use config::AccountingConfig;
pub use engine::{PnlSummary, PositionManager, PositionUpdate, SharedPositionManager};
pub use execution::{ExecutionReport, OrderStatus};

// Re-export error types
pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    // Core types
    pub use crate::core::{
        CostBasisMethod, FillError, FillOutcome, Position, PositionSide, PositionSnapshot, Side,
    };

    // Engine
    pub use crate::engine::{PnlSummary, PositionManager, PositionUpdate, SharedPositionManager};

    // Execution reports
    pub use crate::execution::{ExecutionReport, OrderStatus};

    // Error types
    pub use crate::{Error, Result};
}
