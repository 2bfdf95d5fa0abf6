//! Execution-layer boundary types
//!
//! The order-execution collaborator produces [`ExecutionReport`]s; this crate
//! only reads them.

pub mod types;

pub use types::{ExecutionReport, OrderId, OrderStatus};
