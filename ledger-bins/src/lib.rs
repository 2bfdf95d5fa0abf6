//! Ledger binaries
//!
//! Command-line tools built on `ledger_core`.

pub mod common;
