//! Position Engine
//!
//! This module contains the session-level accounting components:
//! - `position_manager`: registry of positions, fill routing, PnL aggregation
//! - `updates`: bounded-channel fan-out of per-fill position updates
//! - `shared`: `RwLock` handle for cross-thread readers

pub mod position_manager;
pub mod shared;
pub mod updates;

pub use position_manager::{PnlSummary, PositionCallback, PositionManager, SubscriptionId};
pub use shared::SharedPositionManager;
pub use updates::{PositionUpdate, UpdatePublisher};
