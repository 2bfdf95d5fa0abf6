//! Cross-thread access to a [`PositionManager`]
//!
//! The fill-ingestion loop writes through the handle; reporting and UI
//! threads read through clones of it. Readers never get a reference to a live
//! position: every read copies out snapshots or scalars before the read lock
//! is released.
//!
//! Subscriber callbacks run while the write lock is held. A callback must not
//! call back into the same handle or it will deadlock.

use super::position_manager::{PnlSummary, PositionManager, SubscriptionId};
use super::updates::PositionUpdate;
use crate::core::{CostBasisMethod, FillError, FillOutcome, Position, PositionSnapshot, Side};
use crate::execution::ExecutionReport;
use crossbeam::channel::Receiver;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

/// Cloneable, thread-safe handle to one session's positions
#[derive(Clone, Debug)]
pub struct SharedPositionManager {
    inner: Arc<RwLock<PositionManager>>,
}

impl SharedPositionManager {
    pub fn new(manager: PositionManager) -> Self {
        Self {
            inner: Arc::new(RwLock::new(manager)),
        }
    }

    // ===== WRITER =====

    pub fn apply_execution_report(
        &self,
        report: &ExecutionReport,
        side: Side,
    ) -> Result<FillOutcome, FillError> {
        self.inner.write().apply_execution_report(report, side)
    }

    pub fn apply_fill(
        &self,
        symbol: &str,
        side: Side,
        qty: Decimal,
        price: Decimal,
    ) -> Result<FillOutcome, FillError> {
        self.inner.write().apply_fill(symbol, side, qty, price)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn set_default_cost_basis_method(&self, method: CostBasisMethod) {
        self.inner.write().set_default_cost_basis_method(method);
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Position) + Send + Sync + 'static,
    {
        self.inner.write().subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.write().unsubscribe(id)
    }

    /// Open an update channel with the configured capacity
    pub fn update_channel(&self) -> Receiver<PositionUpdate> {
        self.inner.write().update_channel()
    }

    /// Run `f` with exclusive access to the manager
    pub fn with_write<R>(&self, f: impl FnOnce(&mut PositionManager) -> R) -> R {
        f(&mut *self.inner.write())
    }

    // ===== READERS =====

    pub fn snapshot(&self, symbol: &str, price: Decimal) -> Option<PositionSnapshot> {
        self.inner.read().snapshot(symbol, price)
    }

    pub fn snapshots(&self, prices: &HashMap<String, Decimal>) -> Vec<PositionSnapshot> {
        self.inner.read().snapshots(prices)
    }

    pub fn total_realized_pnl(&self) -> Decimal {
        self.inner.read().total_realized_pnl()
    }

    pub fn total_unrealized_pnl(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        self.inner.read().total_unrealized_pnl(prices)
    }

    pub fn pnl_summary(&self, prices: &HashMap<String, Decimal>) -> PnlSummary {
        self.inner.read().pnl_summary(prices)
    }

    pub fn position_count(&self) -> usize {
        self.inner.read().position_count()
    }

    /// Run `f` under the read lock; references cannot escape the closure
    pub fn with_read<R>(&self, f: impl FnOnce(&PositionManager) -> R) -> R {
        f(&*self.inner.read())
    }
}

impl Default for SharedPositionManager {
    fn default() -> Self {
        Self::new(PositionManager::new())
    }
}

impl From<PositionManager> for SharedPositionManager {
    fn from(manager: PositionManager) -> Self {
        Self::new(manager)
    }
}
