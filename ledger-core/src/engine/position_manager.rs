//! Position registry for one trading session
//!
//! Owns every [`Position`] keyed by symbol, routes execution reports to them
//! and aggregates PnL across symbols.
//!
//! ## Single writer
//!
//! Fills must be applied in venue sequence order from exactly one execution
//! path, otherwise FIFO lot order and realized PnL lose their meaning. The
//! manager takes `&mut self` for every mutation; share it across threads via
//! [`SharedPositionManager`](super::SharedPositionManager).
//!
//! ## Notification
//!
//! After a fill is applied, and before `apply_*` returns:
//! 1. every subscriber callback runs once, in registration order, with the
//!    updated position
//! 2. a [`PositionUpdate`] is offered to every open update channel
//!
//! Neither happens for rejected fills.

use super::updates::{PositionUpdate, UpdatePublisher};
use crate::config::AccountingConfig;
use crate::core::{
    CostBasisMethod, FillError, FillOutcome, Position, PositionSnapshot, Side,
};
use crate::execution::ExecutionReport;
use crossbeam::channel::Receiver;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Callback invoked synchronously after every applied fill
pub type PositionCallback = Box<dyn Fn(&Position) + Send + Sync>;

/// Handle returned by [`PositionManager::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Aggregate PnL and exposure across all positions
///
/// Sums saturate at the `Decimal` bounds instead of overflowing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PnlSummary {
    pub realized_pnl: Decimal,
    /// Only positions with a price entry contribute
    pub unrealized_pnl: Decimal,
    pub total_pnl: Decimal,
    /// Σ |size| * price over priced positions
    pub gross_exposure: Decimal,
    /// Σ size * price over priced positions
    pub net_exposure: Decimal,
    pub open_positions: usize,
    /// Open positions that had no price entry, sorted
    pub unpriced_symbols: Vec<String>,
}

/// Registry of all positions in a trading session
pub struct PositionManager {
    positions: HashMap<String, Position>,
    default_cost_basis_method: CostBasisMethod,
    subscribers: Vec<(SubscriptionId, PositionCallback)>,
    next_subscription_id: u64,
    publisher: UpdatePublisher,
    update_channel_capacity: usize,
}

impl PositionManager {
    /// Create a manager with compile-time defaults
    pub fn new() -> Self {
        Self::with_config(&AccountingConfig::default())
    }

    /// Create a manager whose new positions use `method`
    pub fn with_default_method(method: CostBasisMethod) -> Self {
        let mut manager = Self::new();
        manager.default_cost_basis_method = method;
        manager
    }

    pub fn with_config(config: &AccountingConfig) -> Self {
        info!(
            "Initialized PositionManager: default cost basis {}, update channel capacity {}",
            config.default_cost_basis_method, config.update_channel_capacity
        );

        Self {
            positions: HashMap::new(),
            default_cost_basis_method: config.default_cost_basis_method,
            subscribers: Vec::new(),
            next_subscription_id: 0,
            publisher: UpdatePublisher::new(),
            update_channel_capacity: config.update_channel_capacity,
        }
    }

    fn entry<'a>(
        positions: &'a mut HashMap<String, Position>,
        symbol: &str,
        method: CostBasisMethod,
    ) -> &'a mut Position {
        positions.entry(symbol.to_string()).or_insert_with(|| {
            info!("Opening position ledger for {} ({})", symbol, method);
            Position::new(symbol, method)
        })
    }

    /// Existing position, or a new flat one using the default method
    pub fn get_or_create_position(&mut self, symbol: &str) -> &mut Position {
        Self::entry(&mut self.positions, symbol, self.default_cost_basis_method)
    }

    /// Look up a position; absent symbols are not an error
    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Apply the fill carried by an execution report
    ///
    /// Only `symbol`, `last_fill_qty` and `last_fill_price` are read.
    pub fn apply_execution_report(
        &mut self,
        report: &ExecutionReport,
        side: Side,
    ) -> Result<FillOutcome, FillError> {
        self.apply_fill(
            &report.symbol,
            side,
            report.last_fill_qty,
            report.last_fill_price,
        )
    }

    /// Apply a fill to `symbol`, creating the position if needed
    ///
    /// Errors propagate unchanged and skip all notification.
    pub fn apply_fill(
        &mut self,
        symbol: &str,
        side: Side,
        qty: Decimal,
        price: Decimal,
    ) -> Result<FillOutcome, FillError> {
        let position = Self::entry(&mut self.positions, symbol, self.default_cost_basis_method);
        let outcome = position.apply_fill(side, qty, price)?;

        debug!(
            "Fill applied: {} {} {} @ {} -> size {}, avg {}, realized {} (+{})",
            symbol,
            side,
            qty,
            price,
            position.size(),
            position.avg_price(),
            position.realized_pnl(),
            outcome.realized_pnl
        );

        let position: &Position = position;
        for (_, callback) in &self.subscribers {
            callback(position);
        }
        self.publisher.publish(side, qty, price, outcome, position);

        Ok(outcome)
    }

    /// Sum of realized PnL across all positions
    pub fn total_realized_pnl(&self) -> Decimal {
        self.positions
            .values()
            .map(Position::realized_pnl)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Sum of unrealized PnL over positions that have a price in `prices`
    ///
    /// Positions without a price entry contribute zero.
    pub fn total_unrealized_pnl(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        self.positions
            .iter()
            .filter_map(|(symbol, position)| {
                prices
                    .get(symbol)
                    .map(|price| position.unrealized_pnl(*price))
            })
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Realized plus priced unrealized PnL
    pub fn total_pnl(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        self.total_realized_pnl()
            .saturating_add(self.total_unrealized_pnl(prices))
    }

    /// PnL and exposure across all positions
    pub fn pnl_summary(&self, prices: &HashMap<String, Decimal>) -> PnlSummary {
        let mut summary = PnlSummary::default();

        for (symbol, position) in &self.positions {
            summary.realized_pnl = summary.realized_pnl.saturating_add(position.realized_pnl());

            if position.is_flat() {
                continue;
            }
            summary.open_positions += 1;

            match prices.get(symbol) {
                Some(price) => {
                    let net = position.size().saturating_mul(*price);
                    summary.unrealized_pnl = summary
                        .unrealized_pnl
                        .saturating_add(position.unrealized_pnl(*price));
                    summary.gross_exposure = summary
                        .gross_exposure
                        .saturating_add(position.notional_value(*price));
                    summary.net_exposure = summary.net_exposure.saturating_add(net);
                }
                None => summary.unpriced_symbols.push(symbol.clone()),
            }
        }

        if !summary.unpriced_symbols.is_empty() {
            summary.unpriced_symbols.sort();
            debug!(
                "No price for open positions {:?}, excluded from unrealized PnL",
                summary.unpriced_symbols
            );
        }

        summary.total_pnl = summary.realized_pnl.saturating_add(summary.unrealized_pnl);
        summary
    }

    /// Visit every position (order unspecified)
    pub fn for_each_position<F>(&self, mut visitor: F)
    where
        F: FnMut(&Position),
    {
        for position in self.positions.values() {
            visitor(position);
        }
    }

    /// Snapshot of one position marked at `price`
    pub fn snapshot(&self, symbol: &str, price: Decimal) -> Option<PositionSnapshot> {
        self.positions
            .get(symbol)
            .map(|position| position.snapshot(price))
    }

    /// Snapshots of every position that has a price, sorted by symbol
    pub fn snapshots(&self, prices: &HashMap<String, Decimal>) -> Vec<PositionSnapshot> {
        let mut snapshots: Vec<PositionSnapshot> = self
            .positions
            .iter()
            .filter_map(|(symbol, position)| {
                prices.get(symbol).map(|price| position.snapshot(*price))
            })
            .collect();
        snapshots.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        snapshots
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Drop every position
    ///
    /// Subscribers and update channels stay attached.
    pub fn clear(&mut self) {
        info!("Clearing {} position(s)", self.positions.len());
        self.positions.clear();
    }

    /// Register a callback run after every applied fill
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&Position) + Send + Sync + 'static,
    {
        self.next_subscription_id += 1;
        let id = SubscriptionId(self.next_subscription_id);
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Install `callback` as the only subscriber
    ///
    /// Any previously registered callbacks are removed. Use
    /// [`subscribe`](Self::subscribe) to add a callback alongside others.
    pub fn set_position_update_callback<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&Position) + Send + Sync + 'static,
    {
        if !self.subscribers.is_empty() {
            warn!(
                "Replacing {} existing position update subscriber(s)",
                self.subscribers.len()
            );
            self.subscribers.clear();
        }
        self.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Open an update channel with the configured capacity
    pub fn update_channel(&mut self) -> Receiver<PositionUpdate> {
        self.publisher.channel(self.update_channel_capacity)
    }

    /// Open an update channel with an explicit capacity
    pub fn update_channel_with_capacity(&mut self, capacity: usize) -> Receiver<PositionUpdate> {
        self.publisher.channel(capacity)
    }

    /// Sequence number of the last applied fill
    pub fn last_sequence(&self) -> u64 {
        self.publisher.sequence()
    }

    /// Updates dropped because a channel was full
    pub fn dropped_updates(&self) -> u64 {
        self.publisher.dropped()
    }

    /// Method used for positions created from now on
    ///
    /// Existing positions keep theirs.
    pub fn set_default_cost_basis_method(&mut self, method: CostBasisMethod) {
        if method != self.default_cost_basis_method {
            info!(
                "Default cost basis method changed: {} -> {}",
                self.default_cost_basis_method, method
            );
        }
        self.default_cost_basis_method = method;
    }

    pub fn default_cost_basis_method(&self) -> CostBasisMethod {
        self.default_cost_basis_method
    }
}

impl Default for PositionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PositionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionManager")
            .field("positions", &self.positions.len())
            .field("default_cost_basis_method", &self.default_cost_basis_method)
            .field("subscribers", &self.subscribers.len())
            .field("update_channels", &self.publisher.listener_count())
            .field("last_sequence", &self.publisher.sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::OrderStatus;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn report(symbol: &str, qty: Decimal, price: Decimal) -> ExecutionReport {
        ExecutionReport::fill(symbol, qty, price, OrderStatus::Filled)
    }

    #[test]
    fn test_get_or_create_uses_default_method() {
        let mut manager = PositionManager::with_default_method(CostBasisMethod::Fifo);

        let pos = manager.get_or_create_position("BTCUSDT");
        assert_eq!(pos.cost_basis_method(), CostBasisMethod::Fifo);
        assert!(pos.is_flat());

        // Second call returns the same position
        manager.get_or_create_position("BTCUSDT");
        assert_eq!(manager.position_count(), 1);
    }

    #[test]
    fn test_default_method_change_only_affects_new_positions() {
        let mut manager = PositionManager::with_default_method(CostBasisMethod::WeightedAverage);
        manager.get_or_create_position("BTCUSDT");

        manager.set_default_cost_basis_method(CostBasisMethod::Fifo);
        manager.get_or_create_position("ETHUSDT");

        assert_eq!(
            manager.get_position("BTCUSDT").unwrap().cost_basis_method(),
            CostBasisMethod::WeightedAverage
        );
        assert_eq!(
            manager.get_position("ETHUSDT").unwrap().cost_basis_method(),
            CostBasisMethod::Fifo
        );
    }

    #[test]
    fn test_get_position_absent() {
        let manager = PositionManager::new();
        assert!(manager.get_position("DOGEUSDT").is_none());
        assert!(manager.snapshot("DOGEUSDT", dec!(1)).is_none());
    }

    #[test]
    fn test_callbacks_run_once_per_successful_fill() {
        let mut manager = PositionManager::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        manager.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        manager
            .apply_execution_report(&report("BTCUSDT", dec!(1), dec!(50000)), Side::Buy)
            .unwrap();
        assert!(manager
            .apply_execution_report(&report("BTCUSDT", dec!(3), dec!(50000)), Side::Sell)
            .is_err());
        assert!(manager
            .apply_execution_report(&report("BTCUSDT", dec!(0), dec!(50000)), Side::Buy)
            .is_err());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.last_sequence(), 1);
    }

    #[test]
    fn test_set_callback_replaces_subscribers() {
        let mut manager = PositionManager::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let c1 = first.clone();
        manager.subscribe(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = second.clone();
        manager.set_position_update_callback(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        manager
            .apply_fill("BTCUSDT", Side::Buy, dec!(1), dec!(50000))
            .unwrap();

        assert_eq!(manager.subscriber_count(), 1);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut manager = PositionManager::new();
        let id = manager.subscribe(|_| {});

        assert!(manager.unsubscribe(id));
        assert!(!manager.unsubscribe(id));
        assert_eq!(manager.subscriber_count(), 0);
    }

    #[test]
    fn test_clear_keeps_subscribers() {
        let mut manager = PositionManager::new();
        manager.subscribe(|_| {});
        manager
            .apply_fill("BTCUSDT", Side::Buy, dec!(1), dec!(50000))
            .unwrap();

        manager.clear();

        assert_eq!(manager.position_count(), 0);
        assert_eq!(manager.subscriber_count(), 1);
        assert_eq!(manager.total_realized_pnl(), Decimal::ZERO);
    }

    #[test]
    fn test_debug_output() {
        let manager = PositionManager::new();
        let debug = format!("{:?}", manager);
        assert!(debug.contains("PositionManager"));
        assert!(debug.contains("subscribers"));
    }
}
