use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for an order, as assigned by the client or the venue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Order status carried on an execution report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order acknowledged by the venue
    New,
    /// Order partially filled
    PartiallyFilled,
    /// Order fully filled
    Filled,
    /// Order cancelled
    Cancelled,
    /// Order rejected by venue
    Rejected,
    /// Order expired
    Expired,
}

impl OrderStatus {
    /// Whether the order can still receive fills
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::New | OrderStatus::PartiallyFilled)
    }
}

/// Fill event from the order-execution layer
///
/// Only `symbol`, `last_fill_qty` and `last_fill_price` feed position
/// accounting; the rest is carried for logging and reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub symbol: String,
    #[serde(default)]
    pub client_order_id: OrderId,
    #[serde(default)]
    pub venue_order_id: OrderId,
    /// Quantity of this fill
    pub last_fill_qty: Decimal,
    /// Price of this fill
    pub last_fill_price: Decimal,
    pub status: OrderStatus,
    /// Cumulative filled quantity of the order
    #[serde(default)]
    pub executed_qty: Decimal,
    /// Average fill price of the order so far
    #[serde(default)]
    pub avg_price: Decimal,
    /// Venue timestamp of the last fill (nanoseconds)
    #[serde(default)]
    pub last_ts_ns: u64,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ExecutionReport {
    /// Report for a single fill with empty order ids
    pub fn fill(
        symbol: impl Into<String>,
        last_fill_qty: Decimal,
        last_fill_price: Decimal,
        status: OrderStatus,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            client_order_id: OrderId::default(),
            venue_order_id: OrderId::default(),
            last_fill_qty,
            last_fill_price,
            status,
            executed_qty: last_fill_qty,
            avg_price: last_fill_price,
            last_ts_ns: 0,
            reason: None,
        }
    }

    /// Whether this report carries an actual execution
    pub fn has_fill(&self) -> bool {
        self.last_fill_qty > Decimal::ZERO
            && matches!(
                self.status,
                OrderStatus::PartiallyFilled | OrderStatus::Filled
            )
    }

    /// Notional value of the last fill (price * qty), saturating
    pub fn fill_notional(&self) -> Decimal {
        self.last_fill_price.saturating_mul(self.last_fill_qty)
    }
}
