//! Trade records produced by the matching engine.

use crate::orderbook::order::OrderId;
use crate::utils::{current_time_millis, monotonic_time_ns};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier of a trade.
pub type TradeId = u64;

/// A monotonically increasing id sequence starting at 1.
///
/// One sequence per venue: the engine owns it and shares it with every
/// book it creates, so trade ids are unique across symbols.
#[derive(Debug)]
pub struct Sequence(AtomicU64);

impl Sequence {
    /// Creates a sequence whose first value is 1.
    #[must_use]
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    /// Returns the next value.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable record of a single execution.
///
/// The price is always the resting (maker) order's price; the aggressor
/// trades at whatever the book offered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Unique trade id, monotonic across the venue
    pub id: TradeId,
    /// The symbol the trade occurred on
    pub symbol: String,
    /// Id of the buy-side order
    pub buy_order_id: OrderId,
    /// Id of the sell-side order
    pub sell_order_id: OrderId,
    /// Execution price (the maker's limit price)
    pub price: u128,
    /// Executed quantity
    pub quantity: u64,
    /// Monotonic timestamp in nanoseconds
    pub timestamp_ns: u64,
    /// Wall-clock execution instant in milliseconds since the Unix epoch
    pub executed_at: u64,
}

impl Trade {
    /// Creates a trade record stamped with the current clocks.
    #[must_use]
    pub fn new(
        id: TradeId,
        symbol: &str,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: u128,
        quantity: u64,
    ) -> Self {
        Self {
            id,
            symbol: symbol.to_string(),
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            timestamp_ns: monotonic_time_ns(),
            executed_at: current_time_millis(),
        }
    }

    /// The traded value, `price * quantity`.
    #[must_use]
    pub fn notional(&self) -> u128 {
        self.price.saturating_mul(self.quantity as u128)
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trade {} {} {}@{} (buy {}, sell {})",
            self.id, self.symbol, self.quantity, self.price, self.buy_order_id, self.sell_order_id
        )
    }
}
