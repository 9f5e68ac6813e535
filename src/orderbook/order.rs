//! Order domain types: sides, kinds, lifecycle statuses and the order itself.

use crate::utils::monotonic_time_ns;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Unique identifier of an order.
///
/// Order ids are drawn from a process-wide monotonically increasing
/// sequence starting at 1.
pub type OrderId = u64;

static NEXT_ORDER_ID: AtomicU64 = AtomicU64::new(1);

fn next_order_id() -> OrderId {
    NEXT_ORDER_ID.fetch_add(1, Ordering::Relaxed)
}

/// The side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// A buy (bid) order
    Buy,
    /// A sell (ask) order
    Sell,
}

impl Side {
    /// Returns the opposite side.
    #[must_use]
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// The execution policy of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// Match what crosses, rest the remainder on the book.
    Limit,
    /// Match against the best available prices; never rests. The unfilled
    /// remainder is discarded.
    Market,
    /// Immediate-or-cancel: match what crosses, cancel the remainder.
    Ioc,
    /// Fill-or-kill: execute the full quantity immediately or cancel
    /// without touching the book.
    FillOrKill,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Limit => write!(f, "LIMIT"),
            OrderKind::Market => write!(f, "MARKET"),
            OrderKind::Ioc => write!(f, "IOC"),
            OrderKind::FillOrKill => write!(f, "FOK"),
        }
    }
}

/// The lifecycle status of an order.
///
/// Transitions form a DAG: `New` may move to any non-terminal state or
/// straight to `Filled`/`Cancelled`; `Open` and `PartiallyFilled` may only
/// progress towards `Filled` or `Cancelled`. `Filled`, `Cancelled` and
/// `Rejected` are terminal. `Rejected` is assigned at validation time and
/// is never reached through a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Created but not yet processed by a book
    New,
    /// Resting on the book with its full quantity
    Open,
    /// Some quantity executed, some still outstanding
    PartiallyFilled,
    /// Fully executed
    Filled,
    /// Removed before completion
    Cancelled,
    /// Refused at validation, never entered a book
    Rejected,
}

impl OrderStatus {
    /// Returns true when no further transition is allowed from this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    /// Returns true when moving from `self` to `next` is a legal lifecycle
    /// transition.
    #[must_use]
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            New => matches!(next, Open | PartiallyFilled | Filled | Cancelled),
            Open => matches!(next, PartiallyFilled | Filled | Cancelled),
            PartiallyFilled => matches!(next, PartiallyFilled | Filled | Cancelled),
            Filled | Cancelled | Rejected => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::New => "NEW",
            OrderStatus::Open => "OPEN",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
        };
        write!(f, "{label}")
    }
}

/// Errors raised while constructing or mutating an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The symbol was empty or whitespace-only.
    #[error("symbol must not be blank")]
    BlankSymbol,

    /// The order quantity was zero.
    #[error("quantity must be positive")]
    InvalidQuantity,

    /// A priced order carried a zero price.
    #[error("price must be positive for {kind} orders")]
    InvalidPrice {
        /// The kind of the rejected order.
        kind: OrderKind,
    },

    /// A fill was attempted with a quantity of zero or above the
    /// outstanding remainder. This indicates a matching-engine bug.
    #[error("invalid fill quantity {quantity}: remaining {remaining}")]
    InvalidFill {
        /// The offending fill quantity.
        quantity: u64,
        /// The quantity that was actually outstanding.
        remaining: u64,
    },

    /// A lifecycle transition outside the status DAG was attempted.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The status the order was in.
        from: OrderStatus,
        /// The status that was requested.
        to: OrderStatus,
    },
}

/// A single order: immutable identity plus mutable execution state.
///
/// Prices are integer price units; `0` is reserved as the sentinel carried
/// by market orders, whose crossing predicate is never consulted. The
/// invariant `original_quantity == remaining_quantity + filled_quantity`
/// holds at every observable point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    symbol: String,
    side: Side,
    kind: OrderKind,
    price: u128,
    original_quantity: u64,
    remaining_quantity: u64,
    filled_quantity: u64,
    status: OrderStatus,
    timestamp_ns: u64,
}

impl Order {
    fn build(
        symbol: &str,
        side: Side,
        kind: OrderKind,
        price: u128,
        quantity: u64,
    ) -> Result<Self, OrderError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(OrderError::BlankSymbol);
        }
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        if kind != OrderKind::Market && price == 0 {
            return Err(OrderError::InvalidPrice { kind });
        }

        Ok(Self {
            id: next_order_id(),
            symbol: symbol.to_uppercase(),
            side,
            kind,
            price,
            original_quantity: quantity,
            remaining_quantity: quantity,
            filled_quantity: 0,
            status: OrderStatus::New,
            timestamp_ns: monotonic_time_ns(),
        })
    }

    /// Create a limit order.
    ///
    /// # Errors
    /// Returns [`OrderError`] when the symbol is blank, the quantity is
    /// zero, or the price is zero.
    pub fn limit(symbol: &str, side: Side, price: u128, quantity: u64) -> Result<Self, OrderError> {
        Self::build(symbol, side, OrderKind::Limit, price, quantity)
    }

    /// Create a market order. The price is fixed to the `0` sentinel.
    ///
    /// # Errors
    /// Returns [`OrderError`] when the symbol is blank or the quantity is
    /// zero.
    pub fn market(symbol: &str, side: Side, quantity: u64) -> Result<Self, OrderError> {
        Self::build(symbol, side, OrderKind::Market, 0, quantity)
    }

    /// Create an immediate-or-cancel order.
    ///
    /// # Errors
    /// Returns [`OrderError`] when the symbol is blank, the quantity is
    /// zero, or the price is zero.
    pub fn immediate_or_cancel(
        symbol: &str,
        side: Side,
        price: u128,
        quantity: u64,
    ) -> Result<Self, OrderError> {
        Self::build(symbol, side, OrderKind::Ioc, price, quantity)
    }

    /// Create a fill-or-kill order.
    ///
    /// # Errors
    /// Returns [`OrderError`] when the symbol is blank, the quantity is
    /// zero, or the price is zero.
    pub fn fill_or_kill(
        symbol: &str,
        side: Side,
        price: u128,
        quantity: u64,
    ) -> Result<Self, OrderError> {
        Self::build(symbol, side, OrderKind::FillOrKill, price, quantity)
    }

    /// The unique order id.
    #[must_use]
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// The uppercased symbol this order targets.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The order side.
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    /// The execution policy.
    #[must_use]
    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    /// The limit price, or `0` for market orders.
    #[must_use]
    pub fn price(&self) -> u128 {
        self.price
    }

    /// The quantity the order was created with.
    #[must_use]
    pub fn original_quantity(&self) -> u64 {
        self.original_quantity
    }

    /// The quantity still outstanding.
    #[must_use]
    pub fn remaining_quantity(&self) -> u64 {
        self.remaining_quantity
    }

    /// The quantity executed so far.
    #[must_use]
    pub fn filled_quantity(&self) -> u64 {
        self.filled_quantity
    }

    /// The current lifecycle status.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Monotonic capture timestamp in nanoseconds, used for time priority.
    #[must_use]
    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    /// Returns true when the order has no outstanding quantity.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// Apply an execution of `quantity` units against this order.
    ///
    /// Moves the status to `PartiallyFilled`, or `Filled` when the
    /// remainder reaches zero.
    ///
    /// # Errors
    /// Returns [`OrderError::InvalidFill`] when `quantity` is zero or
    /// exceeds the outstanding remainder. Quantity conservation would be
    /// violated, so callers must treat this as fatal.
    pub fn fill(&mut self, quantity: u64) -> Result<(), OrderError> {
        if quantity == 0 || quantity > self.remaining_quantity {
            return Err(OrderError::InvalidFill {
                quantity,
                remaining: self.remaining_quantity,
            });
        }
        self.remaining_quantity -= quantity;
        self.filled_quantity += quantity;
        self.status = if self.remaining_quantity == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        Ok(())
    }

    /// Move the order to a new lifecycle status.
    ///
    /// # Errors
    /// Returns [`OrderError::InvalidTransition`] when the move is outside
    /// the status DAG; in particular a `Filled` order can never be
    /// cancelled.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Mark a freshly rested order as open. Orders that already traded
    /// keep their `PartiallyFilled` status.
    pub(crate) fn mark_open(&mut self) {
        if self.status == OrderStatus::New {
            self.status = OrderStatus::Open;
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}@{} ({})",
            self.id, self.symbol, self.side, self.kind, self.remaining_quantity, self.price, self.status
        )
    }
}
