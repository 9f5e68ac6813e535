//! # Matchbook: an order matching engine
//!
//! A single-venue, multi-symbol order matching engine implementing strict
//! **price-time priority** for four order types: limit, market,
//! immediate-or-cancel and fill-or-kill. Given a stream of submissions and
//! cancellations, the engine maintains one limit order book per symbol,
//! produces trade executions, and publishes lifecycle events to
//! downstream consumers through a non-blocking event bus.
//!
//! ## Architecture
//!
//! - [`PriceLevel`](orderbook::PriceLevel) — a FIFO queue of resting
//!   orders sharing one price, with a cached aggregate quantity.
//! - [`OrderBook`](orderbook::OrderBook) — per-symbol sorted bid and ask
//!   sides (skip lists) plus an order-id index for cancellation; performs
//!   matching for all four order types, including the all-or-nothing
//!   dry run for fill-or-kill.
//! - [`MatchingEngine`](engine::MatchingEngine) — routes submissions
//!   across symbols, creating books lazily, and publishes
//!   received/trade/terminal events.
//! - [`EventBus`](events::EventBus) — typed publish/subscribe over a
//!   single bounded queue with one dispatcher thread; overflow drops
//!   events rather than back-pressuring the matching path.
//! - [`MarketDataService`](marketdata::MarketDataService) — subscribes to
//!   trade events and maintains an immutable per-symbol
//!   [`BookSnapshot`](marketdata::BookSnapshot).
//! - [`Exchange`](exchange::Exchange) — the facade composing the above.
//!
//! ## Ordering guarantees
//!
//! Matching runs synchronously on the submitter's thread; each book is
//! single-writer through a per-symbol gate, so time priority within a
//! price level equals submission order. Events produced by one submission
//! reach subscribers in a fixed sequence: `OrderReceived`, trades in sweep
//! order, then exactly one terminal order event. Event delivery itself is
//! asynchronous.
//!
//! ## Prices
//!
//! Prices are integer price units throughout (scale them externally, e.g.
//! price x 10 000). `0` is reserved as the market-order sentinel. Derived
//! statistics (mid, VWAP) are `f64`.
//!
//! ## Example
//!
//! ```
//! use matchbook_rs::{Exchange, Order, OrderStatus, Side};
//!
//! let exchange = Exchange::new();
//!
//! let mut sell = Order::limit("ETH/USD", Side::Sell, 3_000, 100).unwrap();
//! exchange.submit(&mut sell).unwrap();
//! assert_eq!(sell.status(), OrderStatus::Open);
//!
//! let mut buy = Order::market("ETH/USD", Side::Buy, 40).unwrap();
//! let trades = exchange.submit(&mut buy).unwrap();
//! assert_eq!(trades.len(), 1);
//! assert_eq!(buy.status(), OrderStatus::Filled);
//!
//! let dropped = exchange.shutdown();
//! assert_eq!(dropped, 0);
//! ```

pub mod engine;
pub mod events;
pub mod exchange;
pub mod marketdata;
pub mod orderbook;

pub mod prelude;
mod utils;

pub use engine::{EngineStats, MatchingEngine};
pub use events::{DEFAULT_QUEUE_CAPACITY, EventBus, EventCallback, EventKind, MarketEvent};
pub use exchange::Exchange;
pub use marketdata::{BookSnapshot, MarketDataService};
pub use orderbook::{
    Order, OrderBook, OrderBookError, OrderError, OrderId, OrderKind, OrderStatus, PriceLevel,
    Sequence, Side, Trade, TradeId,
};
pub use utils::{current_time_millis, monotonic_time_ns};
