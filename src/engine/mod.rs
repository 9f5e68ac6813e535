//! The matching engine: routes submissions to per-symbol books and
//! publishes lifecycle events.

use crate::events::{EventBus, MarketEvent};
use crate::orderbook::{Order, OrderBook, OrderBookError, OrderStatus, Sequence, Trade};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, trace};

/// Aggregate counters maintained by the engine.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineStats {
    /// Orders accepted by `submit`
    pub total_orders: u64,
    /// Trades generated across all books
    pub total_trades: u64,
    /// Cumulative wall time spent inside `submit`, in nanoseconds
    pub total_latency_ns: u64,
    /// Mean `submit` latency in nanoseconds, 0 before the first order
    pub avg_latency_ns: u64,
}

/// Dispatches order submissions across symbols, lazily creating one book
/// per symbol, and publishes received/terminal/trade events to the bus.
pub struct MatchingEngine {
    /// Collection of order books indexed by uppercased symbol
    books: DashMap<String, Arc<OrderBook>>,
    /// Event sink shared with the rest of the venue
    bus: Arc<EventBus>,
    /// Venue-wide trade id sequence handed to every book
    trade_ids: Arc<Sequence>,
    total_orders: AtomicU64,
    total_trades: AtomicU64,
    total_latency_ns: AtomicU64,
}

impl MatchingEngine {
    /// Creates an engine publishing to the given bus.
    #[must_use]
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            books: DashMap::new(),
            bus,
            trade_ids: Arc::new(Sequence::new()),
            total_orders: AtomicU64::new(0),
            total_trades: AtomicU64::new(0),
            total_latency_ns: AtomicU64::new(0),
        }
    }

    /// Submits an order for matching.
    ///
    /// The book for the order's symbol is created on first use. Events are
    /// published in a fixed per-submission sequence: `OrderReceived`, one
    /// `Trade` per execution in sweep order, then exactly one terminal
    /// order event (`OrderFilled`, `OrderCancelled` or `OrderOpen`).
    ///
    /// The order is mutated in place; on return its status field carries
    /// the terminal outcome of this submission. The generated trades are
    /// returned to the caller.
    ///
    /// # Errors
    /// Propagates [`OrderBookError`] from the book. Parameter validation
    /// happens earlier, at order construction.
    pub fn submit(&self, order: &mut Order) -> Result<Vec<Trade>, OrderBookError> {
        let started = Instant::now();
        let book = self.book_or_create(order.symbol());

        self.bus.publish(MarketEvent::order_received(order.clone()));

        let trades = book.add_order(order)?;

        for trade in &trades {
            self.bus.publish(MarketEvent::trade(trade.clone()));
        }

        let terminal = match order.status() {
            OrderStatus::Filled => MarketEvent::order_filled(order.clone()),
            OrderStatus::Cancelled => MarketEvent::order_cancelled(order.clone()),
            _ => MarketEvent::order_open(order.clone()),
        };
        self.bus.publish(terminal);

        self.total_orders.fetch_add(1, Ordering::AcqRel);
        self.total_trades
            .fetch_add(trades.len() as u64, Ordering::AcqRel);
        self.total_latency_ns
            .fetch_add(started.elapsed().as_nanos() as u64, Ordering::AcqRel);

        trace!(
            "submit {} -> {} trades, status {}",
            order.id(),
            trades.len(),
            order.status()
        );
        Ok(trades)
    }

    /// Cancels a resting order.
    ///
    /// Returns false when no book exists for the symbol or the order is
    /// not resting. No event is published on this path; only a `submit`
    /// that ends in cancellation emits `OrderCancelled`.
    pub fn cancel(&self, symbol: &str, order_id: u64) -> bool {
        let key = symbol.trim().to_uppercase();
        match self.books.get(&key) {
            Some(book) => book.cancel_order(order_id),
            None => false,
        }
    }

    /// Read-only accessor for the book of a symbol, if one exists.
    #[must_use]
    pub fn book(&self, symbol: &str) -> Option<Arc<OrderBook>> {
        let key = symbol.trim().to_uppercase();
        self.books.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    /// The symbols with an active book.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        self.books.iter().map(|entry| entry.key().clone()).collect()
    }

    /// The number of active books.
    #[must_use]
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    /// A copy of the engine counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let total_orders = self.total_orders.load(Ordering::Acquire);
        let total_latency_ns = self.total_latency_ns.load(Ordering::Acquire);
        EngineStats {
            total_orders,
            total_trades: self.total_trades.load(Ordering::Acquire),
            total_latency_ns,
            avg_latency_ns: if total_orders == 0 {
                0
            } else {
                total_latency_ns / total_orders
            },
        }
    }

    fn book_or_create(&self, symbol: &str) -> Arc<OrderBook> {
        if let Some(book) = self.books.get(symbol) {
            return Arc::clone(book.value());
        }

        let entry = self.books.entry(symbol.to_string()).or_insert_with(|| {
            info!("Creating order book for symbol: {}", symbol);
            Arc::new(OrderBook::with_trade_sequence(
                symbol,
                Arc::clone(&self.trade_ids),
            ))
        });
        Arc::clone(entry.value())
    }
}
