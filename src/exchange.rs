//! The exchange facade: the single external entry point composing the
//! engine, the event bus and the market data projection.

use crate::engine::{EngineStats, MatchingEngine};
use crate::events::{DEFAULT_QUEUE_CAPACITY, EventBus, EventKind, MarketEvent};
use crate::marketdata::{BookSnapshot, MarketDataService};
use crate::orderbook::{Order, OrderBook, OrderBookError, Trade};
use std::sync::Arc;

/// A single-venue, multi-symbol exchange.
///
/// Construction wires the components together and starts the event
/// dispatcher; [`Exchange::shutdown`] drains the bus and reports how many
/// events were dropped under overflow.
///
/// # Examples
/// ```
/// use matchbook_rs::{Exchange, Order, Side};
///
/// let exchange = Exchange::new();
///
/// let mut sell = Order::limit("BTC/USD", Side::Sell, 50_000, 10).unwrap();
/// exchange.submit(&mut sell).unwrap();
///
/// let mut buy = Order::limit("BTC/USD", Side::Buy, 50_000, 4).unwrap();
/// let trades = exchange.submit(&mut buy).unwrap();
/// assert_eq!(trades.len(), 1);
/// assert_eq!(trades[0].price, 50_000);
/// assert_eq!(trades[0].quantity, 4);
///
/// exchange.shutdown();
/// ```
pub struct Exchange {
    bus: Arc<EventBus>,
    engine: Arc<MatchingEngine>,
    market_data: Arc<MarketDataService>,
}

impl Exchange {
    /// Creates an exchange with the default event queue capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates an exchange with an explicit event queue capacity.
    ///
    /// The market data subscription is registered before the dispatcher
    /// starts, so the projection observes every delivered trade.
    #[must_use]
    pub fn with_queue_capacity(capacity: usize) -> Self {
        let bus = Arc::new(EventBus::with_capacity(capacity));
        let engine = Arc::new(MatchingEngine::new(Arc::clone(&bus)));
        let market_data = MarketDataService::attach(Arc::clone(&engine), &bus);
        bus.start();

        Self {
            bus,
            engine,
            market_data,
        }
    }

    /// Submits an order for matching; see [`MatchingEngine::submit`].
    ///
    /// # Errors
    /// Propagates [`OrderBookError`] from the engine.
    pub fn submit(&self, order: &mut Order) -> Result<Vec<Trade>, OrderBookError> {
        self.engine.submit(order)
    }

    /// Cancels a resting order. Returns true iff a resting order was
    /// removed; unknown ids and already-gone orders return false.
    pub fn cancel(&self, symbol: &str, order_id: u64) -> bool {
        self.engine.cancel(symbol, order_id)
    }

    /// The latest market data snapshot for a symbol, if any trade has
    /// occurred on it. Updated asynchronously by the dispatcher thread.
    #[must_use]
    pub fn snapshot(&self, symbol: &str) -> Option<BookSnapshot> {
        self.market_data.snapshot(symbol)
    }

    /// Read-only accessor for a symbol's book.
    #[must_use]
    pub fn book(&self, symbol: &str) -> Option<Arc<OrderBook>> {
        self.engine.book(symbol)
    }

    /// Registers a downstream subscriber for one event kind.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F)
    where
        F: Fn(&MarketEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(kind, callback);
    }

    /// A copy of the engine counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.engine.stats()
    }

    /// The number of events dropped so far because the queue was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.bus.dropped_events()
    }

    /// Drains the event bus and stops the dispatcher. Returns the number
    /// of events dropped over the exchange's lifetime.
    pub fn shutdown(&self) -> u64 {
        self.bus.shutdown()
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}
