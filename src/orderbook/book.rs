//! Core OrderBook implementation for managing price levels and orders

use super::error::OrderBookError;
use super::level::PriceLevel;
use super::order::{Order, OrderKind, OrderStatus, Side};
use super::trade::{Sequence, Trade};
use crossbeam::atomic::AtomicCell;
use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// The OrderBook manages the price levels of one symbol and matches
/// incoming orders against them with strict price-time priority.
///
/// Each book is single-writer: `add_order` and `cancel_order` serialize
/// through an internal per-symbol gate, so concurrent submissions to the
/// same symbol queue up rather than interleave. Read accessors go straight
/// to the concurrent structures and never take the gate, which lets the
/// market-data projection read a book while a submitter is writing it.
pub struct OrderBook {
    /// The symbol or identifier for this order book
    pub(super) symbol: String,

    /// Bid side price levels (buy orders), keyed by price in a skip list.
    /// The natural ascending key order makes the best bid the last entry;
    /// matching iterates this side in reverse.
    pub(super) bids: SkipMap<u128, Arc<PriceLevel>>,

    /// Ask side price levels (sell orders), keyed by price in a skip list.
    /// The best ask is the first entry.
    pub(super) asks: SkipMap<u128, Arc<PriceLevel>>,

    /// A concurrent map from order id to (price, side) for fast
    /// cancellation lookups without searching every price level.
    pub(super) order_locations: DashMap<u64, (u128, Side)>,

    /// Generator for trade ids, shared across books by the engine
    pub(super) trade_ids: Arc<Sequence>,

    /// Append-only trade history
    trades: Mutex<Vec<Trade>>,

    /// The last price at which a trade occurred
    last_trade_price: AtomicCell<u128>,

    /// Flag indicating if there was a trade
    has_traded: AtomicBool,

    /// Cumulative executed quantity across all trades
    total_volume: AtomicU64,

    /// Cumulative notional (price * quantity) across all trades
    total_turnover: AtomicCell<u128>,

    /// Serializes all mutation of this book
    write_gate: Mutex<()>,
}

impl OrderBook {
    /// Create a new order book for the given symbol with its own trade id
    /// sequence.
    #[must_use]
    pub fn new(symbol: &str) -> Self {
        Self::with_trade_sequence(symbol, Arc::new(Sequence::new()))
    }

    /// Create a new order book that draws trade ids from a shared
    /// sequence. The engine uses this so trade ids stay unique across
    /// symbols.
    #[must_use]
    pub fn with_trade_sequence(symbol: &str, trade_ids: Arc<Sequence>) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            bids: SkipMap::new(),
            asks: SkipMap::new(),
            order_locations: DashMap::new(),
            trade_ids,
            trades: Mutex::new(Vec::new()),
            last_trade_price: AtomicCell::new(0),
            has_traded: AtomicBool::new(false),
            total_volume: AtomicU64::new(0),
            total_turnover: AtomicCell::new(0),
            write_gate: Mutex::new(()),
        }
    }

    /// Get the symbol of this order book
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Add an order to the book, matching it against the opposite side.
    ///
    /// The order is mutated in place: its quantities and status reflect
    /// the outcome when this returns. Limit remainders rest on the book;
    /// market, IOC and fill-or-kill orders never rest.
    ///
    /// # Errors
    /// Returns [`OrderBookError::SymbolMismatch`] when the order targets a
    /// different symbol, or propagates an internal quantity-conservation
    /// violation (a bug, not an operational condition).
    pub fn add_order(&self, order: &mut Order) -> Result<Vec<Trade>, OrderBookError> {
        if order.symbol() != self.symbol {
            return Err(OrderBookError::SymbolMismatch {
                expected: self.symbol.clone(),
                actual: order.symbol().to_string(),
            });
        }

        let _gate = self.gate();
        trace!(
            "book {}: add order {} {} {} {}@{}",
            self.symbol,
            order.id(),
            order.side(),
            order.kind(),
            order.remaining_quantity(),
            order.price()
        );

        match order.kind() {
            OrderKind::Limit => {
                let trades = self.sweep(order, Some(order.price()))?;
                if !order.is_filled() {
                    self.rest_order(order);
                }
                Ok(trades)
            }
            OrderKind::Market => {
                let trades = self.sweep(order, None)?;
                if !order.is_filled() && order.status() == OrderStatus::New {
                    // Nothing crossed at all; the discarded remainder still
                    // leaves the order partially filled, never resting.
                    order.transition_to(OrderStatus::PartiallyFilled)?;
                }
                Ok(trades)
            }
            OrderKind::Ioc => {
                let trades = self.sweep(order, Some(order.price()))?;
                if !order.is_filled() {
                    order.transition_to(OrderStatus::Cancelled)?;
                }
                Ok(trades)
            }
            OrderKind::FillOrKill => {
                let required = order.remaining_quantity();
                let available = self.available_quantity(order.side(), order.price(), required);
                if available >= required {
                    self.sweep(order, Some(order.price()))
                } else {
                    order.transition_to(OrderStatus::Cancelled)?;
                    Ok(Vec::new())
                }
            }
        }
    }

    /// Cancel a resting order by id.
    ///
    /// Returns true iff the order was found on the book and removed.
    /// Unknown ids, already filled orders and already cancelled orders all
    /// return false; none of these are errors.
    pub fn cancel_order(&self, order_id: u64) -> bool {
        let _gate = self.gate();

        let Some((_, (price, side))) = self.order_locations.remove(&order_id) else {
            trace!("book {}: cancel {} not resting", self.symbol, order_id);
            return false;
        };

        let book_side = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };

        let Some(entry) = book_side.get(&price) else {
            return false;
        };

        let level = entry.value();
        let removed = level.remove(order_id).is_some();
        if level.is_empty() {
            book_side.remove(&price);
        }

        trace!(
            "book {}: cancel {} at {} removed={}",
            self.symbol, order_id, price, removed
        );
        removed
    }

    /// Places a resting order on its side of the book, indexes it, and
    /// marks it open.
    pub(super) fn rest_order(&self, order: &mut Order) {
        let (side, price) = (order.side(), order.price());
        let book_side = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };

        order.mark_open();

        let level = book_side
            .get_or_insert(price, Arc::new(PriceLevel::new(price)))
            .value()
            .clone();
        level.enqueue(order.clone());

        // The location is stored as (price, side) for retrieval in cancel_order
        self.order_locations.insert(order.id(), (price, side));
    }

    /// Record a trade against the book's cumulative statistics.
    pub(super) fn record_trade(&self, trade: &Trade) {
        self.last_trade_price.store(trade.price);
        self.has_traded.store(true, Ordering::Relaxed);
        self.total_volume.fetch_add(trade.quantity, Ordering::AcqRel);
        self.total_turnover.fetch_add(trade.notional());
        self.trade_history().push(trade.clone());
    }

    fn gate(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn trade_history(&self) -> MutexGuard<'_, Vec<Trade>> {
        self.trades.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the best bid price, if any
    #[must_use]
    pub fn best_bid(&self) -> Option<u128> {
        // SkipMap maintains sorted order, best bid (highest price) is last
        self.bids.iter().next_back().map(|entry| *entry.key())
    }

    /// Get the best ask price, if any
    #[must_use]
    pub fn best_ask(&self) -> Option<u128> {
        // SkipMap maintains sorted order, best ask (lowest price) is first
        self.asks.iter().next().map(|entry| *entry.key())
    }

    /// Get the spread (best ask - best bid), defined only when both sides
    /// are non-empty
    #[must_use]
    pub fn spread(&self) -> Option<u128> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    /// Get the mid price (average of best bid and best ask)
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid as f64 + ask as f64) / 2.0),
            _ => None,
        }
    }

    /// Get the last trade price, if any
    #[must_use]
    pub fn last_trade_price(&self) -> Option<u128> {
        if self.has_traded.load(Ordering::Relaxed) {
            Some(self.last_trade_price.load())
        } else {
            None
        }
    }

    /// The volume-weighted average price across all trades on this book,
    /// `total_turnover / total_volume`, or 0 before the first trade.
    #[must_use]
    pub fn vwap(&self) -> f64 {
        let volume = self.total_volume.load(Ordering::Acquire);
        if volume == 0 {
            return 0.0;
        }
        self.total_turnover.load() as f64 / volume as f64
    }

    /// Cumulative executed quantity across all trades
    #[must_use]
    pub fn total_volume(&self) -> u64 {
        self.total_volume.load(Ordering::Acquire)
    }

    /// Cumulative notional (price * quantity) across all trades
    #[must_use]
    pub fn total_turnover(&self) -> u128 {
        self.total_turnover.load()
    }

    /// The number of orders resting on the bid side
    #[must_use]
    pub fn bid_depth(&self) -> usize {
        self.bids.iter().map(|entry| entry.value().order_count()).sum()
    }

    /// The number of orders resting on the ask side
    #[must_use]
    pub fn ask_depth(&self) -> usize {
        self.asks.iter().map(|entry| entry.value().order_count()).sum()
    }

    /// Total quantity resting on the bid side
    #[must_use]
    pub fn total_bid_quantity(&self) -> u64 {
        self.bids
            .iter()
            .map(|entry| entry.value().total_quantity())
            .sum()
    }

    /// Total quantity resting on the ask side
    #[must_use]
    pub fn total_ask_quantity(&self) -> u64 {
        self.asks
            .iter()
            .map(|entry| entry.value().total_quantity())
            .sum()
    }

    /// The number of orders currently resting on the book
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.order_locations.len()
    }

    /// The number of trades executed on this book
    #[must_use]
    pub fn trade_count(&self) -> usize {
        self.trade_history().len()
    }

    /// A copy of the trade history in execution order
    #[must_use]
    pub fn trades(&self) -> Vec<Trade> {
        self.trade_history().clone()
    }

    /// Get a copy of a resting order by its id
    #[must_use]
    pub fn get_order(&self, order_id: u64) -> Option<Order> {
        let location = self.order_locations.get(&order_id)?;
        let (price, side) = *location;

        let book_side = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };

        let entry = book_side.get(&price)?;
        entry
            .value()
            .iter_orders()
            .into_iter()
            .find(|order| order.id() == order_id)
    }
}
