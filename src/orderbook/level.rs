//! A single price level: a FIFO queue of resting orders sharing one price.

use crate::orderbook::order::{Order, OrderError, OrderId, Side};
use crate::orderbook::trade::{Sequence, Trade};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Executions produced by matching an incoming order against one level.
#[derive(Debug, Default)]
pub(crate) struct LevelMatch {
    /// Trades generated at this level, in execution order.
    pub trades: Vec<Trade>,
    /// Ids of resting orders that were completely consumed and dequeued.
    pub filled_order_ids: Vec<OrderId>,
}

/// A price level holds the FIFO queue of orders resting at one price and
/// caches the sum of their remaining quantities.
///
/// Head access and appends are constant-time; [`PriceLevel::remove`] is a
/// linear scan, acceptable because cancellation is rare versus matching.
/// The cached total always equals the sum of the queued orders' remaining
/// quantities.
#[derive(Debug)]
pub struct PriceLevel {
    price: u128,
    orders: Mutex<VecDeque<Order>>,
    total_quantity: AtomicU64,
}

impl PriceLevel {
    /// Creates an empty level at the given price.
    #[must_use]
    pub fn new(price: u128) -> Self {
        Self {
            price,
            orders: Mutex::new(VecDeque::new()),
            total_quantity: AtomicU64::new(0),
        }
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Order>> {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The price shared by every order at this level.
    #[must_use]
    pub fn price(&self) -> u128 {
        self.price
    }

    /// Appends an order to the tail of the queue.
    pub fn enqueue(&self, order: Order) {
        trace!(
            "level {}: enqueue order {} qty {}",
            self.price,
            order.id(),
            order.remaining_quantity()
        );
        self.total_quantity
            .fetch_add(order.remaining_quantity(), Ordering::AcqRel);
        self.queue().push_back(order);
    }

    /// Returns a copy of the order at the head of the queue, if any.
    #[must_use]
    pub fn peek(&self) -> Option<Order> {
        self.queue().front().cloned()
    }

    /// Removes and returns the head order, subtracting its remaining
    /// quantity from the cached total.
    pub fn dequeue(&self) -> Option<Order> {
        let order = self.queue().pop_front();
        if let Some(ref order) = order {
            self.total_quantity
                .fetch_sub(order.remaining_quantity(), Ordering::AcqRel);
        }
        order
    }

    /// Subtracts an executed quantity from the cached total. Used when a
    /// partial fill consumes part of the head order that stays in place.
    pub fn on_fill(&self, quantity: u64) {
        self.total_quantity.fetch_sub(quantity, Ordering::AcqRel);
    }

    /// Removes a specific order by id, returning it when found.
    ///
    /// Linear in the level's size.
    pub fn remove(&self, order_id: OrderId) -> Option<Order> {
        let mut queue = self.queue();
        let position = queue.iter().position(|order| order.id() == order_id)?;
        let order = queue.remove(position)?;
        self.total_quantity
            .fetch_sub(order.remaining_quantity(), Ordering::AcqRel);
        Some(order)
    }

    /// Returns true when no orders rest at this level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    /// The number of orders resting at this level.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.queue().len()
    }

    /// The cached sum of the remaining quantities of queued orders.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.total_quantity.load(Ordering::Acquire)
    }

    /// Returns copies of the queued orders in time priority.
    #[must_use]
    pub fn iter_orders(&self) -> Vec<Order> {
        self.queue().iter().cloned().collect()
    }

    /// Matches an incoming order against this level's queue in strict FIFO
    /// order, generating one trade per resting order consumed.
    ///
    /// Every trade executes at this level's price with the buy/sell order
    /// ids assigned by side. Fully consumed makers are dequeued and their
    /// ids reported for index cleanup by the book.
    pub(crate) fn match_incoming(
        &self,
        taker: &mut Order,
        trade_ids: &Sequence,
    ) -> Result<LevelMatch, OrderError> {
        let mut queue = self.queue();
        let mut result = LevelMatch::default();

        while taker.remaining_quantity() > 0 {
            let Some(maker) = queue.front_mut() else {
                break;
            };

            let fill = taker.remaining_quantity().min(maker.remaining_quantity());
            maker.fill(fill)?;
            taker.fill(fill)?;
            self.total_quantity.fetch_sub(fill, Ordering::AcqRel);

            let (buy_order_id, sell_order_id) = match taker.side() {
                Side::Buy => (taker.id(), maker.id()),
                Side::Sell => (maker.id(), taker.id()),
            };
            result.trades.push(Trade::new(
                trade_ids.next(),
                taker.symbol(),
                buy_order_id,
                sell_order_id,
                self.price,
                fill,
            ));

            if maker.is_filled() {
                result.filled_order_ids.push(maker.id());
                queue.pop_front();
            }
        }

        Ok(result)
    }
}
