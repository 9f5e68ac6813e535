//! Contains the core matching logic for the order book.
//!
//! The sweep walks the opposite side of the book best-first, generating
//! trades until the incoming order is filled or no crossing level remains.
//! Fill-or-kill submissions measure reachable liquidity with
//! [`OrderBook::available_quantity`] before any state is touched.

use crate::orderbook::book::OrderBook;
use crate::orderbook::error::OrderBookError;
use crate::orderbook::order::{Order, Side};
use crate::orderbook::trade::Trade;

impl OrderBook {
    /// Matches an incoming order against the opposite side of the book.
    ///
    /// Iterates price levels in best-first order: ascending asks for a
    /// buyer, descending bids for a seller, which the skip list yields
    /// without sorting. A `limit_price` of `None` ignores the crossing
    /// predicate entirely (market orders); otherwise the walk stops at the
    /// first level the incoming price does not cross.
    ///
    /// Trades execute at the resting level's price. Emptied levels and
    /// fully consumed makers are batch-removed after the walk so the side
    /// map and the order index stay consistent from the perspective of
    /// this single operation.
    pub(super) fn sweep(
        &self,
        taker: &mut Order,
        limit_price: Option<u128>,
    ) -> Result<Vec<Trade>, OrderBookError> {
        let book_side = match taker.side() {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };

        if book_side.is_empty() {
            return Ok(Vec::new());
        }

        let mut trades = Vec::new();
        let mut filled_makers: Vec<u64> = Vec::new();
        let mut empty_levels: Vec<u128> = Vec::new();

        // For buy orders: iterate asks in ascending order (best ask first)
        // For sell orders: iterate bids in descending order (best bid first)
        let price_iter: Box<dyn Iterator<Item = _>> = match taker.side() {
            Side::Buy => Box::new(book_side.iter()),
            Side::Sell => Box::new(book_side.iter().rev()),
        };

        for entry in price_iter {
            let price = *entry.key();
            if let Some(limit) = limit_price {
                match taker.side() {
                    Side::Buy if price > limit => break,
                    Side::Sell if price < limit => break,
                    _ => {}
                }
            }

            let level = entry.value();
            let level_match = level.match_incoming(taker, &self.trade_ids)?;

            for trade in &level_match.trades {
                self.record_trade(trade);
            }
            trades.extend(level_match.trades);
            filled_makers.extend(level_match.filled_order_ids);

            if level.is_empty() {
                empty_levels.push(price);
            }

            if taker.is_filled() {
                break;
            }
        }

        // Batch remove emptied price levels
        for price in &empty_levels {
            book_side.remove(price);
        }

        // Batch remove consumed makers from the order index
        for order_id in &filled_makers {
            self.order_locations.remove(order_id);
        }

        Ok(trades)
    }

    /// Measures how much quantity an order of the given side and limit
    /// price could execute right now, without touching the book.
    ///
    /// Walks crossing levels best-first, summing their cached totals, and
    /// short-circuits once `required` is reached. This is the
    /// fill-or-kill dry run: when the result is below `required` the
    /// submission is cancelled and no trade is ever published for it.
    #[must_use]
    pub fn available_quantity(&self, taker_side: Side, limit_price: u128, required: u64) -> u64 {
        let book_side = match taker_side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };

        if book_side.is_empty() {
            return 0;
        }

        let mut available = 0u64;

        let price_iter: Box<dyn Iterator<Item = _>> = match taker_side {
            Side::Buy => Box::new(book_side.iter()),
            Side::Sell => Box::new(book_side.iter().rev()),
        };

        for entry in price_iter {
            if available >= required {
                break;
            }

            let price = *entry.key();
            match taker_side {
                Side::Buy if price > limit_price => break,
                Side::Sell if price < limit_price => break,
                _ => {}
            }

            available = available.saturating_add(entry.value().total_quantity());
        }

        available
    }
}
