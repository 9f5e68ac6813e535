//! Per-symbol market data snapshot derived from trade activity.

use crate::orderbook::{OrderBook, OrderBookError};
use crate::utils::current_time_millis;
use serde::{Deserialize, Serialize};

/// An immutable projection of one book's market data at a point in time.
///
/// Spread and mid are only defined when both sides of the book are
/// populated; the published snapshot normalizes the undefined case to 0.
/// Depths are order counts, not aggregate quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// The symbol this snapshot describes
    pub symbol: String,
    /// Best bid price, 0 when the bid side is empty
    pub best_bid: u128,
    /// Best ask price, 0 when the ask side is empty
    pub best_ask: u128,
    /// `best_ask - best_bid`, 0 when either side is empty
    pub spread: u128,
    /// Midpoint of best bid and ask, 0 when either side is empty
    pub mid: f64,
    /// The last traded price, 0 before the first trade
    pub last_trade_price: u128,
    /// Volume-weighted average price across all trades, 0 before the
    /// first trade
    pub vwap: f64,
    /// Cumulative traded quantity
    pub total_volume: u64,
    /// Number of orders resting on the bid side
    pub bid_depth: usize,
    /// Number of orders resting on the ask side
    pub ask_depth: usize,
    /// Wall-clock capture instant in milliseconds since the Unix epoch
    pub captured_at: u64,
}

impl BookSnapshot {
    /// Captures a fresh snapshot from a book's read accessors.
    #[must_use]
    pub fn capture(book: &OrderBook) -> Self {
        let best_bid = book.best_bid();
        let best_ask = book.best_ask();
        Self {
            symbol: book.symbol().to_string(),
            best_bid: best_bid.unwrap_or(0),
            best_ask: best_ask.unwrap_or(0),
            spread: book.spread().unwrap_or(0),
            mid: book.mid_price().unwrap_or(0.0),
            last_trade_price: book.last_trade_price().unwrap_or(0),
            vwap: book.vwap(),
            total_volume: book.total_volume(),
            bid_depth: book.bid_depth(),
            ask_depth: book.ask_depth(),
            captured_at: current_time_millis(),
        }
    }

    /// Serializes the snapshot to JSON.
    ///
    /// # Errors
    /// Returns [`OrderBookError::SerializationError`] when encoding fails.
    pub fn to_json(&self) -> Result<String, OrderBookError> {
        serde_json::to_string(self).map_err(|error| OrderBookError::SerializationError {
            message: error.to_string(),
        })
    }

    /// Deserializes a snapshot from JSON.
    ///
    /// # Errors
    /// Returns [`OrderBookError::DeserializationError`] when decoding
    /// fails.
    pub fn from_json(data: &str) -> Result<Self, OrderBookError> {
        serde_json::from_str(data).map_err(|error| OrderBookError::DeserializationError {
            message: error.to_string(),
        })
    }
}
