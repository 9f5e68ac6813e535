//! Order book error types

use crate::orderbook::order::OrderError;
use std::fmt;

/// Errors that can occur within the OrderBook
#[derive(Debug)]
#[non_exhaustive]
pub enum OrderBookError {
    /// Error from order validation or an order state mutation
    OrderError(OrderError),

    /// An order was routed to a book for a different symbol
    SymbolMismatch {
        /// The symbol of the receiving book
        expected: String,
        /// The symbol carried by the order
        actual: String,
    },

    /// Error while serializing snapshot data
    SerializationError {
        /// Underlying error message
        message: String,
    },

    /// Error while deserializing snapshot data
    DeserializationError {
        /// Underlying error message
        message: String,
    },
}

impl fmt::Display for OrderBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBookError::OrderError(err) => write!(f, "Order error: {err}"),
            OrderBookError::SymbolMismatch { expected, actual } => {
                write!(f, "Symbol mismatch: book {expected} received order for {actual}")
            }
            OrderBookError::SerializationError { message } => {
                write!(f, "Serialization error: {message}")
            }
            OrderBookError::DeserializationError { message } => {
                write!(f, "Deserialization error: {message}")
            }
        }
    }
}

impl std::error::Error for OrderBookError {}

impl From<OrderError> for OrderBookError {
    fn from(err: OrderError) -> Self {
        OrderBookError::OrderError(err)
    }
}
