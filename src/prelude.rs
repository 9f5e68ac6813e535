//! Prelude module that re-exports commonly used types and traits.
//!
//! Instead of importing each type individually, you can use:
//!
//! ```rust
//! use matchbook_rs::prelude::*;
//! ```

// The facade and its components
pub use crate::engine::{EngineStats, MatchingEngine};
pub use crate::exchange::Exchange;
pub use crate::marketdata::{BookSnapshot, MarketDataService};

// Core order book types
pub use crate::orderbook::{
    Order, OrderBook, OrderBookError, OrderError, OrderId, OrderKind, OrderStatus, PriceLevel,
    Side, Trade, TradeId,
};

// Event types
pub use crate::events::{EventBus, EventCallback, EventKind, MarketEvent};

// Utility functions
pub use crate::utils::{current_time_millis, monotonic_time_ns};
