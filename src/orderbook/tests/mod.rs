//! Unit tests for the order book core.

mod cancellation_tests;
mod market_metrics;
