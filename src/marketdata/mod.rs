//! Market data projection: maintains the latest per-symbol snapshot from
//! trade events.

mod snapshot;

pub use snapshot::BookSnapshot;

use crate::engine::MatchingEngine;
use crate::events::{EventBus, EventKind, MarketEvent};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

/// Subscribes to trade events and keeps one immutable [`BookSnapshot`]
/// per symbol, replaced wholesale on every trade.
///
/// The snapshot map is written from the bus dispatcher thread and read
/// from arbitrary caller threads; both sides go through a concurrent map,
/// so readers always observe a complete snapshot.
pub struct MarketDataService {
    engine: Arc<MatchingEngine>,
    snapshots: DashMap<String, BookSnapshot>,
}

impl MarketDataService {
    /// Creates the service and registers its trade subscription on the
    /// bus. Call before starting the bus dispatcher so no trade slips by
    /// unobserved.
    #[must_use]
    pub fn attach(engine: Arc<MatchingEngine>, bus: &EventBus) -> Arc<Self> {
        let service = Arc::new(Self {
            engine,
            snapshots: DashMap::new(),
        });

        let subscriber = Arc::clone(&service);
        bus.subscribe(EventKind::Trade, move |event| {
            if let MarketEvent::Trade { trade, .. } = event {
                subscriber.refresh(&trade.symbol);
            }
        });

        service
    }

    /// Rebuilds the snapshot for one symbol from its book's accessors.
    /// A symbol without a book is ignored.
    pub fn refresh(&self, symbol: &str) {
        if let Some(book) = self.engine.book(symbol) {
            let snapshot = BookSnapshot::capture(&book);
            trace!("refreshing snapshot for {}", snapshot.symbol);
            self.snapshots.insert(snapshot.symbol.clone(), snapshot);
        }
    }

    /// The latest snapshot for a symbol, if any trade has occurred on it.
    #[must_use]
    pub fn snapshot(&self, symbol: &str) -> Option<BookSnapshot> {
        let key = symbol.trim().to_uppercase();
        self.snapshots.get(&key).map(|entry| entry.value().clone())
    }

    /// The symbols with a stored snapshot.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        self.snapshots
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}
