//! Typed publish/subscribe plumbing between the matching hot path and
//! slower downstream consumers.
//!
//! A single bounded queue decouples producers from subscribers: `publish`
//! is a non-blocking offer that drops the event when the queue is full, so
//! the matching path never waits on a slow consumer. One dispatcher thread
//! drains the queue in FIFO order and invokes subscribers in registration
//! order; a panicking subscriber is caught and logged without affecting
//! subsequent subscribers or events.

use crate::orderbook::{Order, Trade};
use crate::utils::monotonic_time_ns;
use crossbeam::queue::ArrayQueue;
use dashmap::DashMap;
use serde::Serialize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, trace, warn};

/// Default capacity of the event queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// How long the dispatcher sleeps when the queue is empty.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Upper bound on how long `shutdown` waits for the dispatcher to drain.
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_millis(500);

/// The kinds of events subscribers can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    /// An order was accepted by the engine, before matching
    OrderReceived,
    /// An order (or its remainder) rested on the book
    OrderOpen,
    /// An order was completely executed
    OrderFilled,
    /// An order was cancelled
    OrderCancelled,
    /// A trade was executed
    Trade,
}

/// A lifecycle or trade event, carrying the relevant entity plus the
/// publish timestamp.
#[derive(Debug, Clone, Serialize)]
pub enum MarketEvent {
    /// An order was accepted by the engine, before matching
    OrderReceived {
        /// The order as received
        order: Order,
        /// Monotonic publish timestamp in nanoseconds
        published_at_ns: u64,
    },
    /// An order (or its remainder) rested on the book
    OrderOpen {
        /// The resting order
        order: Order,
        /// Monotonic publish timestamp in nanoseconds
        published_at_ns: u64,
    },
    /// An order was completely executed
    OrderFilled {
        /// The filled order
        order: Order,
        /// Monotonic publish timestamp in nanoseconds
        published_at_ns: u64,
    },
    /// An order was cancelled
    OrderCancelled {
        /// The cancelled order
        order: Order,
        /// Monotonic publish timestamp in nanoseconds
        published_at_ns: u64,
    },
    /// A trade was executed
    Trade {
        /// The executed trade
        trade: Trade,
        /// Monotonic publish timestamp in nanoseconds
        published_at_ns: u64,
    },
}

impl MarketEvent {
    /// Wraps an order in an `OrderReceived` event stamped now.
    #[must_use]
    pub fn order_received(order: Order) -> Self {
        MarketEvent::OrderReceived {
            order,
            published_at_ns: monotonic_time_ns(),
        }
    }

    /// Wraps an order in an `OrderOpen` event stamped now.
    #[must_use]
    pub fn order_open(order: Order) -> Self {
        MarketEvent::OrderOpen {
            order,
            published_at_ns: monotonic_time_ns(),
        }
    }

    /// Wraps an order in an `OrderFilled` event stamped now.
    #[must_use]
    pub fn order_filled(order: Order) -> Self {
        MarketEvent::OrderFilled {
            order,
            published_at_ns: monotonic_time_ns(),
        }
    }

    /// Wraps an order in an `OrderCancelled` event stamped now.
    #[must_use]
    pub fn order_cancelled(order: Order) -> Self {
        MarketEvent::OrderCancelled {
            order,
            published_at_ns: monotonic_time_ns(),
        }
    }

    /// Wraps a trade in a `Trade` event stamped now.
    #[must_use]
    pub fn trade(trade: Trade) -> Self {
        MarketEvent::Trade {
            trade,
            published_at_ns: monotonic_time_ns(),
        }
    }

    /// The kind of this event, used for subscription routing.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            MarketEvent::OrderReceived { .. } => EventKind::OrderReceived,
            MarketEvent::OrderOpen { .. } => EventKind::OrderOpen,
            MarketEvent::OrderFilled { .. } => EventKind::OrderFilled,
            MarketEvent::OrderCancelled { .. } => EventKind::OrderCancelled,
            MarketEvent::Trade { .. } => EventKind::Trade,
        }
    }

    /// Monotonic publish timestamp in nanoseconds.
    #[must_use]
    pub fn published_at_ns(&self) -> u64 {
        match self {
            MarketEvent::OrderReceived { published_at_ns, .. }
            | MarketEvent::OrderOpen { published_at_ns, .. }
            | MarketEvent::OrderFilled { published_at_ns, .. }
            | MarketEvent::OrderCancelled { published_at_ns, .. }
            | MarketEvent::Trade { published_at_ns, .. } => *published_at_ns,
        }
    }
}

/// Event subscriber specification using Arc for shared ownership
pub type EventCallback = Arc<dyn Fn(&MarketEvent) + Send + Sync>;

/// Bounded, drop-on-overflow publish/subscribe bus with a single
/// dispatcher thread.
pub struct EventBus {
    queue: Arc<ArrayQueue<MarketEvent>>,
    subscribers: Arc<DashMap<EventKind, Vec<EventCallback>>>,
    running: Arc<AtomicBool>,
    dropped_events: Arc<AtomicU64>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl EventBus {
    /// Creates a bus with the default queue capacity. The dispatcher does
    /// not run until [`EventBus::start`] is called.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates a bus with an explicit queue capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Arc::new(ArrayQueue::new(capacity)),
            subscribers: Arc::new(DashMap::new()),
            running: Arc::new(AtomicBool::new(false)),
            dropped_events: Arc::new(AtomicU64::new(0)),
            dispatcher: Mutex::new(None),
        }
    }

    /// Registers a callback for one event kind. Callbacks for the same
    /// kind run in registration order.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F)
    where
        F: Fn(&MarketEvent) + Send + Sync + 'static,
    {
        self.subscribers
            .entry(kind)
            .or_default()
            .push(Arc::new(callback));
    }

    /// Starts the dispatcher thread. Calling `start` on a running bus is a
    /// no-op.
    pub fn start(&self) {
        let mut slot = self
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        self.running.store(true, Ordering::Release);

        let queue = Arc::clone(&self.queue);
        let subscribers = Arc::clone(&self.subscribers);
        let running = Arc::clone(&self.running);

        let handle = std::thread::Builder::new()
            .name("event-dispatcher".to_string())
            .spawn(move || {
                info!("Event dispatcher started");
                loop {
                    match queue.pop() {
                        Some(event) => Self::deliver(&subscribers, &event),
                        None => {
                            if !running.load(Ordering::Acquire) {
                                break;
                            }
                            std::thread::sleep(IDLE_SLEEP);
                        }
                    }
                }
                info!("Event dispatcher stopped");
            })
            .expect("failed to spawn event dispatcher thread");

        *slot = Some(handle);
    }

    /// Offers an event to the queue without blocking.
    ///
    /// Returns false when the queue was full; the event is dropped and the
    /// drop counter incremented so the matching path never waits.
    pub fn publish(&self, event: MarketEvent) -> bool {
        match self.queue.push(event) {
            Ok(()) => true,
            Err(event) => {
                self.dropped_events.fetch_add(1, Ordering::AcqRel);
                trace!("event queue full, dropping {:?}", event.kind());
                false
            }
        }
    }

    fn deliver(subscribers: &DashMap<EventKind, Vec<EventCallback>>, event: &MarketEvent) {
        // Clone the callback list out of the map so a subscriber that
        // itself subscribes cannot deadlock the dispatcher.
        let callbacks: Vec<EventCallback> = match subscribers.get(&event.kind()) {
            Some(entry) => entry.value().clone(),
            None => return,
        };

        for callback in callbacks {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(event))) {
                error!(
                    "event subscriber panicked on {:?}: {:?}",
                    event.kind(),
                    panic
                );
            }
        }
    }

    /// The number of events dropped because the queue was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Acquire)
    }

    /// The number of events waiting in the queue.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the dispatcher is accepting work.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops the bus: the dispatcher drains the remaining events, then
    /// exits. The join is bounded to roughly 500 ms. Returns the number of
    /// events dropped over the bus's lifetime.
    pub fn shutdown(&self) -> u64 {
        self.running.store(false, Ordering::Release);

        let handle = self
            .dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            let deadline = Instant::now() + SHUTDOWN_JOIN_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(5));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                warn!("event dispatcher did not drain within the shutdown bound");
            }
        }

        let dropped = self.dropped_events();
        info!("Event bus shut down, {dropped} events dropped");
        dropped
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        if self.is_running() {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::Side;

    fn order() -> Order {
        Order::limit("TEST", Side::Buy, 100, 10).unwrap()
    }

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(
            MarketEvent::order_received(order()).kind(),
            EventKind::OrderReceived
        );
        assert_eq!(MarketEvent::order_open(order()).kind(), EventKind::OrderOpen);
        assert_eq!(
            MarketEvent::order_filled(order()).kind(),
            EventKind::OrderFilled
        );
        assert_eq!(
            MarketEvent::order_cancelled(order()).kind(),
            EventKind::OrderCancelled
        );
        assert_eq!(
            MarketEvent::trade(Trade::new(1, "TEST", 1, 2, 100, 5)).kind(),
            EventKind::Trade
        );
    }

    #[test]
    fn test_publish_without_dispatcher_queues() {
        let bus = EventBus::with_capacity(4);
        assert!(bus.publish(MarketEvent::order_received(order())));
        assert_eq!(bus.queue_len(), 1);
        assert_eq!(bus.dropped_events(), 0);
    }

    #[test]
    fn test_overflow_drops_and_counts() {
        let bus = EventBus::with_capacity(2);
        assert!(bus.publish(MarketEvent::order_received(order())));
        assert!(bus.publish(MarketEvent::order_received(order())));
        assert!(!bus.publish(MarketEvent::order_received(order())));
        assert!(!bus.publish(MarketEvent::order_received(order())));
        assert_eq!(bus.dropped_events(), 2);
        assert_eq!(bus.queue_len(), 2);
    }
}
