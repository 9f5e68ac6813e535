//! Behavioral tests for the event bus and the per-submission event
//! ordering contract.

use matchbook_rs::{EventBus, EventKind, Exchange, MarketEvent, Order, Side};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn wait_for(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn sample_order() -> Order {
    Order::limit("TEST", Side::Buy, 100, 10).unwrap()
}

#[test]
fn test_dispatcher_delivers_in_fifo_order() {
    let bus = EventBus::with_capacity(64);
    let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    bus.subscribe(EventKind::Trade, move |event| {
        if let MarketEvent::Trade { trade, .. } = event {
            sink.lock().unwrap().push(trade.id);
        }
    });

    for id in 1..=10u64 {
        bus.publish(MarketEvent::trade(matchbook_rs::Trade::new(
            id, "TEST", 1, 2, 100, 1,
        )));
    }

    bus.start();
    assert!(wait_for(|| seen.lock().unwrap().len() == 10));
    assert_eq!(*seen.lock().unwrap(), (1..=10).collect::<Vec<_>>());
    assert_eq!(bus.shutdown(), 0);
}

#[test]
fn test_subscribers_run_in_registration_order() {
    let bus = EventBus::with_capacity(16);
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let first = Arc::clone(&log);
    bus.subscribe(EventKind::OrderReceived, move |_| {
        first.lock().unwrap().push("first");
    });
    let second = Arc::clone(&log);
    bus.subscribe(EventKind::OrderReceived, move |_| {
        second.lock().unwrap().push("second");
    });

    bus.start();
    bus.publish(MarketEvent::order_received(sample_order()));

    assert!(wait_for(|| log.lock().unwrap().len() == 2));
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    bus.shutdown();
}

#[test]
fn test_overflow_drops_newest_and_reports_at_shutdown() {
    let bus = EventBus::with_capacity(2);

    // No dispatcher yet: the third and fourth offers find the queue full.
    assert!(bus.publish(MarketEvent::order_received(sample_order())));
    assert!(bus.publish(MarketEvent::order_received(sample_order())));
    assert!(!bus.publish(MarketEvent::order_received(sample_order())));
    assert!(!bus.publish(MarketEvent::order_received(sample_order())));
    assert_eq!(bus.dropped_events(), 2);

    bus.start();
    assert_eq!(bus.shutdown(), 2);
}

#[test]
fn test_shutdown_drains_pending_events() {
    let bus = EventBus::with_capacity(256);
    let delivered = Arc::new(AtomicU64::new(0));

    let counter = Arc::clone(&delivered);
    bus.subscribe(EventKind::OrderReceived, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    for _ in 0..100 {
        bus.publish(MarketEvent::order_received(sample_order()));
    }

    bus.start();
    bus.shutdown();
    assert_eq!(delivered.load(Ordering::SeqCst), 100);
}

#[test]
fn test_panicking_subscriber_does_not_poison_the_bus() {
    let bus = EventBus::with_capacity(16);
    let delivered = Arc::new(AtomicU64::new(0));

    bus.subscribe(EventKind::OrderReceived, |_| {
        panic!("subscriber bug");
    });
    let counter = Arc::clone(&delivered);
    bus.subscribe(EventKind::OrderReceived, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    bus.start();
    bus.publish(MarketEvent::order_received(sample_order()));
    bus.publish(MarketEvent::order_received(sample_order()));

    // The second subscriber keeps receiving after the first panics, and
    // the dispatcher survives to handle further events.
    assert!(wait_for(|| delivered.load(Ordering::SeqCst) == 2));
    bus.shutdown();
}

#[test]
fn test_unsubscribed_kinds_are_ignored() {
    let bus = EventBus::with_capacity(16);
    let delivered = Arc::new(AtomicU64::new(0));

    let counter = Arc::clone(&delivered);
    bus.subscribe(EventKind::OrderFilled, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    bus.start();
    bus.publish(MarketEvent::order_received(sample_order()));
    bus.publish(MarketEvent::order_open(sample_order()));

    assert!(wait_for(|| bus.queue_len() == 0));
    assert_eq!(delivered.load(Ordering::SeqCst), 0);
    bus.shutdown();
}

#[test]
fn test_per_submission_event_sequence() {
    let exchange = Exchange::new();
    let log: Arc<Mutex<Vec<(EventKind, u64)>>> = Arc::new(Mutex::new(Vec::new()));

    for kind in [
        EventKind::OrderReceived,
        EventKind::OrderOpen,
        EventKind::OrderFilled,
        EventKind::OrderCancelled,
        EventKind::Trade,
    ] {
        let sink = Arc::clone(&log);
        exchange.subscribe(kind, move |event| {
            let subject_id = match event {
                MarketEvent::OrderReceived { order, .. }
                | MarketEvent::OrderOpen { order, .. }
                | MarketEvent::OrderFilled { order, .. }
                | MarketEvent::OrderCancelled { order, .. } => order.id(),
                MarketEvent::Trade { trade, .. } => trade.id,
            };
            sink.lock().unwrap().push((event.kind(), subject_id));
        });
    }

    let mut sell = Order::limit("TEST", Side::Sell, 100, 50).unwrap();
    exchange.submit(&mut sell).unwrap();
    let mut buy = Order::limit("TEST", Side::Buy, 100, 80).unwrap();
    let trades = exchange.submit(&mut buy).unwrap();
    assert_eq!(trades.len(), 1);

    assert!(wait_for(|| log.lock().unwrap().len() == 5));
    let events = log.lock().unwrap().clone();

    // Seed submission: received then open.
    assert_eq!(events[0], (EventKind::OrderReceived, sell.id()));
    assert_eq!(events[1], (EventKind::OrderOpen, sell.id()));
    // Crossing submission: received, its trade, then the terminal event
    // (the remainder rested, so OrderOpen).
    assert_eq!(events[2], (EventKind::OrderReceived, buy.id()));
    assert_eq!(events[3], (EventKind::Trade, trades[0].id));
    assert_eq!(events[4], (EventKind::OrderOpen, buy.id()));

    exchange.shutdown();
}

#[test]
fn test_terminal_event_matches_outcome() {
    let exchange = Exchange::new();
    let terminals: Arc<Mutex<Vec<(EventKind, u64)>>> = Arc::new(Mutex::new(Vec::new()));

    for kind in [
        EventKind::OrderOpen,
        EventKind::OrderFilled,
        EventKind::OrderCancelled,
    ] {
        let sink = Arc::clone(&terminals);
        exchange.subscribe(kind, move |event| {
            if let MarketEvent::OrderOpen { order, .. }
            | MarketEvent::OrderFilled { order, .. }
            | MarketEvent::OrderCancelled { order, .. } = event
            {
                sink.lock().unwrap().push((event.kind(), order.id()));
            }
        });
    }

    let mut sell = Order::limit("TEST", Side::Sell, 100, 50).unwrap();
    exchange.submit(&mut sell).unwrap();
    let mut filled = Order::limit("TEST", Side::Buy, 100, 50).unwrap();
    exchange.submit(&mut filled).unwrap();
    let mut cancelled = Order::immediate_or_cancel("TEST", Side::Buy, 100, 10).unwrap();
    exchange.submit(&mut cancelled).unwrap();

    assert!(wait_for(|| terminals.lock().unwrap().len() == 3));
    let events = terminals.lock().unwrap().clone();
    assert_eq!(events[0], (EventKind::OrderOpen, sell.id()));
    assert_eq!(events[1], (EventKind::OrderFilled, filled.id()));
    assert_eq!(events[2], (EventKind::OrderCancelled, cancelled.id()));

    exchange.shutdown();
}

#[test]
fn test_direct_cancel_publishes_no_event() {
    let exchange = Exchange::new();
    let cancelled_events = Arc::new(AtomicU64::new(0));

    let counter = Arc::clone(&cancelled_events);
    exchange.subscribe(EventKind::OrderCancelled, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let mut order = Order::limit("TEST", Side::Buy, 100, 10).unwrap();
    exchange.submit(&mut order).unwrap();
    assert!(exchange.cancel("TEST", order.id()));

    // Only a submit ending in cancellation emits OrderCancelled; the
    // direct cancel path stays silent.
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(cancelled_events.load(Ordering::SeqCst), 0);
    exchange.shutdown();
}
