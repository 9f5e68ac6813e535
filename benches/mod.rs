//! Criterion benchmarks for the matching hot path.

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use matchbook_rs::{Order, OrderBook, Side};
use std::hint::black_box;

/// Seeds one ask level per price in `[base, base + levels)`.
fn seeded_book(base: u128, levels: u128, quantity_per_level: u64) -> OrderBook {
    let book = OrderBook::new("BENCH");
    for offset in 0..levels {
        let mut order =
            Order::limit("BENCH", Side::Sell, base + offset, quantity_per_level).unwrap();
        book.add_order(&mut order).unwrap();
    }
    book
}

fn bench_add_resting_orders(c: &mut Criterion) {
    c.bench_function("add_resting_limit_orders", |b| {
        b.iter_batched(
            || OrderBook::new("BENCH"),
            |book| {
                for price in 0..100u128 {
                    let mut order = Order::limit("BENCH", Side::Buy, 1 + price, 10).unwrap();
                    book.add_order(&mut order).unwrap();
                }
                black_box(book.bid_depth())
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_aggressive_sweep(c: &mut Criterion) {
    c.bench_function("sweep_20_levels", |b| {
        b.iter_batched(
            || seeded_book(1_000, 20, 50),
            |book| {
                let mut taker = Order::limit("BENCH", Side::Buy, 1_020, 1_000).unwrap();
                let trades = book.add_order(&mut taker).unwrap();
                black_box(trades.len())
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_fok_dry_run(c: &mut Criterion) {
    c.bench_function("fok_dry_run_measure", |b| {
        let book = seeded_book(1_000, 50, 50);
        b.iter(|| black_box(book.available_quantity(Side::Buy, 1_050, 2_000)));
    });
}

fn bench_cancel(c: &mut Criterion) {
    c.bench_function("cancel_resting_order", |b| {
        b.iter_batched(
            || {
                let book = OrderBook::new("BENCH");
                let mut order = Order::limit("BENCH", Side::Buy, 100, 10).unwrap();
                book.add_order(&mut order).unwrap();
                (book, order.id())
            },
            |(book, order_id)| black_box(book.cancel_order(order_id)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_add_resting_orders,
    bench_aggressive_sweep,
    bench_fok_dry_run,
    bench_cancel
);
criterion_main!(benches);
