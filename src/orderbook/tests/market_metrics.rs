//! Tests for market data accessors on the book

#[cfg(test)]
mod tests {
    use crate::orderbook::{Order, OrderBook, Side};

    fn add_limit(book: &OrderBook, side: Side, price: u128, quantity: u64) {
        let mut order = Order::limit("TEST", side, price, quantity).unwrap();
        book.add_order(&mut order).unwrap();
    }

    #[test]
    fn test_best_prices() {
        let book = OrderBook::new("TEST");
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);

        add_limit(&book, Side::Buy, 99, 10);
        add_limit(&book, Side::Buy, 98, 10);
        add_limit(&book, Side::Sell, 101, 10);
        add_limit(&book, Side::Sell, 103, 10);

        assert_eq!(book.best_bid(), Some(99));
        assert_eq!(book.best_ask(), Some(101));
    }

    #[test]
    fn test_spread_and_mid() {
        let book = OrderBook::new("TEST");
        assert_eq!(book.spread(), None);
        assert_eq!(book.mid_price(), None);

        add_limit(&book, Side::Buy, 99, 10);
        assert_eq!(book.spread(), None);

        add_limit(&book, Side::Sell, 103, 10);
        assert_eq!(book.spread(), Some(4));
        assert_eq!(book.mid_price(), Some(101.0));
    }

    #[test]
    fn test_depth_counts_orders_not_quantity() {
        let book = OrderBook::new("TEST");
        add_limit(&book, Side::Buy, 99, 1_000);
        add_limit(&book, Side::Buy, 99, 1);
        add_limit(&book, Side::Buy, 98, 1);
        add_limit(&book, Side::Sell, 101, 500);

        assert_eq!(book.bid_depth(), 3);
        assert_eq!(book.ask_depth(), 1);
        assert_eq!(book.total_bid_quantity(), 1_002);
        assert_eq!(book.total_ask_quantity(), 500);
    }

    #[test]
    fn test_vwap_and_volume_identities() {
        let book = OrderBook::new("TEST");
        assert_eq!(book.vwap(), 0.0);
        assert_eq!(book.last_trade_price(), None);

        add_limit(&book, Side::Sell, 100, 100);
        add_limit(&book, Side::Sell, 102, 100);

        let mut buy = Order::limit("TEST", Side::Buy, 102, 200).unwrap();
        let trades = book.add_order(&mut buy).unwrap();
        assert_eq!(trades.len(), 2);

        // total_volume = sum of trade quantities
        let volume: u64 = trades.iter().map(|trade| trade.quantity).sum();
        assert_eq!(book.total_volume(), volume);

        // total_turnover = sum of price * quantity
        let turnover: u128 = trades.iter().map(|trade| trade.notional()).sum();
        assert_eq!(book.total_turnover(), turnover);

        // vwap = turnover / volume = (100*100 + 102*100) / 200
        assert_eq!(book.vwap(), 101.0);
        assert_eq!(book.last_trade_price(), Some(102));
        assert_eq!(book.trade_count(), 2);
    }

    #[test]
    fn test_trade_history_order() {
        let book = OrderBook::new("TEST");
        add_limit(&book, Side::Sell, 100, 10);
        add_limit(&book, Side::Sell, 101, 10);

        let mut buy = Order::limit("TEST", Side::Buy, 101, 20).unwrap();
        book.add_order(&mut buy).unwrap();

        let history = book.trades();
        assert_eq!(history.len(), 2);
        assert!(history[0].id < history[1].id);
        assert!(history[0].timestamp_ns <= history[1].timestamp_ns);
        assert_eq!(history[0].price, 100);
        assert_eq!(history[1].price, 101);
    }

    #[test]
    fn test_symbol_uppercased() {
        let book = OrderBook::new("btc/usd");
        assert_eq!(book.symbol(), "BTC/USD");
    }
}
