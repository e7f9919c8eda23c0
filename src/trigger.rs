// ===============================
// src/trigger.rs
// ===============================
//
// Order trigger, dijalankan setiap kali window VWAP tertutup.
//   Buy  : ambil ask, fire jika ask_price < vwap
//   Sell : ambil bid, fire jika bid_price > vwap
// Fires only when the candidate quantity is > 0. Qty dipotong ke max_order_size.
//
use crate::domain::{Order, Quote, Side, StrategyConfig};

/// Pure decision: `ts` is the timestamp of the trade that closed the window.
pub fn evaluate(cfg: &StrategyConfig, quote: &Quote, vwap: f64, ts: u64) -> Option<Order> {
    let (price, quantity, better) = match cfg.side {
        Side::Buy => (quote.ask_price, quote.ask_quantity, f64::from(quote.ask_price) < vwap),
        Side::Sell => (quote.bid_price, quote.bid_quantity, f64::from(quote.bid_price) > vwap),
    };

    if quantity == 0 || !better {
        return None;
    }

    Some(Order {
        symbol: cfg.symbol,
        timestamp: ts,
        side: cfg.side,
        quantity: quantity.min(cfg.max_order_size),
        price,
    })
}

/// Kurangi likuiditas quote yang sudah "dipakai" oleh order.
pub fn consume(quote: &mut Quote, order: &Order) {
    match order.side {
        Side::Buy => quote.ask_quantity = quote.ask_quantity.saturating_sub(order.quantity),
        Side::Sell => quote.bid_quantity = quote.bid_quantity.saturating_sub(order.quantity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(side: Side) -> StrategyConfig { StrategyConfig::new("IBM", side, 10, 5).unwrap() }

    fn quote() -> Quote {
        Quote { symbol: cfg(Side::Buy).symbol, timestamp: 1, bid_quantity: 10, bid_price: 18500, ask_quantity: 12, ask_price: 18510 }
    }

    #[test]
    fn buy_fires_below_vwap_and_caps_quantity() {
        let o = evaluate(&cfg(Side::Buy), &quote(), 32000.0, 99).unwrap();
        assert_eq!((o.side, o.price, o.quantity, o.timestamp), (Side::Buy, 18510, 10, 99));
        assert_eq!(o.symbol, cfg(Side::Buy).symbol);
    }

    #[test]
    fn buy_is_strict_comparison() {
        assert!(evaluate(&cfg(Side::Buy), &quote(), 18510.0, 1).is_none());
        assert!(evaluate(&cfg(Side::Buy), &quote(), 15000.0, 1).is_none());
        assert!(evaluate(&cfg(Side::Buy), &quote(), 18510.5, 1).is_some());
    }

    #[test]
    fn sell_fires_above_vwap() {
        let o = evaluate(&cfg(Side::Sell), &quote(), 18000.0, 1).unwrap();
        assert_eq!((o.side, o.price, o.quantity), (Side::Sell, 18500, 10));
        assert!(evaluate(&cfg(Side::Sell), &quote(), 18500.0, 1).is_none());
        assert!(evaluate(&cfg(Side::Sell), &quote(), 32000.0, 1).is_none());
    }

    #[test]
    fn zero_quantity_never_fires() {
        let mut q = quote();
        q.ask_quantity = 0;
        assert!(evaluate(&cfg(Side::Buy), &q, 1e9, 1).is_none());
        q.bid_quantity = 0;
        assert!(evaluate(&cfg(Side::Sell), &q, 0.0, 1).is_none());
    }

    #[test]
    fn small_quote_is_not_padded_up() {
        let mut q = quote();
        q.ask_quantity = 3;
        assert_eq!(evaluate(&cfg(Side::Buy), &q, 32000.0, 1).unwrap().quantity, 3);
    }

    #[test]
    fn consume_decrements_the_taken_side() {
        let mut q = quote();
        let o = evaluate(&cfg(Side::Buy), &q, 32000.0, 1).unwrap();
        consume(&mut q, &o);
        assert_eq!((q.ask_quantity, q.bid_quantity), (2, 10));
        consume(&mut q, &o);
        assert_eq!(q.ask_quantity, 0);
    }
}
