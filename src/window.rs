// ===============================
// src/window.rs
// ===============================
//
// VWAP window (event-time, bukan wall-clock).
//
//   Accumulating --(matching trade, quote present, q_sum > 0,
//                   elapsed >= period)--> Ready
//   Ready --take_vwap()--> Accumulating (sums cleared, start = closing trade ts)
//
// Elapsed time is compared in integer nanoseconds:
//   (ts - start) / 1e9 >= period  <=>  ts - start >= period * 1e9
//
use serde::Serialize;

use crate::domain::Trade;
use crate::error::WindowError;

pub const NANOS_PER_SEC: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase { Accumulating, Ready }

/// Result of consuming a Ready window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClosedWindow {
    pub vwap: f64,
    pub pq_sum: u128,
    pub q_sum: u64,
    pub trades: u32,
    pub start_ts: u64,
    pub close_ts: u64,
}

#[derive(Debug, Clone)]
pub struct VwapWindow {
    period_ns: u64,
    pq_sum: u128,
    q_sum: u64,
    trades: u32,
    window_start: Option<u64>,
    last_ts: u64,
    trade_seen: bool,
    phase: Phase,
}

impl VwapWindow {
    pub fn new(period_secs: u32) -> Self {
        Self {
            period_ns: u64::from(period_secs).saturating_mul(NANOS_PER_SEC),
            pq_sum: 0,
            q_sum: 0,
            trades: 0,
            window_start: None,
            last_ts: 0,
            trade_seen: false,
            phase: Phase::Accumulating,
        }
    }

    pub fn phase(&self) -> Phase { self.phase }
    pub fn window_start(&self) -> Option<u64> { self.window_start }
    pub fn trade_seen(&self) -> bool { self.trade_seen }
    pub fn q_sum(&self) -> u64 { self.q_sum }
    pub fn pq_sum(&self) -> u128 { self.pq_sum }

    /// Tambahkan trade (symbol sudah difilter oleh caller) lalu evaluasi penutupan.
    /// `quote_present` is whether a LatestQuote exists at this instant.
    pub fn on_trade(&mut self, trade: &Trade, quote_present: bool) -> Phase {
        if self.phase == Phase::Ready {
            // caller skipped take_vwap; keep the closed sums intact
            return self.phase;
        }

        self.pq_sum += u128::from(trade.price) * u128::from(trade.quantity);
        self.q_sum += u64::from(trade.quantity);
        self.trades = self.trades.saturating_add(1);
        self.trade_seen = true;
        self.last_ts = trade.timestamp;
        let start = *self.window_start.get_or_insert(trade.timestamp);

        let elapsed_ns = trade.timestamp.saturating_sub(start);
        if quote_present && self.trade_seen && self.q_sum > 0 && elapsed_ns >= self.period_ns {
            self.phase = Phase::Ready;
        }
        self.phase
    }

    /// Consume a Ready window: vwap = pq_sum / q_sum (real division), then reset.
    pub fn take_vwap(&mut self) -> Result<ClosedWindow, WindowError> {
        if self.phase != Phase::Ready {
            return Err(WindowError::NotReady);
        }
        if self.q_sum == 0 {
            return Err(WindowError::EmptyWindow);
        }

        let closed = ClosedWindow {
            vwap: self.pq_sum as f64 / self.q_sum as f64,
            pq_sum: self.pq_sum,
            q_sum: self.q_sum,
            trades: self.trades,
            start_ts: self.window_start.unwrap_or(self.last_ts),
            close_ts: self.last_ts,
        };
        self.reset(Some(self.last_ts));
        Ok(closed)
    }

    fn reset(&mut self, start: Option<u64>) {
        self.pq_sum = 0;
        self.q_sum = 0;
        self.trades = 0;
        self.trade_seen = false;
        // start tidak boleh mundur
        self.window_start = match (start, self.window_start) {
            (Some(new), Some(old)) => Some(new.max(old)),
            (new, _) => new,
        };
        self.phase = Phase::Accumulating;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Symbol;

    const T0: u64 = 1_700_000_000_000_000_000;

    fn trade(offset_secs: u64, qty: u32, px: u32) -> Trade {
        Trade { symbol: Symbol::parse("IBM").unwrap(), timestamp: T0 + offset_secs * NANOS_PER_SEC, quantity: qty, price: px }
    }

    #[test]
    fn closes_exactly_when_period_elapses() {
        let mut w = VwapWindow::new(5);
        for s in 0..5 {
            assert_eq!(w.on_trade(&trade(s, 1, 100), true), Phase::Accumulating, "closed early at {s}s");
        }
        assert_eq!(w.on_trade(&trade(5, 1, 100), true), Phase::Ready);
    }

    #[test]
    fn truncates_sub_second_elapsed() {
        let mut w = VwapWindow::new(1);
        w.on_trade(&trade(0, 1, 100), true);
        let mut almost = trade(0, 1, 100);
        almost.timestamp = T0 + NANOS_PER_SEC - 1;
        assert_eq!(w.on_trade(&almost, true), Phase::Accumulating);
    }

    #[test]
    fn vwap_is_real_division() {
        let mut w = VwapWindow::new(1);
        w.on_trade(&trade(0, 1, 10), true);
        w.on_trade(&trade(0, 2, 11), true);
        assert_eq!(w.on_trade(&trade(1, 0, 50), true), Phase::Ready);
        let closed = w.take_vwap().unwrap();
        assert_eq!(closed.pq_sum, 32);
        assert_eq!(closed.q_sum, 3);
        assert!((closed.vwap - 32.0 / 3.0).abs() < 1e-12);
        assert_eq!(closed.trades, 3);
    }

    #[test]
    fn needs_quote_before_ready() {
        let mut w = VwapWindow::new(0);
        assert_eq!(w.on_trade(&trade(0, 5, 100), false), Phase::Accumulating);
        assert_eq!(w.take_vwap(), Err(WindowError::NotReady));
        assert_eq!(w.on_trade(&trade(1, 5, 100), true), Phase::Ready);
        assert_eq!(w.take_vwap().unwrap().q_sum, 10);
    }

    #[test]
    fn zero_quantity_window_never_ready() {
        let mut w = VwapWindow::new(1);
        for s in 0..10 {
            assert_eq!(w.on_trade(&trade(s, 0, 100), true), Phase::Accumulating);
        }
        assert!(w.trade_seen());
        assert_eq!(w.take_vwap(), Err(WindowError::NotReady));
    }

    #[test]
    fn reset_restarts_from_closing_trade() {
        let mut w = VwapWindow::new(5);
        w.on_trade(&trade(0, 25, 32000), true);
        w.on_trade(&trade(5, 25, 32000), true);
        let closed = w.take_vwap().unwrap();
        assert_eq!(closed.start_ts, T0);
        assert_eq!(closed.close_ts, T0 + 5 * NANOS_PER_SEC);

        assert_eq!(w.phase(), Phase::Accumulating);
        assert_eq!((w.pq_sum(), w.q_sum(), w.trade_seen()), (0, 0, false));
        assert_eq!(w.window_start(), Some(T0 + 5 * NANOS_PER_SEC));

        assert_eq!(w.on_trade(&trade(9, 1, 1), true), Phase::Accumulating);
        assert_eq!(w.on_trade(&trade(10, 1, 1), true), Phase::Ready);
    }

    #[test]
    fn backwards_timestamp_does_not_underflow() {
        let mut w = VwapWindow::new(1);
        w.on_trade(&trade(10, 1, 1), true);
        assert_eq!(w.on_trade(&trade(3, 1, 1), true), Phase::Accumulating);
    }

    #[test]
    fn trade_count_saturates() {
        let mut w = VwapWindow::new(0);
        w.trades = u32::MAX - 1;
        w.on_trade(&trade(0, 1, 1), false);
        assert_eq!(w.on_trade(&trade(1, 1, 1), true), Phase::Ready);
        let closed = w.take_vwap().unwrap();
        assert_eq!(closed.trades, u32::MAX);
        assert_eq!(closed.q_sum, 2);
    }
}
