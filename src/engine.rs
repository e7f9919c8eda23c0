// ===============================
// src/engine.rs
// ===============================
//
// Driver loop (single task, strictly sequential):
//   read header -> read body -> update state -> (maybe) write one Order
// Window + LatestQuote hanya dimutasi di sini, jadi tidak perlu lock.
//
use serde::Serialize;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::codec::{FrameReader, OrderWriter};
use crate::domain::{FeedEvent, Order, Quote, StrategyConfig};
use crate::error::{EngineError, FeedError, WindowError};
use crate::metrics::{
    FEED_IDLE, FRAMES, FRAMES_IGNORED, FRAMING_ERRORS, JOURNAL_DROPPED, LAST_VWAP, ORDERS, WINDOWS_CLOSED,
};
use crate::recorder::Event;
use crate::trigger;
use crate::window::{Phase, VwapWindow};

/// Why the loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    EndOfStream,
    ZeroLengthHeader,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub quotes: u64,
    pub trades: u64,
    pub ignored: u64,
    pub windows: u64,
    pub orders: u64,
    pub journal_dropped: u64,
}

pub struct Engine {
    cfg: StrategyConfig,
    window: VwapWindow,
    latest_quote: Option<Quote>,
    journal: Option<mpsc::Sender<Event>>,
    stats: Stats,
}

impl Engine {
    pub fn new(cfg: StrategyConfig) -> Self {
        let window = VwapWindow::new(cfg.vwap_window_period);
        Self { cfg, window, latest_quote: None, journal: None, stats: Stats::default() }
    }

    pub fn with_journal(mut self, tx: mpsc::Sender<Event>) -> Self {
        self.journal = Some(tx);
        self
    }

    pub fn config(&self) -> &StrategyConfig { &self.cfg }
    pub fn latest_quote(&self) -> Option<&Quote> { self.latest_quote.as_ref() }
    pub fn window(&self) -> &VwapWindow { &self.window }
    pub fn stats(&self) -> Stats { self.stats }

    fn record(&mut self, ev: Event) {
        let Some(tx) = &self.journal else { return };
        match tx.try_send(ev) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.stats.journal_dropped += 1;
                JOURNAL_DROPPED.inc();
                // log drop pertama, lalu tiap 1000
                if self.stats.journal_dropped % 1000 == 1 {
                    warn!(dropped = self.stats.journal_dropped, "journal channel full, event dropped");
                }
            }
            Err(TrySendError::Closed(_)) => {
                warn!("journal receiver gone, recording disabled");
                self.journal = None;
            }
        }
    }

    /// Lifecycle line for the journal (connects, stops, errors, reconnects).
    pub fn note(&mut self, msg: impl Into<String>) {
        self.record(Event::Note(msg.into()));
    }

    /// Apply one decoded event. Returns the order to send, if the window
    /// closed and the trigger fired.
    pub fn on_event(&mut self, event: FeedEvent) -> Result<Option<Order>, WindowError> {
        if event.symbol() != &self.cfg.symbol {
            self.stats.ignored += 1;
            FRAMES_IGNORED.inc();
            debug!(symbol = %event.symbol(), kind = event.msg_type().label(), "foreign symbol, skipped");
            return Ok(None);
        }

        let trade = match event {
            FeedEvent::Quote(q) => {
                self.stats.quotes += 1;
                debug!(ts = q.timestamp, bid = q.bid_price, ask = q.ask_price, "quote");
                self.latest_quote = Some(q);
                self.record(Event::Quote(q));
                return Ok(None);
            }
            FeedEvent::Trade(t) => t,
        };

        self.stats.trades += 1;
        self.record(Event::Trade(trade));
        if self.window.on_trade(&trade, self.latest_quote.is_some()) == Phase::Accumulating {
            debug!(ts = trade.timestamp, q_sum = self.window.q_sum(), "trade accumulated");
            return Ok(None);
        }

        let closed = self.window.take_vwap()?;
        self.stats.windows += 1;
        WINDOWS_CLOSED.inc();
        LAST_VWAP.set(closed.vwap);
        info!(vwap = closed.vwap, trades = closed.trades, q_sum = closed.q_sum, "vwap window closed");
        self.record(Event::Window(closed));

        let Some(quote) = self.latest_quote.as_mut() else {
            return Ok(None);
        };
        let order = trigger::evaluate(&self.cfg, quote, closed.vwap, closed.close_ts);
        match &order {
            Some(o) if self.cfg.consume_liquidity => trigger::consume(quote, o),
            Some(_) => {}
            None => debug!(vwap = closed.vwap, "trigger condition not met"),
        }
        Ok(order)
    }

    /// Run until the feed ends or fails. Idle timeouts (if set) only apply at a
    /// frame boundary and never abort the loop.
    pub async fn run<R, W>(
        &mut self,
        feed: &mut FrameReader<R>,
        sink: &mut OrderWriter<W>,
        idle: Option<Duration>,
    ) -> Result<Stop, EngineError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            if let Some(idle) = idle {
                match feed.wait_frame(idle).await {
                    Ok(true) => {}
                    Ok(false) => {
                        FEED_IDLE.inc();
                        warn!(idle_secs = idle.as_secs_f64(), "feed idle, waiting for next header");
                        continue;
                    }
                    Err(e) => return Err(self.fail(feed.frames_read() + 1, e)),
                }
            }

            let event = match feed.next_event().await {
                Ok(ev) => ev,
                Err(FeedError::EndOfStream) => return Ok(self.stopped(Stop::EndOfStream, feed.frames_read())),
                Err(FeedError::ZeroLengthHeader) => return Ok(self.stopped(Stop::ZeroLengthHeader, feed.frames_read())),
                Err(e) => {
                    if matches!(e, FeedError::Framing(_)) {
                        FRAMING_ERRORS.inc();
                    }
                    return Err(self.fail(feed.frames_read() + 1, e));
                }
            };
            FRAMES.with_label_values(&[event.msg_type().label()]).inc();

            if let Some(order) = self.on_event(event)? {
                sink.send(&order).await.map_err(EngineError::OrderSink)?;
                self.stats.orders += 1;
                ORDERS.inc();
                info!(
                    symbol = %order.symbol,
                    side = ?order.side,
                    qty = order.quantity,
                    px = order.price,
                    ts = order.timestamp,
                    "order sent"
                );
                self.record(Event::Order(order));
            }
        }
    }

    fn stopped(&mut self, stop: Stop, frames: u64) -> Stop {
        self.note(format!("feed stopped: {stop:?} after {frames} frames"));
        stop
    }

    fn fail(&mut self, frame: u64, source: FeedError) -> EngineError {
        self.note(format!("feed frame #{frame} failed: {source}"));
        EngineError::Feed { frame, source }
    }
}
