// ===============================
// src/main.rs
// ===============================
/*
 # jalankan feed generator + order sink, lalu engine:
 cargo run --bin feed_server -- --port 5000
 cargo run --bin order_sink  -- --port 5001
 SYMBOL=IBM SIDE=B MAX_ORDER_SIZE=10 VWAP_WINDOW_SECS=5 cargo run --bin vwap_bot_rust

 curl -s localhost:9898/metrics | grep -E '^(vwap_|orders_|feed_)'   # jika METRICS_PORT=9898
*/
/*
=============================================================================
Project : vwap_bot_rust — single-instrument VWAP trigger engine in Rust
Module  : main.rs
Version : 0.1.0
Author  : Kukuh Tripamungkas Wicaksono (Kukuh TW)
License : MIT (see LICENSE)

Summary : Decodes a binary quote/trade feed, keeps an event-time VWAP window
          and sends a fixed-width order when the best quote beats the VWAP.

(c) 2025 Kukuh TW. All rights reserved where applicable.
=============================================================================
*/
use anyhow::Context;
use rand::Rng;
use tokio::{net::TcpStream, sync::mpsc, time::{sleep, Duration}};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vwap_bot_rust::codec::{FrameReader, OrderWriter};
use vwap_bot_rust::config::{self, Args};
use vwap_bot_rust::engine::Engine;
use vwap_bot_rust::{metrics, recorder};

// Single task: decode, evaluate and send are sequential steps of one loop.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // ---- Logging ----
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ---- Load config ----
    let (args, strategy) = config::load().context("invalid configuration")?;
    info!(
        symbol = %strategy.symbol,
        side = ?strategy.side,
        max_order_size = strategy.max_order_size,
        vwap_window_secs = strategy.vwap_window_period,
        consume_liquidity = strategy.consume_liquidity,
        feed = %args.feed_addr(),
        order = %args.order_addr(),
        "startup config"
    );

    // ---- Metrics ----
    metrics::init();
    if args.metrics_port != 0 {
        metrics::serve_metrics(args.metrics_port)
            .with_context(|| format!("metrics bind port {}", args.metrics_port))?;
    }

    // ---- Recorder (optional) ----
    let mut engine = Engine::new(strategy);
    let mut recorder_task = None;
    if let Some(path) = args.record_file.clone() {
        let (tx, rx) = mpsc::channel::<recorder::Event>(8192);
        engine = engine.with_journal(tx);
        recorder_task = Some(tokio::spawn(recorder::run(rx, path)));
    }

    // ---- Order sink ----
    let order_addr = args.order_addr();
    let order_stream = TcpStream::connect(&order_addr)
        .await
        .with_context(|| format!("connect order sink {order_addr}"))?;
    order_stream.set_nodelay(true)?;
    info!(%order_addr, "order sink connected");
    let mut sink = OrderWriter::new(order_stream);

    // ---- Feed loop ----
    let outcome = run_feed(&args, &mut engine, &mut sink).await;
    if let Err(e) = &outcome {
        let chain = format!("{e:#}");
        error!(error = %chain, "feed loop stopped on error");
    }
    info!(stats = ?engine.stats(), orders_written = sink.orders_sent(), "engine stopped");

    // tutup journal agar recorder flush
    drop(engine);
    if let Some(task) = recorder_task {
        let _ = task.await;
    }
    outcome
}

async fn run_feed(args: &Args, engine: &mut Engine, sink: &mut OrderWriter<TcpStream>) -> anyhow::Result<()> {
    let feed_addr = args.feed_addr();
    let mut attempt: u32 = 0;
    loop {
        match TcpStream::connect(&feed_addr).await {
            Ok(stream) => {
                info!(%feed_addr, attempt, "feed connected");
                engine.note(format!("feed connected {feed_addr} (attempt {attempt})"));
                let mut feed = FrameReader::new(stream);
                let stop = engine
                    .run(&mut feed, sink, args.feed_idle_timeout())
                    .await
                    .with_context(|| format!("feed {feed_addr}"))?;
                info!(?stop, frames = feed.frames_read(), "feed closed");
            }
            Err(e) if attempt > 0 => {
                warn!(?e, %feed_addr, "feed reconnect failed");
                engine.note(format!("feed reconnect {attempt} failed: {e}"));
            }
            Err(e) => return Err(e).with_context(|| format!("connect feed {feed_addr}")),
        }

        if attempt >= args.reconnect_attempts {
            return Ok(());
        }
        attempt += 1;
        let delay = backoff_delay(attempt);
        warn!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting feed");
        engine.note(format!("reconnect attempt {attempt} in {} ms", delay.as_millis()));
        sleep(delay).await;
    }
}

// Exponential backoff + jitter
fn backoff_delay(attempt: u32) -> Duration {
    let shift = attempt.min(6); // 0..=6
    let factor = 1u64 << shift; // 1,2,4,...,64
    let base_ms = 500u64.saturating_mul(factor); // 0.5s..32s
    let jitter = rand::thread_rng().gen_range(0..=250);
    Duration::from_millis(base_ms + jitter)
}
