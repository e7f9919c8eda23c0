// ===============================
// src/bin/feed_server.rs
// ===============================
//
// Feed generator untuk testing lokal:
// - Kirim satu Quote (bid 10@18500, ask 12@18510) saat client connect.
// - Lalu Trade terus-menerus (25 @ 32000) tiap `interval_ms`.
// - Timestamp feed maju `step_secs` per paket, mulai dari 1.7e18 ns.
// - `--walk N` : harga trade random-walk ±N tick (0 = harga tetap).
// - `--count N`: tutup koneksi setelah N trade (0 = tanpa batas).
//
use anyhow::Context;
use clap::Parser;
use rand::Rng;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    net::TcpListener,
    time::{sleep, Duration},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vwap_bot_rust::domain::{Quote, Symbol, Trade};
use vwap_bot_rust::window::NANOS_PER_SEC;
use vwap_bot_rust::wire::{encode_quote_frame, encode_trade_frame};

const START_TS: u64 = 1_700_000_000_000_000_000;

#[derive(Parser, Clone, Debug)]
#[command(name = "feed_server", about = "Binary quote/trade feed generator")]
struct Opts {
    #[arg(long, default_value_t = 5000)]
    port: u16,
    #[arg(long, default_value = "IBM")]
    symbol: String,
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,
    #[arg(long, default_value_t = 5)]
    step_secs: u64,
    #[arg(long, default_value_t = 0)]
    walk: u32,
    #[arg(long, default_value_t = 0)]
    count: u64,
    /// Feed time of the first quote, ns since epoch
    #[arg(long, default_value_t = START_TS)]
    start_ts: u64,
}

async fn serve<W: AsyncWrite + Unpin>(mut conn: W, symbol: Symbol, opts: Opts) -> std::io::Result<()> {
    let step = opts.step_secs.saturating_mul(NANOS_PER_SEC);
    let mut ts = opts.start_ts;

    let quote = Quote { symbol, timestamp: ts, bid_quantity: 10, bid_price: 18500, ask_quantity: 12, ask_price: 18510 };
    conn.write_all(&encode_quote_frame(&quote)).await?;
    info!(ts, "sent quote");
    ts = ts.saturating_add(step);

    let mut px: u32 = 32000;
    let mut sent: u64 = 0;
    while opts.count == 0 || sent < opts.count {
        if opts.walk > 0 {
            let w = opts.walk as i64;
            let delta = rand::thread_rng().gen_range(-w..=w);
            px = (px as i64 + delta).clamp(1, u32::MAX as i64) as u32;
        }
        let trade = Trade { symbol, timestamp: ts, quantity: 25, price: px };
        conn.write_all(&encode_trade_frame(&trade)).await?;
        info!(ts, px, "sent trade");
        ts = ts.saturating_add(step);
        sent += 1;
        sleep(Duration::from_millis(opts.interval_ms)).await;
    }
    conn.shutdown().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();
    let symbol = Symbol::parse(&opts.symbol)?;
    let listener = TcpListener::bind(("0.0.0.0", opts.port))
        .await
        .with_context(|| format!("bind port {}", opts.port))?;
    info!(port = opts.port, %symbol, "feed server listening");

    loop {
        let (conn, peer) = listener.accept().await?;
        info!(%peer, "client connected");
        let opts = opts.clone();
        tokio::spawn(async move {
            match serve(conn, symbol, opts).await {
                Ok(()) => info!(%peer, "feed finished"),
                Err(e) => error!(%peer, ?e, "client dropped"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vwap_bot_rust::codec::FrameReader;
    use vwap_bot_rust::domain::FeedEvent;

    fn opts(start_ts: u64, count: u64) -> Opts {
        Opts { port: 0, symbol: "IBM".into(), interval_ms: 0, step_secs: 5, walk: 0, count, start_ts }
    }

    async fn timestamps(bytes: &[u8]) -> Vec<u64> {
        let mut reader = FrameReader::new(bytes);
        let mut out = Vec::new();
        while let Ok(ev) = reader.next_event().await {
            out.push(ev.timestamp());
        }
        out
    }

    #[tokio::test]
    async fn quote_then_trades_step_feed_time() {
        let mut buf = Vec::new();
        serve(&mut buf, Symbol::parse("IBM").unwrap(), opts(START_TS, 2)).await.unwrap();

        let mut reader = FrameReader::new(&buf[..]);
        assert!(matches!(reader.next_event().await.unwrap(), FeedEvent::Quote(_)));
        assert_eq!(timestamps(&buf).await, [START_TS, START_TS + 5 * NANOS_PER_SEC, START_TS + 10 * NANOS_PER_SEC]);
    }

    #[tokio::test]
    async fn feed_time_saturates_at_u64_max() {
        let mut buf = Vec::new();
        serve(&mut buf, Symbol::parse("IBM").unwrap(), opts(u64::MAX - 1, 3)).await.unwrap();
        assert_eq!(timestamps(&buf).await, [u64::MAX - 1, u64::MAX, u64::MAX, u64::MAX]);
    }
}
