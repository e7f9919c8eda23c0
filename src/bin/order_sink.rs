// ===============================
// src/bin/order_sink.rs
// ===============================
//
// Order receiver untuk testing: terima record Order 25 byte (tanpa header)
// dan log setiap order sampai peer menutup koneksi.
//
use anyhow::Context;
use clap::Parser;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    net::TcpListener,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vwap_bot_rust::domain::Order;
use vwap_bot_rust::wire::ORDER_LEN;

#[derive(Parser, Debug)]
#[command(name = "order_sink", about = "Prints fixed-width orders sent by the engine")]
struct Opts {
    #[arg(long, default_value_t = 5001)]
    port: u16,
}

/// What one engine connection delivered.
#[derive(Debug, Default, PartialEq, Eq)]
struct Drained {
    orders: u64,
    undecodable: u64,
    /// bytes of an incomplete record left when the peer closed
    trailing: usize,
}

async fn drain<R: AsyncRead + Unpin>(mut conn: R) -> std::io::Result<Drained> {
    let mut buf = [0u8; ORDER_LEN];
    let mut out = Drained::default();
    loop {
        let mut filled = 0;
        while filled < ORDER_LEN {
            let n = conn.read(&mut buf[filled..]).await?;
            if n == 0 {
                out.trailing = filled;
                return Ok(out);
            }
            filled += n;
        }
        match Order::decode(&buf) {
            Ok(o) => {
                out.orders += 1;
                info!(
                    symbol = %o.symbol,
                    ts = o.timestamp,
                    side = ?o.side,
                    qty = o.quantity,
                    px = o.price,
                    "received order"
                );
            }
            Err(e) => {
                out.undecodable += 1;
                warn!(%e, "undecodable order record");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();
    let listener = TcpListener::bind(("0.0.0.0", opts.port))
        .await
        .with_context(|| format!("bind port {}", opts.port))?;
    info!(port = opts.port, "order sink listening");

    loop {
        let (conn, peer) = listener.accept().await?;
        info!(%peer, "engine connected");
        tokio::spawn(async move {
            match drain(conn).await {
                Ok(d) if d.trailing > 0 => warn!(
                    %peer,
                    orders = d.orders,
                    trailing = d.trailing,
                    expected = ORDER_LEN,
                    "engine disconnected mid-record, truncated order dropped"
                ),
                Ok(d) => info!(%peer, orders = d.orders, undecodable = d.undecodable, "engine disconnected"),
                Err(e) => error!(%peer, error = %e, "order connection failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vwap_bot_rust::domain::{Side, Symbol};

    fn order_bytes(side: Side) -> [u8; ORDER_LEN] {
        Order { symbol: Symbol::parse("IBM").unwrap(), timestamp: 7, side, quantity: 10, price: 18510 }.encode()
    }

    #[tokio::test]
    async fn whole_records_close_cleanly() {
        let mut bytes = order_bytes(Side::Buy).to_vec();
        bytes.extend_from_slice(&order_bytes(Side::Sell));
        assert_eq!(drain(&bytes[..]).await.unwrap(), Drained { orders: 2, undecodable: 0, trailing: 0 });
    }

    #[tokio::test]
    async fn partial_trailing_record_is_reported() {
        let mut bytes = order_bytes(Side::Buy).to_vec();
        bytes.extend_from_slice(&order_bytes(Side::Sell)[..17]);
        assert_eq!(drain(&bytes[..]).await.unwrap(), Drained { orders: 1, undecodable: 0, trailing: 17 });
    }

    #[tokio::test]
    async fn bad_side_byte_is_counted() {
        let mut bytes = order_bytes(Side::Buy);
        bytes[16] = b'X';
        assert_eq!(drain(&bytes[..]).await.unwrap(), Drained { orders: 0, undecodable: 1, trailing: 0 });
    }
}
