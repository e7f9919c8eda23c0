// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static FRAMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(Opts::new("feed_frames_total", "decoded feed frames (label: type)"), &["type"])
        .unwrap()
});

pub static FRAMES_IGNORED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("feed_frames_ignored_total", "frames for other symbols").unwrap()
});

pub static FRAMING_ERRORS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("feed_framing_errors_total", "malformed frames").unwrap());

pub static FEED_IDLE: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("feed_idle_timeouts_total", "idle timeouts at frame boundary").unwrap());

pub static WINDOWS_CLOSED: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("vwap_windows_closed_total", "closed vwap windows").unwrap());

pub static LAST_VWAP: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("vwap_last", "vwap of the last closed window").unwrap());

pub static ORDERS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("orders_sent_total", "orders written to the order sink").unwrap());

pub static JOURNAL_DROPPED: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("journal_dropped_total", "journal events dropped on a full channel").unwrap());

pub fn init() {
    for m in [
        REGISTRY.register(Box::new(FRAMES.clone())),
        REGISTRY.register(Box::new(FRAMES_IGNORED.clone())),
        REGISTRY.register(Box::new(FRAMING_ERRORS.clone())),
        REGISTRY.register(Box::new(FEED_IDLE.clone())),
        REGISTRY.register(Box::new(WINDOWS_CLOSED.clone())),
        REGISTRY.register(Box::new(LAST_VWAP.clone())),
        REGISTRY.register(Box::new(ORDERS.clone())),
        REGISTRY.register(Box::new(JOURNAL_DROPPED.clone())),
    ] {
        let _ = m;
    }
}

// Encode all metrics in Prometheus text format
pub fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

// Serve one HTTP request (GET / or /metrics) — tiny HTTP 1.1 responder
fn handle_client(mut stream: TcpStream) {
    let mut _req_buf = [0u8; 1024];
    let _ = stream.read(&mut _req_buf);

    let body = encode_metrics();
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );

    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

/// Metrics server di OS thread terpisah, supaya loop feed tetap single-task.
pub fn serve_metrics(port: u16) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)?;
    tracing::info!(%addr, "metrics listening");
    thread::spawn(move || {
        for conn in listener.incoming() {
            match conn {
                Ok(stream) => handle_client(stream),
                Err(e) => tracing::warn!(?e, "metrics accept error"),
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_metrics_are_exported() {
        init();
        WINDOWS_CLOSED.inc();
        FRAMES.with_label_values(&["trade"]).inc();
        JOURNAL_DROPPED.inc();
        let text = String::from_utf8(encode_metrics()).unwrap();
        assert!(text.contains("vwap_windows_closed_total"));
        assert!(text.contains("feed_frames_total{type=\"trade\"}"));
        assert!(text.contains("journal_dropped_total"));
    }
}
