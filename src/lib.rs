// ===============================
// src/lib.rs
// ===============================
//
// Core: wire codec -> VWAP window -> order trigger, driven by engine::Engine.
// Binaries (main.rs, bin/feed_server.rs, bin/order_sink.rs) own the sockets.
//
pub mod codec;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod recorder;
pub mod trigger;
pub mod window;
pub mod wire;
