// ===============================
// src/error.rs
// ===============================
use std::io;
use thiserror::Error;

use crate::domain::MsgType;

/// Frame tidak sesuai layout tetap. Tidak bisa dipulihkan di tengah frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    #[error("{msg_type:?} header declares {declared} bytes, layout is {expected} bytes")]
    LengthMismatch { msg_type: MsgType, declared: u8, expected: usize },
    #[error("stream ended inside {part} (needed {expected} bytes)")]
    Truncated { part: &'static str, expected: usize },
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),
    #[error("peer closed the feed at a frame boundary")]
    EndOfStream,
    #[error("zero-length header, no more frames")]
    ZeroLengthHeader,
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),
}

impl FeedError {
    /// EndOfStream dan header length 0 adalah akhir stream yang teratur.
    pub fn is_orderly_close(&self) -> bool {
        matches!(self, FeedError::EndOfStream | FeedError::ZeroLengthHeader)
    }
}

/// Guards around the VWAP division.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window is still accumulating")]
    NotReady,
    #[error("window holds zero quantity, vwap undefined")]
    EmptyWindow,
}

/// What the driver loop surfaces to main.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("feed frame #{frame}: {source}")]
    Feed { frame: u64, #[source] source: FeedError },
    #[error("order sink write failed: {0}")]
    OrderSink(#[source] io::Error),
    #[error(transparent)]
    Window(#[from] WindowError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("symbol {0:?} must be 1..=8 ASCII bytes")]
    Symbol(String),
    #[error("side {0:?} must be one of B, S, buy, sell")]
    Side(String),
    #[error("max order size must be greater than zero")]
    MaxOrderSize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown order side byte 0x{0:02x}")]
    Side(u8),
}
