// ===============================
// src/domain.rs
// ===============================
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::ConfigError;

pub const SYMBOL_LEN: usize = 8;

/// Instrument id di wire: 8 byte, padding NUL/spasi. Dibandingkan byte-per-byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Symbol([u8; SYMBOL_LEN]);

impl Symbol {
    pub const fn from_bytes(bytes: [u8; SYMBOL_LEN]) -> Self { Self(bytes) }

    /// Build from a configured ticker such as "IBM"; the rest is NUL padded.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let raw = s.as_bytes();
        if raw.is_empty() || raw.len() > SYMBOL_LEN || !s.is_ascii() {
            return Err(ConfigError::Symbol(s.to_string()));
        }
        let mut bytes = [0u8; SYMBOL_LEN];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self(bytes))
    }

    pub const fn as_bytes(&self) -> &[u8; SYMBOL_LEN] { &self.0 }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(SYMBOL_LEN);
        let text = String::from_utf8_lossy(&self.0[..end]);
        f.write_str(text.trim_end_matches(' '))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.to_string())
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side { Buy, Sell }

impl Side {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b" | "buy" => Ok(Side::Buy),
            "s" | "sell" => Ok(Side::Sell),
            _ => Err(ConfigError::Side(s.to_string())),
        }
    }

    pub const fn as_byte(&self) -> u8 { match self { Side::Buy => b'B', Side::Sell => b'S' } }

    pub const fn from_byte(b: u8) -> Option<Self> {
        match b { b'B' => Some(Side::Buy), b'S' => Some(Side::Sell), _ => None }
    }
}

/// Header `type` byte. 1 = Quote, selain itu Trade (praktiknya 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MsgType { Quote, Trade }

impl MsgType {
    pub const fn from_byte(b: u8) -> Self { if b == 1 { MsgType::Quote } else { MsgType::Trade } }
    pub const fn as_byte(&self) -> u8 { match self { MsgType::Quote => 1, MsgType::Trade => 2 } }
    pub const fn label(&self) -> &'static str { match self { MsgType::Quote => "quote", MsgType::Trade => "trade" } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header { pub length: u8, pub msg_type: MsgType }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub timestamp: u64,
    pub bid_quantity: u32,
    pub bid_price: u32,
    pub ask_quantity: u32,
    pub ask_price: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trade { pub symbol: Symbol, pub timestamp: u64, pub quantity: u32, pub price: u32 }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Order { pub symbol: Symbol, pub timestamp: u64, pub side: Side, pub quantity: u32, pub price: u32 }

/// Exactly two body shapes exist on the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedEvent { Quote(Quote), Trade(Trade) }

impl FeedEvent {
    pub fn symbol(&self) -> &Symbol {
        match self { FeedEvent::Quote(q) => &q.symbol, FeedEvent::Trade(t) => &t.symbol }
    }
    pub fn timestamp(&self) -> u64 {
        match self { FeedEvent::Quote(q) => q.timestamp, FeedEvent::Trade(t) => t.timestamp }
    }
    pub fn msg_type(&self) -> MsgType {
        match self { FeedEvent::Quote(_) => MsgType::Quote, FeedEvent::Trade(_) => MsgType::Trade }
    }
}

/// Immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyConfig {
    pub symbol: Symbol,
    pub side: Side,
    pub max_order_size: u32,
    pub vwap_window_period: u32,
    /// Kurangi qty quote setelah order terkirim (default: tidak).
    pub consume_liquidity: bool,
}

impl StrategyConfig {
    pub fn new(symbol: &str, side: Side, max_order_size: u32, vwap_window_period: u32) -> Result<Self, ConfigError> {
        if max_order_size == 0 {
            return Err(ConfigError::MaxOrderSize);
        }
        Ok(Self { symbol: Symbol::parse(symbol)?, side, max_order_size, vwap_window_period, consume_liquidity: false })
    }
}
