// ===============================
// src/wire.rs
// ===============================
//
// Fixed binary layouts (little-endian, packed, no padding):
//   Header : length u8 | type u8                                     =  2 bytes
//   Quote  : symbol[8] | ts u64 | bid_qty u32 | bid_px u32
//            | ask_qty u32 | ask_px u32                              = 32 bytes
//   Trade  : symbol[8] | ts u64 | qty u32 | px u32                   = 24 bytes
//   Order  : symbol[8] | ts u64 | side u8 | qty u32 | px u32         = 25 bytes
//
// Every field is written explicitly with to_le_bytes, never by casting a struct.
//
use crate::domain::{Header, MsgType, Order, Quote, Side, Symbol, Trade, SYMBOL_LEN};
use crate::error::{DecodeError, FramingError};

pub const HEADER_LEN: usize = 2;
pub const QUOTE_LEN: usize = 32;
pub const TRADE_LEN: usize = 24;
pub const ORDER_LEN: usize = 25;

pub const fn body_len(msg_type: MsgType) -> usize {
    match msg_type { MsgType::Quote => QUOTE_LEN, MsgType::Trade => TRADE_LEN }
}

/// Little cursor over a fixed-size buffer; the caller guarantees the size.
struct Fields<'a> { buf: &'a [u8], pos: usize }

impl<'a> Fields<'a> {
    fn new(buf: &'a [u8]) -> Self { Self { buf, pos: 0 } }
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }
    fn symbol(&mut self) -> Symbol { Symbol::from_bytes(self.take::<SYMBOL_LEN>()) }
    fn u8(&mut self) -> u8 { self.take::<1>()[0] }
    fn u32(&mut self) -> u32 { u32::from_le_bytes(self.take()) }
    fn u64(&mut self) -> u64 { u64::from_le_bytes(self.take()) }
}

struct Writer<'a> { buf: &'a mut [u8], pos: usize }

impl<'a> Writer<'a> {
    fn new(buf: &'a mut [u8]) -> Self { Self { buf, pos: 0 } }
    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }
}

impl Header {
    pub fn decode(buf: [u8; HEADER_LEN]) -> Self {
        Header { length: buf[0], msg_type: MsgType::from_byte(buf[1]) }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] { [self.length, self.msg_type.as_byte()] }

    /// Header for a well-formed body of the given type.
    pub const fn for_type(msg_type: MsgType) -> Self {
        Header { length: body_len(msg_type) as u8, msg_type }
    }

    /// Declared length harus sama persis dengan layout tipe tersebut.
    pub fn check_length(&self) -> Result<usize, FramingError> {
        let expected = body_len(self.msg_type);
        if self.length as usize != expected {
            return Err(FramingError::LengthMismatch { msg_type: self.msg_type, declared: self.length, expected });
        }
        Ok(expected)
    }
}

impl Quote {
    pub fn encode(&self) -> [u8; QUOTE_LEN] {
        let mut buf = [0u8; QUOTE_LEN];
        let mut w = Writer::new(&mut buf);
        w.put(self.symbol.as_bytes());
        w.put(&self.timestamp.to_le_bytes());
        w.put(&self.bid_quantity.to_le_bytes());
        w.put(&self.bid_price.to_le_bytes());
        w.put(&self.ask_quantity.to_le_bytes());
        w.put(&self.ask_price.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; QUOTE_LEN]) -> Self {
        let mut f = Fields::new(buf);
        Quote {
            symbol: f.symbol(),
            timestamp: f.u64(),
            bid_quantity: f.u32(),
            bid_price: f.u32(),
            ask_quantity: f.u32(),
            ask_price: f.u32(),
        }
    }
}

impl Trade {
    pub fn encode(&self) -> [u8; TRADE_LEN] {
        let mut buf = [0u8; TRADE_LEN];
        let mut w = Writer::new(&mut buf);
        w.put(self.symbol.as_bytes());
        w.put(&self.timestamp.to_le_bytes());
        w.put(&self.quantity.to_le_bytes());
        w.put(&self.price.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; TRADE_LEN]) -> Self {
        let mut f = Fields::new(buf);
        Trade { symbol: f.symbol(), timestamp: f.u64(), quantity: f.u32(), price: f.u32() }
    }
}

impl Order {
    pub fn encode(&self) -> [u8; ORDER_LEN] {
        let mut buf = [0u8; ORDER_LEN];
        let mut w = Writer::new(&mut buf);
        w.put(self.symbol.as_bytes());
        w.put(&self.timestamp.to_le_bytes());
        w.put(&[self.side.as_byte()]);
        w.put(&self.quantity.to_le_bytes());
        w.put(&self.price.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; ORDER_LEN]) -> Result<Self, DecodeError> {
        let mut f = Fields::new(buf);
        let symbol = f.symbol();
        let timestamp = f.u64();
        let side_byte = f.u8();
        let side = Side::from_byte(side_byte).ok_or(DecodeError::Side(side_byte))?;
        Ok(Order { symbol, timestamp, side, quantity: f.u32(), price: f.u32() })
    }
}

/// Full frame (header + body) as the feed sends it.
pub fn encode_quote_frame(q: &Quote) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + QUOTE_LEN);
    out.extend_from_slice(&Header::for_type(MsgType::Quote).encode());
    out.extend_from_slice(&q.encode());
    out
}

pub fn encode_trade_frame(t: &Trade) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + TRADE_LEN);
    out.extend_from_slice(&Header::for_type(MsgType::Trade).encode());
    out.extend_from_slice(&t.encode());
    out
}
