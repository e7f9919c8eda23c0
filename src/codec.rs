// ===============================
// src/codec.rs
// ===============================
//
// Stream framing on top of wire.rs:
// - FrameReader : header -> exact-size body -> FeedEvent
// - OrderWriter : one fixed-width Order per write, no header
//
// Exact-size policy: bodies are read with read_exact (loop until the count is
// satisfied). EOF inside a frame is FramingError::Truncated, EOF before the
// first header byte is EndOfStream.
//
use std::io::ErrorKind;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;

use crate::domain::{FeedEvent, Header, MsgType, Order, Quote, Trade};
use crate::error::{FeedError, FramingError};
use crate::wire::{HEADER_LEN, QUOTE_LEN, TRADE_LEN};

pub struct FrameReader<R> {
    inner: BufReader<R>,
    frames: u64,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self { inner: BufReader::new(reader), frames: 0 }
    }

    /// Number of complete frames decoded so far.
    pub fn frames_read(&self) -> u64 { self.frames }

    /// Wait until the next frame has at least one byte buffered (or EOF).
    /// Returns `false` on idle timeout; nothing is consumed in that case, so the
    /// reader is still positioned on a header boundary.
    pub async fn wait_frame(&mut self, idle: Duration) -> Result<bool, FeedError> {
        match timeout(idle, self.inner.fill_buf()).await {
            Err(_elapsed) => Ok(false),
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => Err(FeedError::Transport(e)),
        }
    }

    pub async fn read_header(&mut self) -> Result<Header, FeedError> {
        let mut buf = [0u8; HEADER_LEN];
        let n = self.inner.read(&mut buf[..1]).await.map_err(FeedError::Transport)?;
        if n == 0 {
            return Err(FeedError::EndOfStream);
        }
        self.fill(&mut buf[1..], "header").await?;

        let header = Header::decode(buf);
        if header.length == 0 {
            return Err(FeedError::ZeroLengthHeader);
        }
        Ok(header)
    }

    pub async fn read_body(&mut self, header: &Header) -> Result<FeedEvent, FeedError> {
        header.check_length()?;
        let event = match header.msg_type {
            MsgType::Quote => {
                let mut buf = [0u8; QUOTE_LEN];
                self.fill(&mut buf, "quote body").await?;
                FeedEvent::Quote(Quote::decode(&buf))
            }
            MsgType::Trade => {
                let mut buf = [0u8; TRADE_LEN];
                self.fill(&mut buf, "trade body").await?;
                FeedEvent::Trade(Trade::decode(&buf))
            }
        };
        self.frames += 1;
        Ok(event)
    }

    pub async fn next_event(&mut self) -> Result<FeedEvent, FeedError> {
        let header = self.read_header().await?;
        self.read_body(&header).await
    }

    async fn fill(&mut self, buf: &mut [u8], part: &'static str) -> Result<(), FeedError> {
        let expected = buf.len();
        match self.inner.read_exact(buf).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(FramingError::Truncated { part, expected }.into())
            }
            Err(e) => Err(FeedError::Transport(e)),
        }
    }
}

pub struct OrderWriter<W> {
    inner: W,
    sent: u64,
}

impl<W: AsyncWrite + Unpin> OrderWriter<W> {
    pub fn new(writer: W) -> Self { Self { inner: writer, sent: 0 } }

    pub fn orders_sent(&self) -> u64 { self.sent }

    /// Fire-and-forget: satu write penuh, tanpa menunggu ack.
    pub async fn send(&mut self, order: &Order) -> std::io::Result<()> {
        self.inner.write_all(&order.encode()).await?;
        self.inner.flush().await?;
        self.sent += 1;
        Ok(())
    }

    pub fn into_inner(self) -> W { self.inner }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Side, Symbol};
    use crate::wire::{encode_quote_frame, encode_trade_frame, ORDER_LEN};

    fn ibm() -> Symbol { Symbol::parse("IBM").unwrap() }

    fn quote() -> Quote {
        Quote { symbol: ibm(), timestamp: 1_700_000_000_000_000_000, bid_quantity: 10, bid_price: 18500, ask_quantity: 12, ask_price: 18510 }
    }

    fn trade(ts: u64) -> Trade { Trade { symbol: ibm(), timestamp: ts, quantity: 25, price: 32000 } }

    #[tokio::test]
    async fn decodes_consecutive_frames() {
        let mut bytes = encode_quote_frame(&quote());
        bytes.extend(encode_trade_frame(&trade(5)));
        let mut reader = FrameReader::new(&bytes[..]);

        assert_eq!(reader.next_event().await.unwrap(), FeedEvent::Quote(quote()));
        assert_eq!(reader.next_event().await.unwrap(), FeedEvent::Trade(trade(5)));
        assert!(matches!(reader.next_event().await, Err(FeedError::EndOfStream)));
        assert_eq!(reader.frames_read(), 2);
    }

    #[tokio::test]
    async fn oversized_trade_header_is_framing_error() {
        let mut bytes = vec![32u8, 2];
        bytes.extend_from_slice(&[0u8; 32]);
        let mut reader = FrameReader::new(&bytes[..]);

        match reader.next_event().await {
            Err(FeedError::Framing(FramingError::LengthMismatch { msg_type, declared, expected })) => {
                assert_eq!(msg_type, MsgType::Trade);
                assert_eq!(declared, 32);
                assert_eq!(expected, TRADE_LEN);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn short_body_is_truncated_not_retried() {
        let frame = encode_trade_frame(&trade(1));
        let mut reader = FrameReader::new(&frame[..frame.len() - 3]);
        assert!(matches!(
            reader.next_event().await,
            Err(FeedError::Framing(FramingError::Truncated { part: "trade body", expected: TRADE_LEN }))
        ));
    }

    #[tokio::test]
    async fn half_header_is_truncated() {
        let bytes = [24u8];
        let mut reader = FrameReader::new(&bytes[..]);
        assert!(matches!(
            reader.next_event().await,
            Err(FeedError::Framing(FramingError::Truncated { part: "header", .. }))
        ));
    }

    #[tokio::test]
    async fn zero_length_header_stops_stream() {
        let mut bytes = vec![0u8, 2];
        bytes.extend(encode_trade_frame(&trade(1)));
        let mut reader = FrameReader::new(&bytes[..]);
        let err = reader.next_event().await.unwrap_err();
        assert!(matches!(err, FeedError::ZeroLengthHeader));
        assert!(err.is_orderly_close());
    }

    #[tokio::test]
    async fn body_arriving_in_pieces_is_reassembled() {
        let frame = encode_quote_frame(&quote());
        let (mut tx, rx) = tokio::io::duplex(64);
        let writer = tokio::spawn(async move {
            for chunk in frame.chunks(5) {
                tx.write_all(chunk).await.unwrap();
                tokio::task::yield_now().await;
            }
        });
        let mut reader = FrameReader::new(rx);
        assert_eq!(reader.next_event().await.unwrap(), FeedEvent::Quote(quote()));
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn idle_wait_times_out_without_consuming() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(rx);
        assert!(!reader.wait_frame(Duration::from_millis(10)).await.unwrap());

        tx.write_all(&encode_trade_frame(&trade(9))).await.unwrap();
        assert!(reader.wait_frame(Duration::from_millis(500)).await.unwrap());
        assert_eq!(reader.next_event().await.unwrap(), FeedEvent::Trade(trade(9)));
    }

    #[tokio::test]
    async fn order_writer_emits_fixed_record() {
        let order = Order { symbol: ibm(), timestamp: 42, side: Side::Buy, quantity: 10, price: 18510 };
        let mut writer = OrderWriter::new(Vec::new());
        writer.send(&order).await.unwrap();
        assert_eq!(writer.orders_sent(), 1);
        let bytes = writer.into_inner();
        assert_eq!(bytes.len(), ORDER_LEN);
        assert_eq!(bytes, order.encode().to_vec());
    }
}
