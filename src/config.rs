// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : vwap_bot_rust — single-instrument VWAP trigger engine in Rust
Module  : config.rs
Version : 0.1.0
Author  : Kukuh Tripamungkas Wicaksono (Kukuh TW)
License : MIT (see LICENSE)

Summary : Decodes a binary quote/trade feed, keeps an event-time VWAP window
          and sends a fixed-width order when the best quote beats the VWAP.

(c) 2025 Kukuh TW. All rights reserved where applicable.
=============================================================================
*/
use clap::Parser;
use dotenvy::dotenv;
use std::time::Duration;

use crate::domain::{Side, StrategyConfig};
use crate::error::ConfigError;

/// Semua parameter bisa lewat flag CLI atau ENV (.env ikut dibaca).
#[derive(Parser, Clone, Debug)]
#[command(name = "vwap_bot_rust", version, about = "VWAP trigger engine for a binary quote/trade feed")]
pub struct Args {
    /// Instrument symbol, max 8 ASCII bytes (NUL padded on the wire)
    #[arg(long, env = "SYMBOL")]
    pub symbol: String,

    /// B / S (atau buy / sell)
    #[arg(long, env = "SIDE")]
    pub side: String,

    #[arg(long, env = "MAX_ORDER_SIZE")]
    pub max_order_size: u32,

    /// VWAP window length in seconds of feed time
    #[arg(long, env = "VWAP_WINDOW_SECS")]
    pub vwap_window_secs: u32,

    #[arg(long, env = "FEED_HOST", default_value = "127.0.0.1")]
    pub feed_host: String,
    #[arg(long, env = "FEED_PORT", default_value_t = 5000)]
    pub feed_port: u16,

    #[arg(long, env = "ORDER_HOST", default_value = "127.0.0.1")]
    pub order_host: String,
    #[arg(long, env = "ORDER_PORT", default_value_t = 5001)]
    pub order_port: u16,

    /// 0 = metrics endpoint off
    #[arg(long, env = "METRICS_PORT", default_value_t = 0)]
    pub metrics_port: u16,

    /// Optional JSONL journal of quotes, trades, windows and orders
    #[arg(long, env = "RECORD_FILE")]
    pub record_file: Option<String>,

    /// Idle timeout at frame boundaries, 0 = wait forever
    #[arg(long, env = "FEED_IDLE_TIMEOUT_SECS", default_value_t = 0)]
    pub feed_idle_timeout_secs: u64,

    /// Reconnect attempts after the feed closes cleanly
    #[arg(long, env = "RECONNECT_ATTEMPTS", default_value_t = 0)]
    pub reconnect_attempts: u32,

    /// Subtract sent quantity from the cached quote until the next quote arrives
    #[arg(long, env = "CONSUME_LIQUIDITY", default_value_t = false)]
    pub consume_liquidity: bool,
}

impl Args {
    pub fn feed_addr(&self) -> String { format!("{}:{}", self.feed_host, self.feed_port) }
    pub fn order_addr(&self) -> String { format!("{}:{}", self.order_host, self.order_port) }

    pub fn feed_idle_timeout(&self) -> Option<Duration> {
        (self.feed_idle_timeout_secs > 0).then(|| Duration::from_secs(self.feed_idle_timeout_secs))
    }

    /// Validasi ke nilai yang dipakai core.
    pub fn strategy(&self) -> Result<StrategyConfig, ConfigError> {
        let side = Side::parse(&self.side)?;
        let mut cfg = StrategyConfig::new(&self.symbol, side, self.max_order_size, self.vwap_window_secs)?;
        cfg.consume_liquidity = self.consume_liquidity;
        Ok(cfg)
    }
}

pub fn load() -> Result<(Args, StrategyConfig), ConfigError> {
    // Pastikan .env dibaca sebelum clap membaca ENV
    let _ = dotenv();
    let args = Args::parse();
    let strategy = args.strategy()?;
    Ok((args, strategy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Symbol;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["vwap_bot_rust", "--symbol", "IBM", "--side", "B", "--max-order-size", "10", "--vwap-window-secs", "5"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_build_strategy() {
        let args = parse(&["--feed-port", "6000", "--consume-liquidity"]);
        let cfg = args.strategy().unwrap();
        assert_eq!(cfg.symbol, Symbol::parse("IBM").unwrap());
        assert_eq!(cfg.side, Side::Buy);
        assert_eq!((cfg.max_order_size, cfg.vwap_window_period), (10, 5));
        assert!(cfg.consume_liquidity);
        assert_eq!(args.feed_addr(), "127.0.0.1:6000");
        assert_eq!(args.order_addr(), "127.0.0.1:5001");
        assert_eq!(args.feed_idle_timeout(), None);
    }

    #[test]
    fn idle_timeout_enabled_when_positive() {
        let args = parse(&["--feed-idle-timeout-secs", "3"]);
        assert_eq!(args.feed_idle_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn invalid_side_is_rejected() {
        let mut args = parse(&[]);
        args.side = "hold".into();
        assert_eq!(args.strategy(), Err(ConfigError::Side("hold".into())));
    }

    #[test]
    fn long_symbol_is_rejected() {
        let mut args = parse(&[]);
        args.symbol = "VERYLONGSYM".into();
        assert!(matches!(args.strategy(), Err(ConfigError::Symbol(_))));
    }
}
