//! Candle sources
//!
//! Network clients that materialize candle series for the engine. The engine
//! itself never performs I/O; callers fetch first, then run.

pub mod alpha_vantage;
pub mod binance;

pub use alpha_vantage::AlphaVantageClient;
pub use binance::BinanceClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Candle;

/// What to fetch from a candle source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleQuery {
    pub symbol: String,
    /// Binance-style interval: 1m, 5m, 15m, 30m, 1h, 4h, 1d, 1w
    pub interval: String,
    pub limit: Option<u32>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

impl CandleQuery {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            limit: None,
            start_time: None,
            end_time: None,
        }
    }
}

/// A provider of ascending, unique-time candle series
#[async_trait]
pub trait CandleSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<Candle>>;
}

/// Keep candles inside `[start_time, end_time]`, then the last `limit` of them
pub(crate) fn clip_candles(mut candles: Vec<Candle>, query: &CandleQuery) -> Vec<Candle> {
    candles.retain(|c| {
        query.start_time.map_or(true, |start| c.time >= start)
            && query.end_time.map_or(true, |end| c.time <= end)
    });
    if let Some(limit) = query.limit {
        let limit = limit as usize;
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
    }
    candles
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle(time: i64) -> Candle {
        Candle {
            time,
            open: dec!(1),
            high: dec!(1),
            low: dec!(1),
            close: dec!(1),
            volume: dec!(0),
        }
    }

    #[test]
    fn test_clip_candles() {
        let candles: Vec<Candle> = (0..10).map(candle).collect();
        let query = CandleQuery {
            start_time: Some(2),
            end_time: Some(8),
            limit: Some(3),
            ..CandleQuery::new("EUR/USD", "1d")
        };
        let clipped = clip_candles(candles, &query);
        let times: Vec<i64> = clipped.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![6, 7, 8]);
    }
}
