//! Binance public API client for market data (no authentication required)

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, info};

use super::{clip_candles, CandleQuery, CandleSource};
use crate::types::Candle;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const MAX_KLINES_PER_REQUEST: u32 = 1000;
const DEFAULT_LIMIT: u32 = 500;

/// Binance public market data client
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
}

/// Raw kline data from Binance API (array of arrays)
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawKline(
    i64,    // 0: Open time
    String, // 1: Open
    String, // 2: High
    String, // 3: Low
    String, // 4: Close
    String, // 5: Volume
    i64,    // 6: Close time
    String, // 7: Quote asset volume
    u64,    // 8: Number of trades
    String, // 9: Taker buy base
    String, // 10: Taker buy quote
    String, // 11: Ignore
);

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    status: String,
    quote_asset: String,
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BinanceClient {
    /// Create a new Binance client with default base URL
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch one page of candles for a symbol (at most 1000)
    pub async fn get_candles(
        &self,
        symbol: &str,
        interval: &str,
        start_time: Option<i64>,
        end_time: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Candle>> {
        let mut url = format!(
            "{}/api/v3/klines?symbol={}&interval={}",
            self.base_url, symbol, interval
        );

        if let Some(start) = start_time {
            url.push_str(&format!("&startTime={}", start));
        }
        if let Some(end) = end_time {
            url.push_str(&format!("&endTime={}", end));
        }

        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_KLINES_PER_REQUEST);
        url.push_str(&format!("&limit={}", limit));

        debug!(symbol, interval, "Fetching klines from Binance");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance API error {}: {}", status, body);
        }

        let raw_klines: Vec<RawKline> = response.json().await?;
        let candles = candles_from_raw(raw_klines);

        debug!(count = candles.len(), "Fetched klines");
        Ok(candles)
    }

    /// Fetch every candle in `[start_time, end_time]`, one 1000-bar page at a time
    pub async fn get_candles_paginated(
        &self,
        symbol: &str,
        interval: &str,
        start_time: i64,
        end_time: i64,
    ) -> Result<Vec<Candle>> {
        let mut all_candles: Vec<Candle> = Vec::new();
        let mut current_start = start_time;

        info!(symbol, interval, "Fetching paginated klines from Binance");

        while current_start < end_time {
            let candles = self
                .get_candles(
                    symbol,
                    interval,
                    Some(current_start),
                    Some(end_time),
                    Some(MAX_KLINES_PER_REQUEST),
                )
                .await?;

            let Some(last_time) = candles.last().map(|c| c.time) else {
                break;
            };
            all_candles.extend(candles);

            // Move start to after the last candle
            current_start = last_time + 1;

            // Small delay to respect rate limits
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }

        info!(total = all_candles.len(), "Paginated kline fetch complete");
        Ok(all_candles)
    }

    /// Latest traded price for a symbol
    pub async fn get_current_price(&self, symbol: &str) -> Result<Decimal> {
        let url = format!("{}/api/v3/ticker/price?symbol={}", self.base_url, symbol);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance API error {}: {}", status, body);
        }

        let ticker: TickerPrice = response.json().await?;
        let price = Decimal::from_str(&ticker.price)?;
        Ok(price)
    }

    /// Symbols quoted in USDT that are currently trading, in exchange order
    pub async fn get_usdt_symbols(&self, limit: usize) -> Result<Vec<String>> {
        let url = format!("{}/api/v3/exchangeInfo", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance API error {}: {}", status, body);
        }

        let info: ExchangeInfo = response.json().await?;
        Ok(usdt_symbols(info, limit))
    }
}

#[async_trait]
impl CandleSource for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<Candle>> {
        let candles = match (query.start_time, query.end_time) {
            (Some(start), Some(end)) => {
                self.get_candles_paginated(&query.symbol, &query.interval, start, end)
                    .await?
            }
            _ => {
                self.get_candles(
                    &query.symbol,
                    &query.interval,
                    query.start_time,
                    query.end_time,
                    query.limit,
                )
                .await?
            }
        };

        Ok(clip_candles(candles, query))
    }
}

/// Rows with unparseable prices are skipped
fn candles_from_raw(raw_klines: Vec<RawKline>) -> Vec<Candle> {
    raw_klines
        .into_iter()
        .filter_map(|raw| {
            Some(Candle {
                time: raw.0,
                open: Decimal::from_str(&raw.1).ok()?,
                high: Decimal::from_str(&raw.2).ok()?,
                low: Decimal::from_str(&raw.3).ok()?,
                close: Decimal::from_str(&raw.4).ok()?,
                volume: Decimal::from_str(&raw.5).ok()?,
            })
        })
        .collect()
}

fn usdt_symbols(info: ExchangeInfo, limit: usize) -> Vec<String> {
    info.symbols
        .into_iter()
        .filter(|s| s.quote_asset == "USDT" && s.status == "TRADING")
        .map(|s| s.symbol)
        .take(limit)
        .collect()
}
