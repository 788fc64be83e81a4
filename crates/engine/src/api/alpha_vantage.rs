//! Alpha Vantage client for forex and stock candles
//!
//! Alpha Vantage returns a JSON object keyed by timestamp, newest first, and
//! reports quota exhaustion as a 200 response with a `Note` field.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use super::{clip_candles, CandleQuery, CandleSource};
use crate::types::Candle;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// One bar as Alpha Vantage encodes it; forex series carry no volume
#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: Option<String>,
}

/// Alpha Vantage market data client
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Intraday forex candles; `interval` is one of 1min, 5min, 15min, 30min, 60min
    pub async fn get_forex_intraday(
        &self,
        from_symbol: &str,
        to_symbol: &str,
        interval: &str,
    ) -> Result<Vec<Candle>> {
        self.fetch_series(
            &[
                ("function", "FX_INTRADAY"),
                ("from_symbol", from_symbol),
                ("to_symbol", to_symbol),
                ("interval", interval),
                ("outputsize", "full"),
            ],
            &format!("Time Series FX ({})", interval),
        )
        .await
    }

    pub async fn get_forex_daily(&self, from_symbol: &str, to_symbol: &str) -> Result<Vec<Candle>> {
        self.fetch_series(
            &[
                ("function", "FX_DAILY"),
                ("from_symbol", from_symbol),
                ("to_symbol", to_symbol),
                ("outputsize", "full"),
            ],
            "Time Series FX (Daily)",
        )
        .await
    }

    pub async fn get_stock_intraday(&self, symbol: &str, interval: &str) -> Result<Vec<Candle>> {
        self.fetch_series(
            &[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol),
                ("interval", interval),
                ("outputsize", "full"),
            ],
            &format!("Time Series ({})", interval),
        )
        .await
    }

    pub async fn get_stock_daily(&self, symbol: &str) -> Result<Vec<Candle>> {
        self.fetch_series(
            &[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "full"),
            ],
            "Time Series (Daily)",
        )
        .await
    }

    async fn fetch_series(&self, params: &[(&str, &str)], series_key: &str) -> Result<Vec<Candle>> {
        debug!(?params, "Fetching series from Alpha Vantage");

        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Alpha Vantage API error {}: {}", status, body);
        }

        let body: serde_json::Value = response.json().await?;
        let candles = parse_time_series(&body, series_key)?;

        debug!(count = candles.len(), "Fetched Alpha Vantage series");
        Ok(candles)
    }
}

#[async_trait]
impl CandleSource for AlphaVantageClient {
    fn name(&self) -> &str {
        "alphavantage"
    }

    /// `EUR/USD`-style symbols are forex pairs, anything else is a stock ticker
    async fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<Candle>> {
        let interval = map_interval(&query.interval)?;

        let candles = match (query.symbol.split_once('/'), interval) {
            (Some((from, to)), None) => self.get_forex_daily(from, to).await?,
            (Some((from, to)), Some(interval)) => {
                self.get_forex_intraday(from, to, interval).await?
            }
            (None, None) => self.get_stock_daily(&query.symbol).await?,
            (None, Some(interval)) => self.get_stock_intraday(&query.symbol, interval).await?,
        };

        Ok(clip_candles(candles, query))
    }
}

/// Binance-style interval to Alpha Vantage's; `None` means the daily series.
/// Hour intervals above one hour fall back to 60min bars, the coarsest intraday series.
fn map_interval(interval: &str) -> Result<Option<&'static str>> {
    match interval {
        "1m" | "1min" => Ok(Some("1min")),
        "5m" | "5min" => Ok(Some("5min")),
        "15m" | "15min" => Ok(Some("15min")),
        "30m" | "30min" => Ok(Some("30min")),
        "1h" | "60m" | "60min" => Ok(Some("60min")),
        "2h" | "4h" | "6h" | "8h" | "12h" => Ok(Some("60min")),
        "1d" | "daily" => Ok(None),
        other => Err(anyhow!("Interval '{}' is not available from Alpha Vantage", other)),
    }
}

/// Timestamps are either `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`, read as UTC
fn parse_timestamp(ts: &str) -> Result<i64> {
    let naive = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(ts, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .with_context(|| format!("Unrecognized timestamp '{}'", ts))?;
    Ok(Utc.from_utc_datetime(&naive).timestamp_millis())
}

fn parse_price(value: &str, field: &str, ts: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim()).with_context(|| format!("Bad {} '{}' at {}", field, value, ts))
}

/// Turn a response body into ascending candles
fn parse_time_series(body: &serde_json::Value, series_key: &str) -> Result<Vec<Candle>> {
    if let Some(msg) = body.get("Error Message").and_then(|v| v.as_str()) {
        anyhow::bail!("Alpha Vantage error: {}", msg);
    }
    if let Some(note) = body
        .get("Note")
        .or_else(|| body.get("Information"))
        .and_then(|v| v.as_str())
    {
        anyhow::bail!("Alpha Vantage API limit reached: {}", note);
    }

    let series = body
        .get(series_key)
        .ok_or_else(|| anyhow!("No data available ('{}' missing)", series_key))?;
    let bars: BTreeMap<String, RawBar> = serde_json::from_value(series.clone())
        .with_context(|| format!("Malformed '{}'", series_key))?;

    let mut candles = bars
        .iter()
        .map(|(ts, bar)| {
            Ok(Candle {
                time: parse_timestamp(ts)?,
                open: parse_price(&bar.open, "open", ts)?,
                high: parse_price(&bar.high, "high", ts)?,
                low: parse_price(&bar.low, "low", ts)?,
                close: parse_price(&bar.close, "close", ts)?,
                volume: match &bar.volume {
                    Some(v) => parse_price(v, "volume", ts)?,
                    None => Decimal::ZERO,
                },
            })
        })
        .collect::<Result<Vec<Candle>>>()?;

    candles.sort_by_key(|c| c.time);
    Ok(candles)
}
