//! Where backtest candles come from

use anyhow::{bail, Context, Result};
use backtest_engine::{
    random_walk_candles, AlphaVantageClient, BinanceClient, Candle, CandleQuery, CandleSource,
    SyntheticSeries,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::config::AppConfig;

const DEMO_DEFAULT_COUNT: u32 = 500;
/// Upper bound on `limit` for the demo source
pub const MAX_DEMO_CANDLES: u32 = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Binance,
    #[value(name = "alphavantage")]
    #[serde(alias = "alpha_vantage")]
    AlphaVantage,
    /// Seeded random walk, no network
    Demo,
    /// JSON array of candles on disk (CLI only)
    File,
}

/// The remote candle sources, built once from configuration
#[derive(Clone)]
pub struct MarketData {
    binance: BinanceClient,
    alpha_vantage: AlphaVantageClient,
}

impl MarketData {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            binance: config.binance_client(),
            alpha_vantage: config.alpha_vantage_client(),
        }
    }

    pub fn binance(&self) -> &BinanceClient {
        &self.binance
    }

    /// Candles for a network or synthetic source; `File` is handled by the caller
    pub async fn load(&self, source: DataSource, query: &CandleQuery, seed: u64) -> Result<Vec<Candle>> {
        let remote: &dyn CandleSource = match source {
            DataSource::Binance => &self.binance,
            DataSource::AlphaVantage => &self.alpha_vantage,
            DataSource::Demo => return demo_candles(query, seed),
            DataSource::File => bail!("The file source reads candles from a local path"),
        };

        info!(
            source = remote.name(),
            symbol = %query.symbol,
            interval = %query.interval,
            "Fetching candles"
        );
        let candles = remote
            .fetch_candles(query)
            .await
            .with_context(|| format!("Failed to fetch {} candles from {}", query.symbol, remote.name()))?;
        info!(count = candles.len(), "Candles loaded");
        Ok(candles)
    }
}

/// Synthetic candles shaped by the query: `limit` bars at `interval` spacing
pub fn demo_candles(query: &CandleQuery, seed: u64) -> Result<Vec<Candle>> {
    let defaults = SyntheticSeries::default();
    let interval_ms = interval_ms(&query.interval)
        .with_context(|| format!("Unknown interval '{}'", query.interval))?;

    let count = query.limit.unwrap_or(DEMO_DEFAULT_COUNT);
    if count > MAX_DEMO_CANDLES {
        bail!(
            "Demo source is limited to {} candles, got {}",
            MAX_DEMO_CANDLES,
            count
        );
    }

    let series = SyntheticSeries {
        seed,
        count: count as usize,
        start_time: query.start_time.unwrap_or(defaults.start_time),
        interval_ms,
        ..defaults
    };
    if series.last_time().is_none() {
        bail!(
            "{} candles of {} from {} run past the end of representable time",
            count,
            query.interval,
            series.start_time
        );
    }

    Ok(random_walk_candles(&series))
}

/// Read a JSON candle array, then sort and drop duplicate times
pub async fn read_candles_file(path: &Path) -> Result<Vec<Candle>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let mut candles: Vec<Candle> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of candles", path.display()))?;

    candles.sort_by_key(|c| c.time);
    candles.dedup_by_key(|c| c.time);
    Ok(candles)
}

/// Binance-style interval (`15m`, `4h`, `1d`, `1w`) in milliseconds
pub fn interval_ms(interval: &str) -> Option<i64> {
    let unit_at = interval.len().checked_sub(1)?;
    let (count, unit) = interval.split_at(unit_at);
    let count: i64 = count.parse().ok().filter(|n| *n > 0)?;
    let unit_ms = match unit {
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 604_800_000,
        _ => return None,
    };
    count.checked_mul(unit_ms)
}
