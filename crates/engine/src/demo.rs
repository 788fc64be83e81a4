//! Seeded random-walk candles for offline runs and tests

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Candle;

/// Shape of a synthetic series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticSeries {
    pub seed: u64,
    pub count: usize,
    pub start_price: f64,
    /// Open time of the first candle (ms)
    pub start_time: i64,
    pub interval_ms: i64,
    /// Maximum close-to-close move per bar, in percent
    pub volatility_pct: f64,
}

impl Default for SyntheticSeries {
    fn default() -> Self {
        Self {
            seed: 42,
            count: 500,
            start_price: 100.0,
            start_time: 1_700_000_000_000,
            interval_ms: 3_600_000,
            volatility_pct: 2.0,
        }
    }
}

impl SyntheticSeries {
    /// Open time of candle `index`, `None` when it does not fit in an `i64`
    pub fn time_at(&self, index: usize) -> Option<i64> {
        i64::try_from(index)
            .ok()?
            .checked_mul(self.interval_ms)?
            .checked_add(self.start_time)
    }

    /// Open time of the last candle, `None` on overflow
    pub fn last_time(&self) -> Option<i64> {
        self.time_at(self.count.saturating_sub(1))
    }
}

fn to_price(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .unwrap_or_default()
        .round_dp(2)
        .max(dec!(0.01))
}

/// Generate `series.count` candles. The same series always yields the same candles.
///
/// The series stops early at the first candle whose open time would overflow.
pub fn random_walk_candles(series: &SyntheticSeries) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(series.seed);
    let vol = series.volatility_pct.abs() / 100.0;
    let mut last_close = series.start_price.max(0.01);

    (0..series.count)
        .map_while(|i| {
            let time = series.time_at(i)?;
            let open = last_close;
            let change = (rng.gen::<f64>() * 2.0 - 1.0) * vol;
            let close = (open * (1.0 + change)).max(0.01);
            let high = open.max(close) * (1.0 + rng.gen::<f64>() * vol / 2.0);
            let low = open.min(close) * (1.0 - rng.gen::<f64>() * vol / 2.0);
            let volume = 100.0 + rng.gen::<f64>() * 900.0;
            last_close = close;

            Some(Candle {
                time,
                open: to_price(open),
                high: to_price(high),
                low: to_price(low),
                close: to_price(close),
                volume: Decimal::from_f64(volume).unwrap_or_default().round_dp(2),
            })
        })
        .collect()
}
