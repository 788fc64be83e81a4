//! Types for the backtesting engine

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single candlestick (OHLCV)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time in milliseconds since epoch
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Zero for venues that do not report volume (forex)
    pub volume: Decimal,
}

impl Candle {
    pub fn close_f64(&self) -> f64 {
        self.close.to_f64().unwrap_or(0.0)
    }
}

/// Closing prices of a candle series as `f64`, index-aligned with the input
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(Candle::close_f64).collect()
}

/// Discrete action derived for one candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Direction of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

/// What to do with unsupported strategy types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedStrategyPolicy {
    /// Fail the run with `BacktestError::UnsupportedStrategy`
    #[default]
    Reject,
    /// Emit HOLD for every candle
    HoldAll,
}

/// What to do with a position still open after the last candle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenPositionPolicy {
    /// Drop it: no trade is emitted
    #[default]
    Abandon,
    /// Close it at the last candle's close
    CloseAtLastCandle,
}

/// Configuration for a backtest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_capital: Decimal,
    /// Fraction charged per leg (0.001 = 0.1%)
    pub commission: Decimal,
    #[serde(default)]
    pub unsupported_strategy: UnsupportedStrategyPolicy,
    #[serde(default)]
    pub open_position: OpenPositionPolicy,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: Decimal::from(10000),
            commission: Decimal::new(1, 3),
            unsupported_strategy: UnsupportedStrategyPolicy::default(),
            open_position: OpenPositionPolicy::default(),
        }
    }
}

/// A closed round-trip produced by the simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestTrade {
    pub entry_time: i64,
    pub exit_time: i64,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub direction: Direction,
    pub quantity: Decimal,
    /// Currency PnL after commission
    pub pnl: Decimal,
    /// Price return in percent, commission excluded
    pub pnl_percent: Decimal,
}

/// Gross profit over gross loss; infinite when there are profits and no losses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ProfitFactor {
    Finite(Decimal),
    Infinite,
}

impl ProfitFactor {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// `f64::INFINITY` for the infinite case
    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Finite(v) => v.to_f64().unwrap_or(0.0),
            Self::Infinite => f64::INFINITY,
        }
    }
}

impl Default for ProfitFactor {
    fn default() -> Self {
        Self::Finite(Decimal::ZERO)
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(v) => write!(f, "{}", v.round_dp(2)),
            Self::Infinite => write!(f, "∞"),
        }
    }
}

impl From<ProfitFactor> for String {
    fn from(pf: ProfitFactor) -> Self {
        match pf {
            ProfitFactor::Finite(v) => v.to_string(),
            ProfitFactor::Infinite => "Infinity".to_string(),
        }
    }
}

impl TryFrom<String> for ProfitFactor {
    type Error = rust_decimal::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ProfitFactor::from_str(&s)
    }
}

impl FromStr for ProfitFactor {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Infinity" | "inf" | "∞" => Ok(Self::Infinite),
            other => Decimal::from_str(other).map(Self::Finite),
        }
    }
}

/// Aggregate performance over the closed trades of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub win_rate: Decimal,
    pub total_profit: Decimal,
    /// Absolute value, never negative
    pub total_loss: Decimal,
    pub net_profit: Decimal,
    pub profit_factor: ProfitFactor,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub largest_win: Decimal,
    /// Most negative losing pnl, zero without losses
    pub largest_loss: Decimal,
    pub max_drawdown: Decimal,
    pub max_drawdown_percent: Decimal,
    pub sharpe_ratio: Decimal,
}

/// A point on the equity curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: i64,
    pub equity: Decimal,
}

/// Result of a backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub initial_capital: Decimal,
    pub final_equity: Decimal,
    pub start_time: i64,
    pub end_time: i64,
    pub trades: Vec<BacktestTrade>,
    pub metrics: Metrics,
    pub equity_curve: Vec<EquityPoint>,
}
