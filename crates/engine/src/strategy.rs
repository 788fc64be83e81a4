//! Strategy configuration
//!
//! `Strategy` is the loose wire shape (a type tag plus named numeric
//! parameters). It is turned into the typed `StrategyKind` when a backtest
//! consumes it; that conversion is where parameters get validated and
//! defaults filled in.

use crate::error::{BacktestError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SMA_CROSS: &str = "SMA_CROSS";
pub const RSI: &str = "RSI";
pub const MACD: &str = "MACD";

/// A declarative trading strategy as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    #[serde(rename = "type")]
    pub strategy_type: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
}

impl Strategy {
    pub fn new(name: impl Into<String>, strategy_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategy_type: strategy_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn sma_cross(fast_period: usize, slow_period: usize) -> Self {
        StrategyKind::SmaCross {
            fast_period,
            slow_period,
        }
        .to_strategy("SMA Crossover")
    }

    pub fn rsi(period: usize, oversold: f64, overbought: f64) -> Self {
        StrategyKind::Rsi {
            period,
            oversold,
            overbought,
        }
        .to_strategy("RSI")
    }

    pub fn macd(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        StrategyKind::Macd {
            fast_period,
            slow_period,
            signal_period,
        }
        .to_strategy("MACD")
    }
}

/// Validated strategy with typed parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrategyKind {
    /// Fast SMA crossing the slow SMA (golden / death cross)
    SmaCross {
        fast_period: usize,
        slow_period: usize,
    },
    /// RSI leaving the oversold / overbought zone
    Rsi {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    /// MACD line crossing its signal line
    Macd {
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    },
}

impl StrategyKind {
    /// Default parameters for a type tag, `None` when the tag is unsupported.
    /// Tags match exactly: `RSI`, not `rsi`.
    pub fn default_for(strategy_type: &str) -> Option<Self> {
        match strategy_type {
            SMA_CROSS => Some(Self::SmaCross {
                fast_period: 10,
                slow_period: 20,
            }),
            RSI => Some(Self::Rsi {
                period: 14,
                oversold: 30.0,
                overbought: 70.0,
            }),
            MACD => Some(Self::Macd {
                fast_period: 12,
                slow_period: 26,
                signal_period: 9,
            }),
            _ => None,
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::SmaCross { .. } => SMA_CROSS,
            Self::Rsi { .. } => RSI,
            Self::Macd { .. } => MACD,
        }
    }

    /// Number of leading candles that always yield HOLD
    pub fn warmup(&self) -> usize {
        match *self {
            Self::SmaCross {
                fast_period,
                slow_period,
            } => fast_period.max(slow_period),
            Self::Rsi { period, .. } => period,
            Self::Macd {
                fast_period,
                slow_period,
                signal_period,
            } => fast_period.max(slow_period) + signal_period,
        }
    }

    pub fn to_strategy(&self, name: impl Into<String>) -> Strategy {
        let strategy = Strategy::new(name, self.type_tag());
        match *self {
            Self::SmaCross {
                fast_period,
                slow_period,
            } => strategy
                .with_param("fastPeriod", fast_period as f64)
                .with_param("slowPeriod", slow_period as f64),
            Self::Rsi {
                period,
                oversold,
                overbought,
            } => strategy
                .with_param("period", period as f64)
                .with_param("oversold", oversold)
                .with_param("overbought", overbought),
            Self::Macd {
                fast_period,
                slow_period,
                signal_period,
            } => strategy
                .with_param("fastPeriod", fast_period as f64)
                .with_param("slowPeriod", slow_period as f64)
                .with_param("signalPeriod", signal_period as f64),
        }
    }
}

impl TryFrom<&Strategy> for StrategyKind {
    type Error = BacktestError;

    fn try_from(strategy: &Strategy) -> EngineResult<Self> {
        let defaults = StrategyKind::default_for(&strategy.strategy_type)
            .ok_or_else(|| BacktestError::UnsupportedStrategy(strategy.strategy_type.clone()))?;

        let kind = match defaults {
            Self::SmaCross {
                fast_period,
                slow_period,
            } => Self::SmaCross {
                fast_period: period_param(strategy, "fastPeriod", fast_period)?,
                slow_period: period_param(strategy, "slowPeriod", slow_period)?,
            },
            Self::Rsi {
                period,
                oversold,
                overbought,
            } => Self::Rsi {
                period: period_param(strategy, "period", period)?,
                oversold: threshold_param(strategy, "oversold", oversold)?,
                overbought: threshold_param(strategy, "overbought", overbought)?,
            },
            Self::Macd {
                fast_period,
                slow_period,
                signal_period,
            } => Self::Macd {
                fast_period: period_param(strategy, "fastPeriod", fast_period)?,
                slow_period: period_param(strategy, "slowPeriod", slow_period)?,
                signal_period: period_param(strategy, "signalPeriod", signal_period)?,
            },
        };

        Ok(kind)
    }
}

/// Look a parameter up by its camelCase key, falling back to snake_case
fn lookup(strategy: &Strategy, key: &str) -> Option<f64> {
    strategy
        .parameters
        .get(key)
        .or_else(|| strategy.parameters.get(&to_snake_case(key)))
        .copied()
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn invalid(strategy: &Strategy, key: &str, reason: String) -> BacktestError {
    BacktestError::InvalidParameter {
        strategy: strategy.name.clone(),
        name: key.to_string(),
        reason,
    }
}

fn period_param(strategy: &Strategy, key: &str, default: usize) -> EngineResult<usize> {
    match lookup(strategy, key) {
        None => Ok(default),
        Some(v) if v.is_finite() && v >= 1.0 && v.fract() == 0.0 => Ok(v as usize),
        Some(v) => Err(invalid(
            strategy,
            key,
            format!("expected a positive whole number, got {}", v),
        )),
    }
}

fn threshold_param(strategy: &Strategy, key: &str, default: f64) -> EngineResult<f64> {
    match lookup(strategy, key) {
        None => Ok(default),
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(invalid(strategy, key, format!("expected a finite number, got {}", v))),
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A supported strategy type with its default configuration
#[derive(Debug, Clone, Serialize)]
pub struct StrategyCatalogEntry {
    pub strategy_type: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub warmup: usize,
    pub default_strategy: Strategy,
}

pub fn get_catalog() -> Vec<StrategyCatalogEntry> {
    [
        (
            SMA_CROSS,
            "SMA Crossover",
            "Buy on a golden cross of the fast SMA over the slow SMA, sell on a death cross",
        ),
        (
            RSI,
            "RSI",
            "Buy when RSI rises out of the oversold zone, sell when it falls out of the overbought zone",
        ),
        (
            MACD,
            "MACD",
            "Buy when the MACD line crosses above its signal line, sell when it crosses below",
        ),
    ]
    .into_iter()
    .filter_map(|(tag, display_name, description)| {
        let kind = StrategyKind::default_for(tag)?;
        Some(StrategyCatalogEntry {
            strategy_type: tag,
            display_name,
            description,
            warmup: kind.warmup(),
            default_strategy: kind.to_strategy(display_name),
        })
    })
    .collect()
}
