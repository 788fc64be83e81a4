//! Backtest Engine: strategy backtesting over historical candles
//!
//! Provides:
//! - Pure indicators (SMA, EMA, RSI, MACD)
//! - Signal generators for SMA crossover, RSI threshold and MACD strategies
//! - A single-position LONG trade simulator
//! - Performance metrics and equity curve
//! - Binance and Alpha Vantage candle sources, plus seeded synthetic candles

pub mod api;
pub mod demo;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod signals;
pub mod simulator;
pub mod strategy;
pub mod types;

// Re-exports for convenience
pub use api::{AlphaVantageClient, BinanceClient, CandleQuery, CandleSource};
pub use demo::{random_walk_candles, SyntheticSeries};
pub use engine::BacktestEngine;
pub use error::{BacktestError, EngineResult};
pub use indicators::MacdSeries;
pub use metrics::{calculate_metrics, equity_curve};
pub use signals::{build_signal_generator, generate_signals, SignalGenerator};
pub use simulator::simulate_trades;
pub use strategy::{get_catalog, Strategy, StrategyCatalogEntry, StrategyKind};
pub use types::*;
