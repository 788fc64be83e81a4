//! Backtest orchestrator
//!
//! candles + strategy -> signals -> trades -> metrics / equity curve

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use crate::error::{BacktestError, EngineResult};
use crate::metrics::{calculate_metrics, equity_curve};
use crate::signals::resolve_signal_generator;
use crate::simulator::simulate_trades;
use crate::strategy::Strategy;
use crate::types::*;

/// Runs backtests under a fixed configuration. Holds no state between runs.
#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// Shorthand for the default policies with the given capital and commission
    pub fn with_capital(initial_capital: Decimal, commission: Decimal) -> Self {
        Self::new(BacktestConfig {
            initial_capital,
            commission,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run a backtest of `strategy` over `candles`
    pub fn run(&self, candles: &[Candle], strategy: &Strategy) -> EngineResult<BacktestResult> {
        self.validate_config()?;
        let config = &self.config;

        let generator = resolve_signal_generator(strategy, config.unsupported_strategy)?;

        info!(
            strategy = %strategy.name,
            generator = generator.name(),
            bars = candles.len(),
            capital = %config.initial_capital,
            "Starting backtest"
        );

        let signals = generator.generate(&closes(candles));
        let trades = simulate_trades(candles, &signals, config.commission, config.open_position);
        let metrics = calculate_metrics(&trades, config.initial_capital);

        let start_time = candles.first().map(|c| c.time).unwrap_or(0);
        let end_time = candles.last().map(|c| c.time).unwrap_or(0);
        let equity_curve = equity_curve(&trades, config.initial_capital, start_time);
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(config.initial_capital);

        info!(
            total_trades = metrics.total_trades,
            win_rate = %metrics.win_rate,
            net_profit = %metrics.net_profit,
            max_drawdown = %metrics.max_drawdown,
            profit_factor = %metrics.profit_factor,
            "Backtest complete"
        );

        Ok(BacktestResult {
            strategy_name: strategy.name.clone(),
            initial_capital: config.initial_capital,
            final_equity,
            start_time,
            end_time,
            trades,
            metrics,
            equity_curve,
        })
    }

    fn validate_config(&self) -> EngineResult<()> {
        let BacktestConfig {
            initial_capital,
            commission,
            ..
        } = self.config;

        if initial_capital <= Decimal::ZERO {
            return Err(BacktestError::InvalidConfig(format!(
                "initial capital must be positive, got {}",
                initial_capital
            )));
        }
        // Two legs of commission must leave part of the price move
        if commission < Decimal::ZERO || commission >= dec!(0.5) {
            return Err(BacktestError::InvalidConfig(format!(
                "commission must be in [0, 0.5), got {}",
                commission
            )));
        }
        Ok(())
    }
}
