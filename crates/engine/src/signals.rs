//! Signal generators
//!
//! Each generator turns a closing-price series into one `Signal` per candle.
//! All of them are crossing detectors: a signal fires only on the step where
//! the relation between two lines (or a line and a threshold) flips, and the
//! first `warmup()` positions are always HOLD.

use tracing::warn;

use crate::error::{BacktestError, EngineResult};
use crate::indicators;
use crate::strategy::{Strategy, StrategyKind};
use crate::types::{closes, Candle, Signal, UnsupportedStrategyPolicy};

// ============================================================================
// Core trait
// ============================================================================

/// Maps a price series to an index-aligned signal series
pub trait SignalGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Leading positions that always yield HOLD
    fn warmup(&self) -> usize;

    /// Returns exactly `prices.len()` signals
    fn generate(&self, prices: &[f64]) -> Vec<Signal>;
}

/// Upward / downward flip of `a` relative to `b` between two steps
fn cross(prev_a: f64, prev_b: f64, a: f64, b: f64) -> Signal {
    if prev_a <= prev_b && a > b {
        Signal::Buy
    } else if prev_a >= prev_b && a < b {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Apply `detect(i)` for every index past the warm-up, HOLD before it
fn detect_after_warmup(
    len: usize,
    warmup: usize,
    detect: impl Fn(usize) -> Signal,
) -> Vec<Signal> {
    (0..len)
        .map(|i| {
            // i >= 1 keeps i - 1 in range even with a zero warm-up
            if i < warmup || i == 0 {
                Signal::Hold
            } else {
                detect(i)
            }
        })
        .collect()
}

// ============================================================================
// 1. SMA Crossover
// ============================================================================

pub struct SmaCrossSignalGenerator {
    fast_period: usize,
    slow_period: usize,
}

impl SmaCrossSignalGenerator {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
        }
    }
}

impl SignalGenerator for SmaCrossSignalGenerator {
    fn name(&self) -> &str {
        "SMACrossover"
    }

    fn warmup(&self) -> usize {
        self.fast_period.max(self.slow_period)
    }

    fn generate(&self, prices: &[f64]) -> Vec<Signal> {
        let fast = indicators::sma(prices, self.fast_period);
        let slow = indicators::sma(prices, self.slow_period);

        detect_after_warmup(prices.len(), self.warmup(), |i| {
            cross(fast[i - 1], slow[i - 1], fast[i], slow[i])
        })
    }
}

// ============================================================================
// 2. RSI threshold
// ============================================================================

pub struct RsiSignalGenerator {
    period: usize,
    oversold: f64,
    overbought: f64,
}

impl RsiSignalGenerator {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        Self {
            period,
            oversold,
            overbought,
        }
    }
}

impl SignalGenerator for RsiSignalGenerator {
    fn name(&self) -> &str {
        "RSI"
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn generate(&self, prices: &[f64]) -> Vec<Signal> {
        let rsi = indicators::rsi(prices, self.period);

        detect_after_warmup(prices.len(), self.warmup(), |i| {
            let (prev, curr) = (rsi[i - 1], rsi[i]);
            if prev <= self.oversold && curr > self.oversold {
                // Leaving oversold
                Signal::Buy
            } else if prev >= self.overbought && curr < self.overbought {
                // Leaving overbought
                Signal::Sell
            } else {
                Signal::Hold
            }
        })
    }
}

// ============================================================================
// 3. MACD
// ============================================================================

pub struct MacdSignalGenerator {
    fast: usize,
    slow: usize,
    signal_period: usize,
}

impl MacdSignalGenerator {
    pub fn new(fast: usize, slow: usize, signal_period: usize) -> Self {
        Self {
            fast,
            slow,
            signal_period,
        }
    }
}

impl SignalGenerator for MacdSignalGenerator {
    fn name(&self) -> &str {
        "MACD"
    }

    fn warmup(&self) -> usize {
        self.fast.max(self.slow) + self.signal_period
    }

    fn generate(&self, prices: &[f64]) -> Vec<Signal> {
        let out = indicators::macd(prices, self.fast, self.slow, self.signal_period);

        detect_after_warmup(prices.len(), self.warmup(), |i| {
            cross(out.macd[i - 1], out.signal[i - 1], out.macd[i], out.signal[i])
        })
    }
}

// ============================================================================
// Hold-only fallback
// ============================================================================

/// Emits HOLD everywhere; stands in for unsupported strategy types when the
/// caller opts into `UnsupportedStrategyPolicy::HoldAll`
pub struct HoldSignalGenerator;

impl SignalGenerator for HoldSignalGenerator {
    fn name(&self) -> &str {
        "Hold"
    }

    fn warmup(&self) -> usize {
        0
    }

    fn generate(&self, prices: &[f64]) -> Vec<Signal> {
        vec![Signal::Hold; prices.len()]
    }
}

// ============================================================================
// Factory
// ============================================================================

pub fn build_signal_generator(kind: &StrategyKind) -> Box<dyn SignalGenerator> {
    match *kind {
        StrategyKind::SmaCross {
            fast_period,
            slow_period,
        } => Box::new(SmaCrossSignalGenerator::new(fast_period, slow_period)),
        StrategyKind::Rsi {
            period,
            oversold,
            overbought,
        } => Box::new(RsiSignalGenerator::new(period, oversold, overbought)),
        StrategyKind::Macd {
            fast_period,
            slow_period,
            signal_period,
        } => Box::new(MacdSignalGenerator::new(
            fast_period,
            slow_period,
            signal_period,
        )),
    }
}

/// Resolve a caller-supplied strategy into a generator, applying the
/// unsupported-type policy. Invalid parameters are always an error.
pub fn resolve_signal_generator(
    strategy: &Strategy,
    policy: UnsupportedStrategyPolicy,
) -> EngineResult<Box<dyn SignalGenerator>> {
    match StrategyKind::try_from(strategy) {
        Ok(kind) => Ok(build_signal_generator(&kind)),
        Err(BacktestError::UnsupportedStrategy(strategy_type))
            if policy == UnsupportedStrategyPolicy::HoldAll =>
        {
            warn!(
                strategy = %strategy.name,
                strategy_type = %strategy_type,
                "Unsupported strategy type, every candle will HOLD"
            );
            Ok(Box::new(HoldSignalGenerator))
        }
        Err(e) => Err(e),
    }
}

/// Signals for a candle series under a validated strategy
pub fn generate_signals(candles: &[Candle], kind: &StrategyKind) -> Vec<Signal> {
    build_signal_generator(kind).generate(&closes(candles))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(signals: &[Signal], which: Signal) -> usize {
        signals.iter().filter(|s| **s == which).count()
    }

    /// Flat at 100, ramps up to 120, then falls back to 80
    fn golden_then_death() -> Vec<f64> {
        let mut prices = vec![100.0; 30];
        prices.extend((1..=10).map(|i| 100.0 + i as f64 * 2.0));
        prices.extend(vec![120.0; 10]);
        prices.extend((1..=20).map(|i| 120.0 - i as f64 * 2.0));
        prices.extend(vec![80.0; 10]);
        prices
    }

    #[test]
    fn test_cross_tie_break() {
        assert_eq!(cross(1.0, 1.0, 2.0, 1.0), Signal::Buy);
        assert_eq!(cross(1.0, 1.0, 0.0, 1.0), Signal::Sell);
        assert_eq!(cross(1.0, 1.0, 1.0, 1.0), Signal::Hold);
        assert_eq!(cross(2.0, 1.0, 3.0, 1.0), Signal::Hold);
    }

    #[test]
    fn test_sma_cross_single_golden_and_death_cross() {
        let prices = golden_then_death();
        let gen = SmaCrossSignalGenerator::new(3, 10);
        let signals = gen.generate(&prices);
        assert_eq!(signals.len(), prices.len());
        assert_eq!(count(&signals, Signal::Buy), 1);
        assert_eq!(count(&signals, Signal::Sell), 1);

        let buy = signals.iter().position(|s| *s == Signal::Buy).unwrap();
        let sell = signals.iter().position(|s| *s == Signal::Sell).unwrap();
        // The ramp starts at index 30; the 3-bar SMA leads immediately
        assert_eq!(buy, 30);
        assert!(sell > buy);
    }

    #[test]
    fn test_sma_cross_flat_series_holds() {
        let prices = vec![50.0; 40];
        let signals = SmaCrossSignalGenerator::new(5, 20).generate(&prices);
        assert!(signals.iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn test_warmup_always_holds() {
        let prices: Vec<f64> = (0..60)
            .map(|i| 100.0 + ((i as f64) * 0.7).sin() * 10.0)
            .collect();
        let generators: Vec<Box<dyn SignalGenerator>> = vec![
            Box::new(SmaCrossSignalGenerator::new(3, 8)),
            Box::new(RsiSignalGenerator::new(6, 30.0, 70.0)),
            Box::new(MacdSignalGenerator::new(4, 9, 3)),
        ];
        for gen in generators {
            let signals = gen.generate(&prices);
            assert_eq!(signals.len(), prices.len());
            assert!(
                signals[..gen.warmup()].iter().all(|s| *s == Signal::Hold),
                "{} emitted during warm-up",
                gen.name()
            );
        }
    }

    #[test]
    fn test_rsi_buy_after_oversold_and_sell_after_overbought() {
        let mut prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64 * 3.0).collect();
        prices.extend((0..20).map(|i| 43.0 + i as f64 * 4.0));
        prices.extend((0..20).map(|i| 119.0 - i as f64 * 3.0));

        let signals = RsiSignalGenerator::new(14, 30.0, 70.0).generate(&prices);
        let buy = signals.iter().position(|s| *s == Signal::Buy);
        let sell = signals.iter().position(|s| *s == Signal::Sell);
        assert!(buy.is_some(), "RSI should leave the oversold zone");
        assert!(sell.is_some(), "RSI should leave the overbought zone");
        assert!(buy < sell);
    }

    #[test]
    fn test_macd_detects_trend_reversal() {
        let mut prices: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        prices.extend((0..60).map(|i| 140.0 + i as f64 * 1.5));
        prices.extend((0..60).map(|i| 230.0 - i as f64 * 1.5));

        let signals = MacdSignalGenerator::new(12, 26, 9).generate(&prices);
        assert!(count(&signals, Signal::Buy) >= 1);
        assert!(count(&signals, Signal::Sell) >= 1);
    }

    #[test]
    fn test_short_series_is_all_hold() {
        let signals = MacdSignalGenerator::new(12, 26, 9).generate(&[1.0, 2.0, 3.0]);
        assert_eq!(signals, vec![Signal::Hold; 3]);
        assert!(RsiSignalGenerator::new(14, 30.0, 70.0).generate(&[]).is_empty());
    }

    #[test]
    fn test_resolve_policy() {
        let bollinger = Strategy::new("bb", "BOLLINGER");
        let err = resolve_signal_generator(&bollinger, UnsupportedStrategyPolicy::Reject)
            .err()
            .unwrap();
        assert_eq!(err, BacktestError::UnsupportedStrategy("BOLLINGER".to_string()));

        let gen = resolve_signal_generator(&bollinger, UnsupportedStrategyPolicy::HoldAll).unwrap();
        assert_eq!(gen.name(), "Hold");
        assert_eq!(gen.generate(&[1.0, 2.0]), vec![Signal::Hold; 2]);

        let bad = Strategy::new("bad", "RSI").with_param("period", 0.0);
        assert!(resolve_signal_generator(&bad, UnsupportedStrategyPolicy::HoldAll).is_err());
    }
}
