//! Technical indicators over a closing-price series
//!
//! Every function here is pure and index-aligned: the output has exactly the
//! same length as the input. Positions without enough history hold a
//! sentinel instead of a real value (`0.0` for SMA, `50.0` for RSI); the
//! signal generators skip those positions with their own warm-up guards.

/// SMA value reported before `period` prices are available
pub const SMA_WARMUP: f64 = 0.0;

/// RSI value reported before `period` price changes are available
pub const RSI_NEUTRAL: f64 = 50.0;

/// RS used when the average loss over the window is zero
const RS_NO_LOSS: f64 = 100.0;

// ============================================================================
// Moving averages
// ============================================================================

/// Simple moving average over a trailing window of `period` prices.
pub fn sma(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![SMA_WARMUP; prices.len()];
    }

    (0..prices.len())
        .map(|i| {
            if i + 1 < period {
                SMA_WARMUP
            } else {
                prices[i + 1 - period..=i].iter().sum::<f64>() / period as f64
            }
        })
        .collect()
}

/// Exponential moving average with `k = 2 / (period + 1)`.
///
/// The seed is the SMA of the first `period` prices and sits at index
/// `period - 1`; earlier indices repeat the seed rather than padding with
/// zeros, so a difference of two EMAs never jumps during warm-up. When the
/// series is shorter than `period` the seed is the mean of what is there.
pub fn ema(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.is_empty() {
        return vec![SMA_WARMUP; prices.len()];
    }

    let seed_len = period.min(prices.len());
    let seed = prices[..seed_len].iter().sum::<f64>() / seed_len as f64;
    let k = 2.0 / (period as f64 + 1.0);

    prices
        .iter()
        .enumerate()
        .scan(seed, |prev, (i, &price)| {
            if i >= period {
                *prev = price * k + *prev * (1.0 - k);
            }
            Some(*prev)
        })
        .collect()
}

// ============================================================================
// Oscillators
// ============================================================================

/// Relative Strength Index over a trailing window of `period` price changes.
///
/// Averages are plain means over the window (no Wilder smoothing). A window
/// without losses uses RS = 100, so the value saturates just below 100.
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    (0..prices.len())
        .map(|i| {
            if period == 0 || i < period {
                return RSI_NEUTRAL;
            }

            let (gain, loss) = prices[i - period..=i]
                .windows(2)
                .fold((0.0, 0.0), |(gain, loss), w| {
                    let change = w[1] - w[0];
                    if change > 0.0 {
                        (gain + change, loss)
                    } else {
                        (gain, loss - change)
                    }
                });

            let avg_gain = gain / period as f64;
            let avg_loss = loss / period as f64;
            let rs = if avg_loss == 0.0 {
                RS_NO_LOSS
            } else {
                avg_gain / avg_loss
            };

            100.0 - 100.0 / (1.0 + rs)
        })
        .collect()
}

// ============================================================================
// MACD
// ============================================================================

/// MACD line, its signal line and the histogram, index-aligned with the input
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Moving Average Convergence/Divergence.
///
/// Only meaningful when `fast < slow`; this is not checked.
pub fn macd(prices: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let fast_ema = ema(prices, fast);
    let slow_ema = ema(prices, slow);

    let macd: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal = ema(&macd, signal_period);
    let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_sma_warmup_and_values() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out, vec![0.0, 0.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_sma_constant_series() {
        let prices = vec![42.5; 30];
        let out = sma(&prices, 7);
        for v in &out[6..] {
            assert_close(*v, 42.5);
        }
        assert!(out[..6].iter().all(|v| *v == SMA_WARMUP));
    }

    #[test]
    fn test_sma_short_and_empty_input() {
        assert_eq!(sma(&[1.0, 2.0], 5), vec![0.0, 0.0]);
        assert!(sma(&[], 3).is_empty());
        assert_eq!(sma(&[1.0, 2.0], 0), vec![0.0, 0.0]);
    }

    #[test]
    fn test_ema_seed_and_recursion() {
        let out = ema(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        // seed = (1 + 2 + 3) / 3 = 2, k = 0.5
        assert_eq!(out.len(), 5);
        assert_close(out[0], 2.0);
        assert_close(out[2], 2.0);
        assert_close(out[3], 3.0);
        assert_close(out[4], 4.0);
    }

    #[test]
    fn test_ema_shorter_than_period() {
        let out = ema(&[2.0, 4.0], 5);
        assert_eq!(out, vec![3.0, 3.0]);
    }

    #[test]
    fn test_rsi_neutral_during_warmup() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&prices, 14);
        assert_eq!(out.len(), 20);
        assert!(out[..14].iter().all(|v| *v == RSI_NEUTRAL));
    }

    #[test]
    fn test_rsi_saturates_without_losses() {
        let prices: Vec<f64> = (0..40).map(|i| 10.0 + i as f64 * 0.5).collect();
        let out = rsi(&prices, 14);
        for v in &out[14..] {
            assert_close(*v, 100.0 - 100.0 / 101.0);
            assert!(*v <= 100.0);
        }
    }

    #[test]
    fn test_rsi_zero_without_gains() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&prices, 5);
        for v in &out[5..] {
            assert_close(*v, 0.0);
        }
    }

    #[test]
    fn test_rsi_balanced_window() {
        let out = rsi(&[1.0, 2.0, 1.0, 2.0, 1.0], 2);
        assert_close(out[2], 50.0);
        assert_close(out[3], 50.0);
    }

    #[test]
    fn test_macd_constant_series_is_flat() {
        let prices = vec![100.0; 60];
        let out = macd(&prices, 12, 26, 9);
        assert_eq!(out.macd.len(), 60);
        assert_eq!(out.signal.len(), 60);
        assert_eq!(out.histogram.len(), 60);
        for i in 0..60 {
            assert_close(out.macd[i], 0.0);
            assert_close(out.histogram[i], 0.0);
        }
    }

    #[test]
    fn test_macd_uptrend_positive() {
        let prices: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let out = macd(&prices, 12, 26, 9);
        assert!(out.macd[79] > 0.0, "fast EMA should lead in an uptrend");
    }
}
