//! Single-position trade simulator
//!
//! Walks candles and signals in lockstep. A BUY opens a LONG at the candle
//! close when flat, a SELL closes it at the candle close; every other
//! combination is ignored. Quantity is always one unit.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::types::{BacktestTrade, Candle, Direction, OpenPositionPolicy, Signal};

/// Position state during simulation
struct OpenPosition {
    entry_time: i64,
    entry_price: Decimal,
    direction: Direction,
}

impl OpenPosition {
    fn open(candle: &Candle) -> Self {
        Self {
            entry_time: candle.time,
            entry_price: candle.close,
            direction: Direction::Long,
        }
    }

    /// Close at `candle.close`. Commission is charged twice (entry and exit)
    /// as a fraction of the price move, not of notional.
    fn close(self, candle: &Candle, commission: Decimal) -> BacktestTrade {
        let hundred = dec!(100);
        let exit_price = candle.close;
        let price_move = exit_price - self.entry_price;

        let pnl = price_move * (Decimal::ONE - commission * dec!(2));
        let pnl_percent = if self.entry_price > Decimal::ZERO {
            price_move / self.entry_price * hundred
        } else {
            Decimal::ZERO
        };

        BacktestTrade {
            entry_time: self.entry_time,
            exit_time: candle.time,
            entry_price: self.entry_price,
            exit_price,
            direction: self.direction,
            quantity: Decimal::ONE,
            pnl,
            pnl_percent,
        }
    }
}

/// Turn an index-aligned signal series into closed trades, ordered by exit time
pub fn simulate_trades(
    candles: &[Candle],
    signals: &[Signal],
    commission: Decimal,
    open_position: OpenPositionPolicy,
) -> Vec<BacktestTrade> {
    let mut trades: Vec<BacktestTrade> = Vec::new();
    let mut position: Option<OpenPosition> = None;

    for (candle, signal) in candles.iter().zip(signals) {
        match signal {
            Signal::Buy => {
                if position.is_none() {
                    debug!(price = %candle.close, time = candle.time, "Opened LONG position");
                    position = Some(OpenPosition::open(candle));
                }
            }
            Signal::Sell => {
                if let Some(pos) = position.take() {
                    let trade = pos.close(candle, commission);
                    debug!(
                        entry = %trade.entry_price,
                        exit = %trade.exit_price,
                        pnl = %trade.pnl,
                        "Closed position"
                    );
                    trades.push(trade);
                }
            }
            Signal::Hold => {}
        }
    }

    if let Some(pos) = position {
        match open_position {
            OpenPositionPolicy::Abandon => {
                debug!(
                    entry_time = pos.entry_time,
                    entry = %pos.entry_price,
                    "Position still open at end of series, dropped"
                );
            }
            OpenPositionPolicy::CloseAtLastCandle => {
                if let Some(last) = candles.last().filter(|c| c.time > pos.entry_time) {
                    trades.push(pos.close(last, commission));
                }
            }
        }
    }

    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_candles(prices: &[Decimal]) -> Vec<Candle> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| Candle {
                time: (i as i64) * 60000,
                open: price,
                high: price + dec!(1),
                low: price - dec!(1),
                close: price,
                volume: dec!(100),
            })
            .collect()
    }

    use Signal::{Buy, Hold, Sell};

    #[test]
    fn test_round_trip_with_commission() {
        let candles = make_candles(&[dec!(100), dec!(105), dec!(110)]);
        let trades = simulate_trades(
            &candles,
            &[Buy, Hold, Sell],
            dec!(0.001),
            OpenPositionPolicy::Abandon,
        );

        assert_eq!(trades.len(), 1);
        let t = &trades[0];
        assert_eq!(t.entry_time, 0);
        assert_eq!(t.exit_time, 120000);
        assert_eq!(t.entry_price, dec!(100));
        assert_eq!(t.exit_price, dec!(110));
        assert_eq!(t.direction, Direction::Long);
        assert_eq!(t.quantity, Decimal::ONE);
        assert_eq!(t.pnl, dec!(9.98));
        assert_eq!(t.pnl_percent, dec!(10));
    }

    #[test]
    fn test_losing_trade() {
        let candles = make_candles(&[dec!(200), dec!(190)]);
        let trades = simulate_trades(&candles, &[Buy, Sell], dec!(0), OpenPositionPolicy::Abandon);
        assert_eq!(trades[0].pnl, dec!(-10));
        assert_eq!(trades[0].pnl_percent, dec!(-5));
    }

    #[test]
    fn test_redundant_signals_ignored() {
        let candles = make_candles(&[
            dec!(10),
            dec!(11),
            dec!(12),
            dec!(13),
            dec!(14),
            dec!(15),
        ]);
        let signals = [Sell, Buy, Buy, Sell, Sell, Hold];
        let trades = simulate_trades(&candles, &signals, dec!(0), OpenPositionPolicy::Abandon);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].entry_price, dec!(11));
        assert_eq!(trades[0].exit_price, dec!(13));
    }

    #[test]
    fn test_open_position_abandoned_by_default() {
        let candles = make_candles(&[dec!(10), dec!(11), dec!(12)]);
        let trades = simulate_trades(&candles, &[Hold, Buy, Hold], dec!(0), OpenPositionPolicy::Abandon);
        assert!(trades.is_empty());
    }

    #[test]
    fn test_open_position_closed_at_last_candle() {
        let candles = make_candles(&[dec!(10), dec!(11), dec!(12)]);
        let trades = simulate_trades(
            &candles,
            &[Hold, Buy, Hold],
            dec!(0),
            OpenPositionPolicy::CloseAtLastCandle,
        );
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_time, 120000);
        assert_eq!(trades[0].pnl, dec!(1));

        // Entered on the last candle: nothing to close against
        let trades = simulate_trades(
            &candles,
            &[Hold, Hold, Buy],
            dec!(0),
            OpenPositionPolicy::CloseAtLastCandle,
        );
        assert!(trades.is_empty());
    }

    #[test]
    fn test_trades_sorted_and_non_overlapping() {
        let candles = make_candles(&[
            dec!(10),
            dec!(12),
            dec!(11),
            dec!(9),
            dec!(13),
            dec!(14),
        ]);
        let signals = [Buy, Sell, Buy, Hold, Sell, Hold];
        let trades = simulate_trades(&candles, &signals, dec!(0.001), OpenPositionPolicy::Abandon);

        assert_eq!(trades.len(), 2);
        for t in &trades {
            assert!(t.entry_time < t.exit_time);
        }
        for pair in trades.windows(2) {
            assert!(pair[0].exit_time <= pair[1].entry_time);
        }
    }

    #[test]
    fn test_empty_inputs() {
        assert!(simulate_trades(&[], &[], dec!(0.001), OpenPositionPolicy::CloseAtLastCandle).is_empty());
    }
}
