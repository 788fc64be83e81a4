//! Performance metrics and equity curve over closed trades

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{BacktestTrade, EquityPoint, Metrics, ProfitFactor};

/// Periods per year used to annualize the per-trade Sharpe ratio
const ANNUALIZATION_PERIODS: f64 = 252.0;

/// Aggregate metrics for one run. An empty trade list yields `Metrics::default()`.
pub fn calculate_metrics(trades: &[BacktestTrade], initial_capital: Decimal) -> Metrics {
    if trades.is_empty() {
        return Metrics::default();
    }

    let hundred = dec!(100);

    let wins: Vec<Decimal> = trades
        .iter()
        .map(|t| t.pnl)
        .filter(|pnl| *pnl > Decimal::ZERO)
        .collect();
    let losses: Vec<Decimal> = trades
        .iter()
        .map(|t| t.pnl)
        .filter(|pnl| *pnl < Decimal::ZERO)
        .collect();

    let total_trades = trades.len() as u32;
    let winning_trades = wins.len() as u32;
    let losing_trades = losses.len() as u32;

    let total_profit: Decimal = wins.iter().sum();
    let total_loss: Decimal = losses.iter().sum::<Decimal>().abs();

    // Profit factor = gross profits / gross losses
    let profit_factor = if total_loss > Decimal::ZERO {
        ProfitFactor::Finite(total_profit / total_loss)
    } else if total_profit > Decimal::ZERO {
        ProfitFactor::Infinite
    } else {
        ProfitFactor::Finite(Decimal::ZERO)
    };

    let average_win = if winning_trades > 0 {
        total_profit / Decimal::from(winning_trades)
    } else {
        Decimal::ZERO
    };
    let average_loss = if losing_trades > 0 {
        total_loss / Decimal::from(losing_trades)
    } else {
        Decimal::ZERO
    };

    let (max_drawdown, max_drawdown_percent) = max_drawdown(trades, initial_capital);

    Metrics {
        total_trades,
        winning_trades,
        losing_trades,
        win_rate: Decimal::from(winning_trades) / Decimal::from(total_trades) * hundred,
        total_profit,
        total_loss,
        net_profit: total_profit - total_loss,
        profit_factor,
        average_win,
        average_loss,
        largest_win: wins.iter().copied().max().unwrap_or(Decimal::ZERO),
        largest_loss: losses.iter().copied().min().unwrap_or(Decimal::ZERO),
        max_drawdown,
        max_drawdown_percent,
        sharpe_ratio: sharpe_ratio(trades),
    }
}

/// Equity after each trade, starting from `initial_capital`
fn running_equity(
    trades: &[BacktestTrade],
    initial_capital: Decimal,
) -> impl Iterator<Item = (i64, Decimal)> + '_ {
    trades.iter().scan(initial_capital, |equity, t| {
        *equity += t.pnl;
        Some((t.exit_time, *equity))
    })
}

/// One point at `initial_capital` plus one per closed trade.
///
/// The first point is stamped with the first trade's exit time, or with
/// `fallback_time` when there are no trades.
pub fn equity_curve(
    trades: &[BacktestTrade],
    initial_capital: Decimal,
    fallback_time: i64,
) -> Vec<EquityPoint> {
    let first_time = trades.first().map(|t| t.exit_time).unwrap_or(fallback_time);

    std::iter::once(EquityPoint {
        time: first_time,
        equity: initial_capital,
    })
    .chain(
        running_equity(trades, initial_capital).map(|(time, equity)| EquityPoint { time, equity }),
    )
    .collect()
}

/// Largest peak-to-trough decline of trade-by-trade equity, absolute and as a
/// percentage of the peak it fell from
pub fn max_drawdown(trades: &[BacktestTrade], initial_capital: Decimal) -> (Decimal, Decimal) {
    let hundred = dec!(100);
    let mut peak = initial_capital;
    let mut max_dd = Decimal::ZERO;
    let mut max_dd_pct = Decimal::ZERO;

    for (_, equity) in running_equity(trades, initial_capital) {
        if equity > peak {
            peak = equity;
        }
        let drawdown = peak - equity;
        if drawdown > max_dd {
            max_dd = drawdown;
            max_dd_pct = if peak > Decimal::ZERO {
                drawdown / peak * hundred
            } else {
                Decimal::ZERO
            };
        }
    }

    (max_dd, max_dd_pct)
}

/// Annualized Sharpe-like ratio of per-trade percentage returns.
///
/// Uses the population standard deviation and treats every trade as one
/// period, so it is not a time-weighted figure.
pub fn sharpe_ratio(trades: &[BacktestTrade]) -> Decimal {
    if trades.is_empty() {
        return Decimal::ZERO;
    }

    let returns: Vec<f64> = trades
        .iter()
        .map(|t| t.pnl_percent.to_f64().unwrap_or(0.0))
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev < 1e-10 {
        return Decimal::ZERO;
    }

    let sharpe = mean / std_dev * ANNUALIZATION_PERIODS.sqrt();
    Decimal::from_f64(sharpe)
        .map(|v| v.round_dp(4))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn make_trades(pnls: &[Decimal]) -> Vec<BacktestTrade> {
        pnls.iter()
            .enumerate()
            .map(|(i, &pnl)| BacktestTrade {
                entry_time: (2 * i as i64) * 60000,
                exit_time: (2 * i as i64 + 1) * 60000,
                entry_price: dec!(100),
                exit_price: dec!(100) + pnl,
                direction: Direction::Long,
                quantity: Decimal::ONE,
                pnl,
                pnl_percent: pnl,
            })
            .collect()
    }

    #[test]
    fn test_mixed_trades() {
        let trades = make_trades(&[dec!(100), dec!(-50), dec!(30), dec!(-80)]);
        let m = calculate_metrics(&trades, dec!(1000));

        assert_eq!(m.total_trades, 4);
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 2);
        assert_eq!(m.win_rate, dec!(50));
        assert_eq!(m.total_profit, dec!(130));
        assert_eq!(m.total_loss, dec!(130));
        assert_eq!(m.net_profit, Decimal::ZERO);
        assert_eq!(m.profit_factor, ProfitFactor::Finite(dec!(1)));
        assert_eq!(m.average_win, dec!(65));
        assert_eq!(m.average_loss, dec!(65));
        assert_eq!(m.largest_win, dec!(100));
        assert_eq!(m.largest_loss, dec!(-80));

        // Peak 1100 after the first trade, trough 1000 after the last
        assert_eq!(m.max_drawdown, dec!(100));
        assert_eq!(m.max_drawdown_percent.round_dp(4), dec!(9.0909));
    }

    #[test]
    fn test_equity_curve_points() {
        let trades = make_trades(&[dec!(100), dec!(-50), dec!(30), dec!(-80)]);
        let curve = equity_curve(&trades, dec!(1000), 0);
        let equities: Vec<Decimal> = curve.iter().map(|p| p.equity).collect();
        assert_eq!(
            equities,
            vec![dec!(1000), dec!(1100), dec!(1050), dec!(1080), dec!(1000)]
        );
        assert_eq!(curve[0].time, trades[0].exit_time);
        for pair in curve.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
    }

    #[test]
    fn test_equity_curve_without_trades() {
        let curve = equity_curve(&[], dec!(5000), 1_700_000_000_000);
        assert_eq!(
            curve,
            vec![EquityPoint {
                time: 1_700_000_000_000,
                equity: dec!(5000)
            }]
        );
    }

    #[test]
    fn test_empty_trades_all_zero() {
        let m = calculate_metrics(&[], dec!(10000));
        assert_eq!(m, Metrics::default());
        assert_eq!(m.total_trades, 0);
        assert_eq!(m.win_rate, Decimal::ZERO);
        assert_eq!(m.profit_factor, ProfitFactor::Finite(Decimal::ZERO));
        assert_eq!(m.sharpe_ratio, Decimal::ZERO);
    }

    #[test]
    fn test_profit_factor_infinite_only_without_losses() {
        let m = calculate_metrics(&make_trades(&[dec!(10), dec!(5)]), dec!(1000));
        assert!(m.profit_factor.is_infinite());
        assert_eq!(m.profit_factor.to_string(), "∞");
        assert_eq!(m.max_drawdown, Decimal::ZERO);

        let m = calculate_metrics(&make_trades(&[Decimal::ZERO, Decimal::ZERO]), dec!(1000));
        assert_eq!(m.profit_factor, ProfitFactor::Finite(Decimal::ZERO));
        assert_eq!(m.total_trades, 2);
        assert_eq!(m.winning_trades, 0);
        assert_eq!(m.losing_trades, 0);
        assert_eq!(m.win_rate, Decimal::ZERO);

        let m = calculate_metrics(&make_trades(&[dec!(-10)]), dec!(1000));
        assert_eq!(m.profit_factor, ProfitFactor::Finite(Decimal::ZERO));
        assert_eq!(m.largest_loss, dec!(-10));
        assert_eq!(m.largest_win, Decimal::ZERO);
    }

    #[test]
    fn test_sharpe_ratio() {
        // mean 3, population std-dev 1
        let sharpe = sharpe_ratio(&make_trades(&[dec!(2), dec!(4)]));
        let expected = 3.0 * 252f64.sqrt();
        assert!((sharpe.to_f64().unwrap() - expected).abs() < 1e-3);

        // Identical returns have no dispersion
        assert_eq!(sharpe_ratio(&make_trades(&[dec!(1.5); 4])), Decimal::ZERO);
        assert_eq!(sharpe_ratio(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_metrics_idempotent() {
        let trades = make_trades(&[dec!(12.5), dec!(-3.25), dec!(7), dec!(-9.5), dec!(4)]);
        let a = calculate_metrics(&trades, dec!(10000));
        let b = calculate_metrics(&trades, dec!(10000));
        assert_eq!(a, b);
    }
}
