//! Performance metrics over a journal's trades.
//!
//! Realized statistics use closed trades only, walked in exit order.
//! Every ratio falls back to 0.0 when its denominator is zero, so the
//! result never carries NaN or infinity for finite input.

use std::collections::{BTreeMap, HashMap};

use super::stats::{mean, population_stddev, safe_div, sharpe, sortino};
use super::trade::Trade;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metrics {
    pub total_trades: usize,
    pub open_trades: usize,
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub total_pnl: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub total_fees: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Percentage, 0-100.
    pub win_rate: f64,
    /// Gross profit over gross loss; 0.0 when there are no losses.
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    /// Population stddev of per-trade net P&L (currency units).
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    /// Percentage of capital suggested per trade.
    pub kelly_criterion: f64,
    pub expected_value: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    /// Heuristic, not a formal ruin probability.
    pub risk_of_ruin: f64,
    pub average_holding_period: f64,
    pub unrealized_pnl: f64,
}

impl Metrics {
    pub fn compute(trades: &[Trade]) -> Self {
        let closed = closed_in_exit_order(trades);
        let pnls: Vec<f64> = closed.iter().filter_map(|t| t.profit_loss()).collect();

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut breakeven_trades = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for &pnl in &pnls {
            if pnl > 0.0 {
                winning_trades += 1;
                gross_profit += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                losing_trades += 1;
                gross_loss += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                breakeven_trades += 1;
            }
        }

        let closed_trades = pnls.len();
        let win_rate = safe_div(winning_trades as f64, closed_trades as f64) * 100.0;
        let average_win = safe_div(gross_profit, winning_trades as f64);
        let average_loss = safe_div(gross_loss, losing_trades as f64);

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else {
            0.0
        };

        let drawdown = compute_drawdown(&pnls);
        let calmar_ratio = safe_div(mean(&pnls), drawdown.pct);

        let win_fraction = win_rate / 100.0;
        let expected_value = win_fraction * average_win - (1.0 - win_fraction) * average_loss;
        let kelly_criterion = safe_div(expected_value, average_win) * 100.0;

        let (max_consecutive_wins, max_consecutive_losses) = consecutive_streaks(&pnls);
        let risk_of_ruin = risk_of_ruin(losing_trades, closed_trades, max_consecutive_losses);

        let holding: Vec<f64> = closed
            .iter()
            .filter_map(|t| t.holding_period())
            .map(|d| d as f64)
            .collect();

        Metrics {
            total_trades: trades.len(),
            open_trades: trades.len() - closed_trades,
            closed_trades,
            winning_trades,
            losing_trades,
            breakeven_trades,
            total_pnl: pnls.iter().sum(),
            gross_profit,
            gross_loss,
            total_fees: closed.iter().map(|t| t.fees).sum(),
            average_win,
            average_loss,
            largest_win,
            largest_loss,
            win_rate,
            profit_factor,
            max_drawdown: drawdown.absolute,
            max_drawdown_pct: drawdown.pct,
            volatility: population_stddev(&pnls),
            sharpe_ratio: sharpe(&pnls),
            sortino_ratio: sortino(&pnls),
            calmar_ratio,
            kelly_criterion,
            expected_value,
            max_consecutive_wins,
            max_consecutive_losses,
            risk_of_ruin,
            average_holding_period: mean(&holding),
            unrealized_pnl: 0.0,
        }
    }

    /// Same as [`Metrics::compute`], plus unrealized P&L for open trades
    /// whose ticker has a quote in `prices`. Realized fields are unchanged.
    pub fn compute_with_prices(trades: &[Trade], prices: &HashMap<String, f64>) -> Self {
        let mut metrics = Self::compute(trades);
        metrics.unrealized_pnl = trades
            .iter()
            .filter(|t| t.is_open())
            .filter_map(|t| prices.get(&t.ticker).map(|&p| t.unrealized_pnl(p)))
            .sum();
        metrics
    }
}

/// Closed trades sorted by exit date, then entry date; stable otherwise.
pub(crate) fn closed_in_exit_order(trades: &[Trade]) -> Vec<&Trade> {
    let mut closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
    closed.sort_by_key(|t| (t.exit_date, t.entry_date));
    closed
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct Drawdown {
    pub absolute: f64,
    pub pct: f64,
}

/// Peak-to-trough walk over cumulative P&L starting from zero.
/// The percentage is taken against the running peak while it is positive.
pub(crate) fn compute_drawdown(pnls: &[f64]) -> Drawdown {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut result = Drawdown::default();

    for pnl in pnls {
        cumulative += pnl;
        if cumulative > peak {
            peak = cumulative;
        }
        let dd = peak - cumulative;
        if dd > result.absolute {
            result.absolute = dd;
            // percentage of the peak this same drawdown fell from
            result.pct = if peak > 0.0 { dd / peak * 100.0 } else { 0.0 };
        }
    }

    result
}

/// Longest winning and losing streaks; breakeven trades end both.
pub(crate) fn consecutive_streaks(pnls: &[f64]) -> (usize, usize) {
    let mut max_wins = 0usize;
    let mut max_losses = 0usize;
    let mut wins = 0usize;
    let mut losses = 0usize;

    for &pnl in pnls {
        if pnl > 0.0 {
            wins += 1;
            losses = 0;
        } else if pnl < 0.0 {
            losses += 1;
            wins = 0;
        } else {
            wins = 0;
            losses = 0;
        }
        max_wins = max_wins.max(wins);
        max_losses = max_losses.max(losses);
    }

    (max_wins, max_losses)
}

/// (losses / total) ^ longest losing streak. Simplified estimate.
pub(crate) fn risk_of_ruin(losses: usize, total: usize, max_consecutive_losses: usize) -> f64 {
    if losses == 0 || total == 0 {
        return 0.0;
    }
    let loss_rate = losses as f64 / total as f64;
    loss_rate.powi(i32::try_from(max_consecutive_losses).unwrap_or(i32::MAX))
}

/// Closed-trade summary for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerResult {
    pub ticker: String,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percentage, 0-100.
    pub win_rate: f64,
    pub total_pnl: f64,
    /// Mean per-trade return in percent.
    pub average_return: f64,
}

impl TickerResult {
    /// One row per ticker with at least one closed trade, sorted by ticker.
    pub fn compute_per_ticker(trades: &[Trade]) -> Vec<TickerResult> {
        let mut grouped: BTreeMap<&str, Vec<&Trade>> = BTreeMap::new();
        for trade in trades.iter().filter(|t| t.is_closed()) {
            grouped.entry(trade.ticker.as_str()).or_default().push(trade);
        }

        grouped
            .into_iter()
            .map(|(ticker, group)| {
                let pnls: Vec<f64> = group.iter().filter_map(|t| t.profit_loss()).collect();
                let returns: Vec<f64> = group
                    .iter()
                    .filter_map(|t| t.profit_loss_percentage())
                    .collect();
                let winning_trades = pnls.iter().filter(|&&p| p > 0.0).count();
                let losing_trades = pnls.iter().filter(|&&p| p < 0.0).count();
                TickerResult {
                    ticker: ticker.to_string(),
                    total_trades: pnls.len(),
                    winning_trades,
                    losing_trades,
                    win_rate: safe_div(winning_trades as f64, pnls.len() as f64) * 100.0,
                    total_pnl: pnls.iter().sum(),
                    average_return: mean(&returns),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    fn day(n: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::days(n)
    }

    fn closed(
        ticker: &str,
        entry: f64,
        exit: f64,
        qty: u32,
        fees: f64,
        short: bool,
        exit_day: i64,
    ) -> Trade {
        Trade::open(ticker, day(exit_day - 1), entry, qty, short)
            .closed_at(day(exit_day), exit)
            .with_fees(fees)
    }

    /// A closed trade with the given net P&L (qty 1, no fees).
    fn with_pnl(pnl: f64, exit_day: i64) -> Trade {
        closed("AAA", 100.0, 100.0 + pnl, 1, 0.0, false, exit_day)
    }

    #[test]
    fn empty_input_is_all_zero() {
        assert_eq!(Metrics::compute(&[]), Metrics::default());
    }

    #[test]
    fn all_open_trades_have_zero_realized_metrics() {
        let trades = vec![Trade::open("AAA", day(0), 10.0, 5, false)];
        let metrics = Metrics::compute(&trades);
        assert_eq!(metrics.total_trades, 1);
        assert_eq!(metrics.open_trades, 1);
        assert_eq!(metrics.closed_trades, 0);
        assert_eq!(metrics.total_pnl, 0.0);
        assert_eq!(metrics.win_rate, 0.0);
    }

    #[test]
    fn two_winners_profit_factor_zero() {
        let trades = vec![
            closed("AAPL", 150.0, 160.0, 10, 9.99, false, 1),
            closed("MSFT", 300.0, 320.0, 5, 9.99, false, 2),
        ];
        let metrics = Metrics::compute(&trades);
        assert_abs_diff_eq!(metrics.total_pnl, 180.02, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.win_rate, 100.0);
        assert_eq!(metrics.average_loss, 0.0);
        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.risk_of_ruin, 0.0);
    }

    #[test]
    fn one_winner_one_loser() {
        let trades = vec![
            closed("AAPL", 150.0, 160.0, 10, 9.99, false, 1),
            closed("MSFT", 300.0, 280.0, 5, 9.99, false, 2),
        ];
        let metrics = Metrics::compute(&trades);
        assert_abs_diff_eq!(metrics.total_pnl, -19.98, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.win_rate, 50.0);
        assert_abs_diff_eq!(metrics.profit_factor, 90.01 / 109.99, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.max_drawdown, 109.99, epsilon = 1e-9);
        // peak 90.01, trough -19.98
        assert_abs_diff_eq!(metrics.max_drawdown_pct, 109.99 / 90.01 * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn short_trade_wins_when_price_falls() {
        let trades = vec![closed("TSLA", 150.0, 140.0, 10, 9.99, true, 1)];
        let metrics = Metrics::compute(&trades);
        assert_abs_diff_eq!(metrics.total_pnl, 90.01, epsilon = 1e-9);
        assert_eq!(metrics.winning_trades, 1);
    }

    #[test]
    fn all_losers() {
        let trades = vec![with_pnl(-10.0, 1), with_pnl(-20.0, 2)];
        let metrics = Metrics::compute(&trades);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.average_win, 0.0);
        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.kelly_criterion, 0.0);
        assert_abs_diff_eq!(metrics.average_loss, 15.0);
        assert_abs_diff_eq!(metrics.expected_value, -15.0);
        assert_abs_diff_eq!(metrics.max_drawdown, 30.0);
        // peak never rises above zero
        assert_eq!(metrics.max_drawdown_pct, 0.0);
        assert_eq!(metrics.calmar_ratio, 0.0);
        assert_eq!(metrics.max_consecutive_losses, 2);
        assert_abs_diff_eq!(metrics.risk_of_ruin, 1.0);
    }

    #[test]
    fn average_win_and_loss() {
        let trades = vec![
            with_pnl(100.0, 1),
            with_pnl(-60.0, 2),
            with_pnl(200.0, 3),
            with_pnl(-40.0, 4),
        ];
        let metrics = Metrics::compute(&trades);
        assert_abs_diff_eq!(metrics.average_win, 150.0, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.average_loss, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.largest_win, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.largest_loss, 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.profit_factor, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn kelly_and_expected_value() {
        // w = 0.5, avg win 150, avg loss 50
        let trades = vec![
            with_pnl(100.0, 1),
            with_pnl(-60.0, 2),
            with_pnl(200.0, 3),
            with_pnl(-40.0, 4),
        ];
        let metrics = Metrics::compute(&trades);
        assert_abs_diff_eq!(metrics.expected_value, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.kelly_criterion, 50.0 / 150.0 * 100.0, epsilon = 1e-9);
    }

    #[test]
    fn drawdown_zero_for_rising_equity() {
        let dd = compute_drawdown(&[10.0, 5.0, 20.0]);
        assert_eq!(dd.absolute, 0.0);
        assert_eq!(dd.pct, 0.0);
    }

    #[test]
    fn drawdown_pct_belongs_to_largest_absolute_drawdown() {
        // cumulative: 10, 5, 1000, 800; the 50% dip from 10 is smaller in currency
        let dd = compute_drawdown(&[10.0, -5.0, 995.0, -200.0]);
        assert_abs_diff_eq!(dd.absolute, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dd.pct, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn drawdown_pct_can_exceed_hundred_below_zero_equity() {
        // cumulative: 5, 4, -20; peak 5
        let dd = compute_drawdown(&[5.0, -1.0, -24.0]);
        assert_abs_diff_eq!(dd.absolute, 25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dd.pct, 500.0, epsilon = 1e-9);
    }

    #[test]
    fn drawdown_peak_to_trough() {
        // cumulative: 100, 150, 90, 120, 60, 200
        let dd = compute_drawdown(&[100.0, 50.0, -60.0, 30.0, -60.0, 140.0]);
        assert_abs_diff_eq!(dd.absolute, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dd.pct, 60.0, epsilon = 1e-9);
    }

    #[test]
    fn drawdown_follows_exit_order_not_input_order() {
        let trades = vec![with_pnl(-50.0, 3), with_pnl(100.0, 1), with_pnl(-20.0, 2)];
        let metrics = Metrics::compute(&trades);
        // exit order: +100, -20, -50 -> trough 30 below peak 100
        assert_abs_diff_eq!(metrics.max_drawdown, 70.0, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.max_drawdown_pct, 70.0, epsilon = 1e-9);
    }

    #[test]
    fn streaks_reset_on_sign_change_and_breakeven() {
        let pnls = [1.0, 2.0, 3.0, -1.0, -1.0, 0.0, -1.0, 4.0];
        assert_eq!(consecutive_streaks(&pnls), (3, 2));
    }

    #[test]
    fn risk_of_ruin_uses_longest_losing_streak() {
        assert_abs_diff_eq!(risk_of_ruin(2, 4, 2), 0.25);
        assert_eq!(risk_of_ruin(0, 4, 0), 0.0);
        assert_eq!(risk_of_ruin(0, 0, 0), 0.0);
    }

    #[test]
    fn risk_of_ruin_with_very_long_streak_saturates() {
        assert_eq!(risk_of_ruin(1, 2, usize::MAX), 0.0);
        assert_eq!(risk_of_ruin(3, 3, usize::MAX), 1.0);
    }

    #[test]
    fn sharpe_and_sortino_on_pnl_series() {
        let trades = vec![with_pnl(10.0, 1), with_pnl(-5.0, 2), with_pnl(25.0, 3)];
        let metrics = Metrics::compute(&trades);
        let pnls = [10.0, -5.0, 25.0];
        assert_abs_diff_eq!(metrics.volatility, population_stddev(&pnls), epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.sharpe_ratio, sharpe(&pnls), epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.sortino_ratio, sortino(&pnls), epsilon = 1e-9);
        assert!(metrics.sharpe_ratio > 0.0);
    }

    #[test]
    fn calmar_uses_drawdown_percentage() {
        // cumulative 100, 50 -> dd 50%; avg pnl 25
        let trades = vec![with_pnl(100.0, 1), with_pnl(-50.0, 2)];
        let metrics = Metrics::compute(&trades);
        assert_abs_diff_eq!(metrics.calmar_ratio, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn breakeven_trade_counts_as_closed_only() {
        let trades = vec![with_pnl(0.0, 1), with_pnl(10.0, 2)];
        let metrics = Metrics::compute(&trades);
        assert_eq!(metrics.closed_trades, 2);
        assert_eq!(metrics.breakeven_trades, 1);
        assert_eq!(metrics.winning_trades + metrics.losing_trades, 1);
        assert_abs_diff_eq!(metrics.win_rate, 50.0);
    }

    #[test]
    fn average_holding_period_over_closed_trades() {
        let trades = vec![
            Trade::open("A", day(0), 10.0, 1, false).closed_at(day(4), 11.0),
            Trade::open("B", day(0), 10.0, 1, false).closed_at(day(10), 11.0),
            Trade::open("C", day(0), 10.0, 1, false),
        ];
        let metrics = Metrics::compute(&trades);
        assert_abs_diff_eq!(metrics.average_holding_period, 7.0);
    }

    #[test]
    fn unrealized_pnl_from_quotes() {
        let trades = vec![
            with_pnl(10.0, 1),
            Trade::open("MSFT", day(0), 400.0, 2, false),
            Trade::open("NVDA", day(0), 100.0, 1, true),
            Trade::open("NOQUOTE", day(0), 50.0, 1, false),
        ];
        let prices: HashMap<String, f64> =
            [("MSFT".to_string(), 410.0), ("NVDA".to_string(), 90.0)]
                .into_iter()
                .collect();

        let with_prices = Metrics::compute_with_prices(&trades, &prices);
        assert_abs_diff_eq!(with_prices.unrealized_pnl, 30.0, epsilon = 1e-9);

        let mut realized_only = with_prices.clone();
        realized_only.unrealized_pnl = 0.0;
        assert_eq!(realized_only, Metrics::compute(&trades));
    }

    #[test]
    fn per_ticker_breakdown() {
        let trades = vec![
            closed("MSFT", 100.0, 110.0, 1, 0.0, false, 1),
            closed("AAPL", 100.0, 90.0, 2, 0.0, false, 2),
            closed("MSFT", 100.0, 95.0, 1, 0.0, false, 3),
            Trade::open("AAPL", day(0), 100.0, 1, false),
        ];
        let results = TickerResult::compute_per_ticker(&trades);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].ticker, "AAPL");
        assert_eq!(results[0].total_trades, 1);
        assert_abs_diff_eq!(results[0].total_pnl, -20.0);
        assert_eq!(results[1].ticker, "MSFT");
        assert_eq!(results[1].winning_trades, 1);
        assert_eq!(results[1].losing_trades, 1);
        assert_abs_diff_eq!(results[1].win_rate, 50.0);
        assert_abs_diff_eq!(results[1].average_return, 2.5);
    }
}
