//! Risk-page statistics.
//!
//! Shares the drawdown walk with [`super::metrics`] but measures dispersion
//! on per-trade percentage returns instead of currency P&L, and adds
//! exposure figures for open positions.

use super::metrics::{closed_in_exit_order, compute_drawdown, consecutive_streaks, risk_of_ruin};
use super::stats::{percentile, population_stddev, safe_div, sharpe, sortino};
use super::trade::Trade;

const VAR_PERCENTILE: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RiskMetrics {
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    /// Population stddev of per-trade percentage returns.
    pub return_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Historical 95% VaR of a single trade, as a positive percentage loss.
    pub value_at_risk_95: f64,
    pub risk_of_ruin: f64,
    /// Sum of entry notional over open trades.
    pub open_exposure: f64,
    /// Largest single open notional as a percentage of `open_exposure`.
    pub largest_position_pct: f64,
}

impl RiskMetrics {
    pub fn compute(trades: &[Trade]) -> Self {
        let closed = closed_in_exit_order(trades);
        let pnls: Vec<f64> = closed.iter().filter_map(|t| t.profit_loss()).collect();
        let returns: Vec<f64> = closed
            .iter()
            .filter_map(|t| t.profit_loss_percentage())
            .collect();

        let drawdown = compute_drawdown(&pnls);
        let losses = pnls.iter().filter(|&&p| p < 0.0).count();
        let (_, max_consecutive_losses) = consecutive_streaks(&pnls);

        let value_at_risk_95 = (-percentile(&returns, VAR_PERCENTILE)).max(0.0);

        let open_notional: Vec<f64> = trades
            .iter()
            .filter(|t| t.is_open())
            .map(|t| t.notional())
            .collect();
        let open_exposure: f64 = open_notional.iter().sum();
        let largest = open_notional.iter().copied().fold(0.0_f64, f64::max);

        RiskMetrics {
            max_drawdown: drawdown.absolute,
            max_drawdown_pct: drawdown.pct,
            return_volatility: population_stddev(&returns),
            sharpe_ratio: sharpe(&returns),
            sortino_ratio: sortino(&returns),
            value_at_risk_95,
            risk_of_ruin: risk_of_ruin(losses, pnls.len(), max_consecutive_losses),
            open_exposure,
            largest_position_pct: safe_div(largest, open_exposure) * 100.0,
        }
    }
}
