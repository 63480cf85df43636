//! Portfolio performance against a benchmark index (S&P 500 by default).

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use super::price::{PricePoint, window};
use super::stats::{covariance, mean, population_stddev, safe_div};
use super::trade::Trade;

pub const DEFAULT_BENCHMARK: &str = "SPY";

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyComparison {
    pub year: i32,
    pub month: u32,
    pub portfolio_pct: f64,
    pub benchmark_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkComparison {
    pub benchmark_symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub portfolio_return_pct: f64,
    pub benchmark_return_pct: f64,
    pub excess_return_pct: f64,
    pub beta: f64,
    pub correlation: f64,
    /// Mean monthly portfolio return not explained by beta, in percent.
    pub alpha_pct: f64,
    pub monthly: Vec<MonthlyComparison>,
}

/// Compare closed-trade returns with `series` over the span from the first
/// entry to the last exit. `None` without closed trades or with fewer than
/// two benchmark closes inside that span.
pub fn compare_to_benchmark(
    trades: &[Trade],
    series: &[PricePoint],
    symbol: &str,
) -> Option<BenchmarkComparison> {
    let closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
    let start_date = closed.iter().map(|t| t.entry_date.date()).min()?;
    let end_date = closed.iter().filter_map(|t| t.exit_date).max()?.date();

    let points = window(series, start_date, end_date);
    let (first, last) = match (points.first(), points.last()) {
        (Some(f), Some(l)) if points.len() >= 2 => (*f, *l),
        _ => return None,
    };

    let total_pnl: f64 = closed.iter().filter_map(|t| t.profit_loss()).sum();
    let total_notional: f64 = closed.iter().map(|t| t.notional()).sum();
    let portfolio_return_pct = safe_div(total_pnl, total_notional) * 100.0;
    let benchmark_return_pct = period_return_pct(first.close, last.close);

    let monthly = monthly_comparison(&closed, &points);
    let portfolio: Vec<f64> = monthly.iter().map(|m| m.portfolio_pct).collect();
    let benchmark: Vec<f64> = monthly.iter().map(|m| m.benchmark_pct).collect();

    let (beta, correlation, alpha_pct) = if monthly.len() >= 2 {
        let cov = covariance(&portfolio, &benchmark);
        let bench_sd = population_stddev(&benchmark);
        let beta = safe_div(cov, bench_sd * bench_sd);
        let correlation = safe_div(cov, population_stddev(&portfolio) * bench_sd);
        let alpha = mean(&portfolio) - beta * mean(&benchmark);
        (beta, correlation, alpha)
    } else {
        (0.0, 0.0, 0.0)
    };

    Some(BenchmarkComparison {
        benchmark_symbol: symbol.to_string(),
        start_date,
        end_date,
        portfolio_return_pct,
        benchmark_return_pct,
        excess_return_pct: portfolio_return_pct - benchmark_return_pct,
        beta,
        correlation,
        alpha_pct,
        monthly,
    })
}

fn period_return_pct(from: f64, to: f64) -> f64 {
    if from > 0.0 {
        (to / from - 1.0) * 100.0
    } else {
        0.0
    }
}

/// One row per calendar month that has benchmark data. The benchmark leg
/// runs month-end to month-end; the first month starts at the first close.
fn monthly_comparison(closed: &[&Trade], points: &[PricePoint]) -> Vec<MonthlyComparison> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut month_end: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for p in points {
        month_end.insert((p.date.year(), p.date.month()), p.close);
    }

    let mut trade_months: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for trade in closed {
        if let (Some(exit), Some(pnl)) = (trade.exit_date, trade.profit_loss()) {
            let entry = trade_months.entry((exit.year(), exit.month())).or_default();
            entry.0 += pnl;
            entry.1 += trade.notional();
        }
    }

    let mut prev_close = first.close;
    month_end
        .into_iter()
        .map(|((year, month), close)| {
            let benchmark_pct = period_return_pct(prev_close, close);
            prev_close = close;
            let portfolio_pct = trade_months
                .get(&(year, month))
                .map(|&(pnl, notional)| safe_div(pnl, notional) * 100.0)
                .unwrap_or(0.0);
            MonthlyComparison {
                year,
                month,
                portfolio_pct,
                benchmark_pct,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDateTime;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn point(date: &str, close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            close,
        }
    }

    fn spx() -> Vec<PricePoint> {
        vec![
            point("2024-01-02", 100.0),
            point("2024-01-31", 102.0),
            point("2024-02-29", 107.1),
            point("2024-03-28", 104.958),
        ]
    }

    #[test]
    fn none_without_closed_trades() {
        let trades = vec![Trade::open("AAPL", at("2024-01-02"), 100.0, 1, false)];
        assert!(compare_to_benchmark(&trades, &spx(), "SPY").is_none());
        assert!(compare_to_benchmark(&[], &spx(), "SPY").is_none());
    }

    #[test]
    fn none_without_benchmark_data_in_window() {
        let trades = vec![
            Trade::open("AAPL", at("2023-01-02"), 100.0, 1, false).closed_at(at("2023-02-02"), 110.0),
        ];
        assert!(compare_to_benchmark(&trades, &spx(), "SPY").is_none());
    }

    #[test]
    fn total_returns_and_excess() {
        // invested 1000 + 1000, pnl +100 and -50 -> 2.5%
        let trades = vec![
            Trade::open("AAPL", at("2024-01-02"), 100.0, 10, false).closed_at(at("2024-01-31"), 110.0),
            Trade::open("MSFT", at("2024-02-01"), 200.0, 5, false).closed_at(at("2024-03-28"), 190.0),
        ];
        let cmp = compare_to_benchmark(&trades, &spx(), "SPY").unwrap();
        assert_eq!(cmp.benchmark_symbol, "SPY");
        assert_abs_diff_eq!(cmp.portfolio_return_pct, 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(cmp.benchmark_return_pct, 4.958, epsilon = 1e-9);
        assert_abs_diff_eq!(cmp.excess_return_pct, 2.5 - 4.958, epsilon = 1e-9);
        assert_eq!(cmp.start_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(cmp.end_date, NaiveDate::from_ymd_opt(2024, 3, 28).unwrap());
    }

    #[test]
    fn monthly_rows_chain_month_end_closes() {
        let trades = vec![
            Trade::open("AAPL", at("2024-01-02"), 100.0, 10, false).closed_at(at("2024-01-31"), 110.0),
            Trade::open("MSFT", at("2024-02-01"), 200.0, 5, false).closed_at(at("2024-03-28"), 190.0),
        ];
        let cmp = compare_to_benchmark(&trades, &spx(), "SPY").unwrap();
        assert_eq!(cmp.monthly.len(), 3);
        assert_abs_diff_eq!(cmp.monthly[0].benchmark_pct, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cmp.monthly[1].benchmark_pct, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cmp.monthly[2].benchmark_pct, -2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cmp.monthly[0].portfolio_pct, 10.0, epsilon = 1e-9);
        assert_eq!(cmp.monthly[1].portfolio_pct, 0.0);
        assert_abs_diff_eq!(cmp.monthly[2].portfolio_pct, -5.0, epsilon = 1e-9);
        assert!(cmp.beta.is_finite());
        assert!(cmp.correlation >= -1.0 - 1e-9 && cmp.correlation <= 1.0 + 1e-9);
    }

    #[test]
    fn beta_of_portfolio_tracking_twice_the_index() {
        let series = vec![
            point("2024-01-01", 100.0),
            point("2024-01-31", 101.0),
            point("2024-02-29", 99.99),
        ];
        // January +1% index, +2% portfolio; February -1% index, -2% portfolio
        let trades = vec![
            Trade::open("A", at("2024-01-01"), 100.0, 1, false).closed_at(at("2024-01-31"), 102.0),
            Trade::open("B", at("2024-02-01"), 100.0, 1, false).closed_at(at("2024-02-29"), 98.0),
        ];
        let cmp = compare_to_benchmark(&trades, &series, "SPY").unwrap();
        assert_abs_diff_eq!(cmp.beta, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cmp.correlation, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cmp.alpha_pct, 0.0, epsilon = 1e-6);
    }
}
