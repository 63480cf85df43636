//! Markdown report generation.
//!
//! Each `render_*` function produces one self-contained section so the CLI
//! can print individual sections to stdout and the adapter can stitch the
//! full report together.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::domain::analysis::JournalAnalysis;
use crate::domain::benchmark::BenchmarkComparison;
use crate::domain::error::JournalError;
use crate::domain::metrics::{Metrics, TickerResult};
use crate::domain::pattern::PatternReport;
use crate::domain::risk::RiskMetrics;
use crate::ports::report_port::ReportPort;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub struct MarkdownReportAdapter {
    /// Rows of the per-ticker table, best P&L first; 0 keeps every ticker.
    top_tickers: usize,
    include_monthly: bool,
}

impl Default for MarkdownReportAdapter {
    fn default() -> Self {
        Self {
            top_tickers: 0,
            include_monthly: true,
        }
    }
}

impl MarkdownReportAdapter {
    pub fn new(top_tickers: usize, include_monthly: bool) -> Self {
        Self {
            top_tickers,
            include_monthly,
        }
    }

    pub fn render(&self, analysis: &JournalAnalysis, title: &str) -> String {
        let mut out = format!("# {}\n\n", title);

        out.push_str("## Performance\n\n");
        out.push_str(&render_metrics_table(&analysis.metrics));

        out.push_str("## Risk\n\n");
        out.push_str(&render_risk_table(&analysis.risk));

        out.push_str("## By Ticker\n\n");
        out.push_str(&render_ticker_table(&analysis.per_ticker, self.top_tickers));

        out.push_str("## Patterns\n\n");
        out.push_str(&render_patterns(&analysis.patterns));

        out.push_str("## Recommendations\n\n");
        out.push_str(&render_recommendations(&analysis.recommendations));

        if let Some(cmp) = &analysis.benchmark {
            out.push_str("## Benchmark\n\n");
            out.push_str(&render_benchmark(cmp, self.include_monthly));
        }

        out
    }
}

impl ReportPort for MarkdownReportAdapter {
    fn write(
        &self,
        analysis: &JournalAnalysis,
        title: &str,
        output_path: &str,
    ) -> Result<(), JournalError> {
        let markdown = self.render(analysis, title);

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, markdown)?;

        info!(path = output_path, "report written");
        Ok(())
    }
}

fn table_header(columns: &[&str]) -> String {
    let mut out = format!("| {} |\n", columns.join(" | "));
    out.push('|');
    for _ in columns {
        out.push_str(" --- |");
    }
    out.push('\n');
    out
}

fn format_ratio(value: f64) -> String {
    format!("{:.2}", value)
}

fn format_pct(value: f64) -> String {
    format!("{:+.2}%", value)
}

pub fn render_metrics_table(m: &Metrics) -> String {
    let rows: Vec<(&str, String)> = vec![
        (
            "Trades",
            format!(
                "{} ({} closed, {} open)",
                m.total_trades, m.closed_trades, m.open_trades
            ),
        ),
        (
            "Wins / Losses / Breakeven",
            format!(
                "{} / {} / {}",
                m.winning_trades, m.losing_trades, m.breakeven_trades
            ),
        ),
        ("Win Rate", format!("{:.1}%", m.win_rate)),
        ("Total P&L", format!("{:.2}", m.total_pnl)),
        ("Unrealized P&L", format!("{:.2}", m.unrealized_pnl)),
        ("Gross Profit", format!("{:.2}", m.gross_profit)),
        ("Gross Loss", format!("{:.2}", m.gross_loss)),
        ("Fees", format!("{:.2}", m.total_fees)),
        ("Average Win", format!("{:.2}", m.average_win)),
        ("Average Loss", format!("{:.2}", m.average_loss)),
        ("Largest Win", format!("{:.2}", m.largest_win)),
        ("Largest Loss", format!("{:.2}", m.largest_loss)),
        ("Profit Factor", format_ratio(m.profit_factor)),
        ("Expected Value", format!("{:.2}", m.expected_value)),
        (
            "Max Drawdown",
            format!("{:.2} ({:.1}%)", m.max_drawdown, m.max_drawdown_pct),
        ),
        ("Volatility", format!("{:.2}", m.volatility)),
        ("Sharpe Ratio", format_ratio(m.sharpe_ratio)),
        ("Sortino Ratio", format_ratio(m.sortino_ratio)),
        ("Calmar Ratio", format_ratio(m.calmar_ratio)),
        ("Kelly Criterion", format!("{:.1}%", m.kelly_criterion)),
        (
            "Max Consecutive Wins / Losses",
            format!("{} / {}", m.max_consecutive_wins, m.max_consecutive_losses),
        ),
        ("Risk of Ruin", format!("{:.4}", m.risk_of_ruin)),
        (
            "Average Holding Period",
            format!("{:.1} days", m.average_holding_period),
        ),
    ];

    let mut out = table_header(&["Metric", "Value"]);
    for (name, value) in rows {
        out.push_str(&format!("| {} | {} |\n", name, value));
    }
    out.push('\n');
    out
}

pub fn render_risk_table(r: &RiskMetrics) -> String {
    let mut out = table_header(&["Measure", "Value"]);
    out.push_str(&format!(
        "| Max Drawdown | {:.2} ({:.1}%) |\n",
        r.max_drawdown, r.max_drawdown_pct
    ));
    out.push_str(&format!(
        "| Return Volatility | {:.2}% |\n",
        r.return_volatility
    ));
    out.push_str(&format!("| Sharpe Ratio | {} |\n", format_ratio(r.sharpe_ratio)));
    out.push_str(&format!(
        "| Sortino Ratio | {} |\n",
        format_ratio(r.sortino_ratio)
    ));
    out.push_str(&format!("| VaR (95%) | {:.2}% |\n", r.value_at_risk_95));
    out.push_str(&format!("| Risk of Ruin | {:.4} |\n", r.risk_of_ruin));
    out.push_str(&format!("| Open Exposure | {:.2} |\n", r.open_exposure));
    out.push_str(&format!(
        "| Largest Position | {:.1}% |\n",
        r.largest_position_pct
    ));
    out.push('\n');
    out
}

pub fn render_ticker_table(results: &[TickerResult], limit: usize) -> String {
    if results.is_empty() {
        return "_No closed trades._\n\n".to_string();
    }

    let mut sorted: Vec<&TickerResult> = results.iter().collect();
    sorted.sort_by(|a, b| b.total_pnl.total_cmp(&a.total_pnl));
    if limit > 0 {
        sorted.truncate(limit);
    }

    let mut out = table_header(&["Ticker", "Trades", "W/L", "Win Rate", "Total P&L", "Avg Return"]);
    for r in sorted {
        out.push_str(&format!(
            "| {} | {} | {}/{} | {:.1}% | {:.2} | {} |\n",
            r.ticker,
            r.total_trades,
            r.winning_trades,
            r.losing_trades,
            r.win_rate,
            r.total_pnl,
            format_pct(r.average_return)
        ));
    }
    out.push('\n');
    out
}

pub fn render_patterns(report: &PatternReport) -> String {
    if report.patterns.is_empty() {
        return "_No patterns detected._\n\n".to_string();
    }

    let summary = &report.summary;
    let mut out = format!(
        "{} patterns detected, average confidence {:.0}%.\n\n",
        summary.total_patterns,
        summary.average_confidence * 100.0
    );
    if let Some(best) = &summary.most_profitable {
        out.push_str(&format!(
            "Most profitable: **{}** on {} ({} average return).\n\n",
            best.name,
            best.ticker,
            format_pct(best.performance.avg_return)
        ));
    }

    out.push_str(&table_header(&[
        "Ticker",
        "Pattern",
        "Type",
        "Confidence",
        "Trades",
        "Win Rate",
        "Avg Return",
        "Period",
        "Conditions",
    ]));
    for p in &report.patterns {
        out.push_str(&format!(
            "| {} | {} | {} | {:.0}% | {} | {:.0}% | {} | {} to {} | {} |\n",
            p.ticker,
            p.name,
            p.pattern_type.label(),
            p.confidence * 100.0,
            p.performance.total_trades,
            p.performance.win_rate * 100.0,
            format_pct(p.performance.avg_return),
            p.metadata.start_date.format("%Y-%m-%d"),
            p.metadata.end_date.format("%Y-%m-%d"),
            p.metadata.market_conditions
        ));
    }
    out.push('\n');
    out
}

pub fn render_recommendations(recommendations: &[String]) -> String {
    let mut out = String::new();
    for rec in recommendations {
        out.push_str(&format!("- {}\n", rec));
    }
    out.push('\n');
    out
}

pub fn render_benchmark(cmp: &BenchmarkComparison, include_monthly: bool) -> String {
    let mut out = format!(
        "Compared with {} from {} to {}.\n\n",
        cmp.benchmark_symbol, cmp.start_date, cmp.end_date
    );
    out.push_str(&table_header(&["Measure", "Value"]));
    out.push_str(&format!(
        "| Portfolio Return | {} |\n",
        format_pct(cmp.portfolio_return_pct)
    ));
    out.push_str(&format!(
        "| {} Return | {} |\n",
        cmp.benchmark_symbol,
        format_pct(cmp.benchmark_return_pct)
    ));
    out.push_str(&format!(
        "| Excess Return | {} |\n",
        format_pct(cmp.excess_return_pct)
    ));
    out.push_str(&format!("| Beta | {} |\n", format_ratio(cmp.beta)));
    out.push_str(&format!(
        "| Correlation | {} |\n",
        format_ratio(cmp.correlation)
    ));
    out.push_str(&format!(
        "| Alpha (monthly) | {} |\n",
        format_pct(cmp.alpha_pct)
    ));
    out.push('\n');

    if include_monthly && !cmp.monthly.is_empty() {
        out.push_str(&table_header(&["Month", "Portfolio", cmp.benchmark_symbol.as_str()]));
        for m in &cmp.monthly {
            let month = MONTHS.get((m.month as usize).wrapping_sub(1)).unwrap_or(&"?");
            out.push_str(&format!(
                "| {} {} | {} | {} |\n",
                month,
                m.year,
                format_pct(m.portfolio_pct),
                format_pct(m.benchmark_pct)
            ));
        }
        out.push('\n');
    }
    out
}
