//! One-shot analysis of a trade snapshot.
//!
//! Bundles every computation the journal offers so callers build the full
//! picture with a single call. Holds no state between calls.

use tracing::debug;

use super::benchmark::{BenchmarkComparison, compare_to_benchmark};
use super::metrics::{Metrics, TickerResult};
use super::pattern::{PatternReport, detect_patterns};
use super::price::{PricePoint, QuoteMap};
use super::recommendation::recommendations;
use super::risk::RiskMetrics;
use super::trade::Trade;

/// Optional market data from the price collaborator.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInputs<'a> {
    pub quotes: Option<&'a QuoteMap>,
    pub benchmark: Option<(&'a str, &'a [PricePoint])>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JournalAnalysis {
    pub metrics: Metrics,
    pub risk: RiskMetrics,
    pub per_ticker: Vec<TickerResult>,
    pub patterns: PatternReport,
    pub recommendations: Vec<String>,
    pub benchmark: Option<BenchmarkComparison>,
}

impl JournalAnalysis {
    pub fn run(trades: &[Trade], inputs: &AnalysisInputs<'_>) -> Self {
        let metrics = match inputs.quotes {
            Some(quotes) => Metrics::compute_with_prices(trades, quotes),
            None => Metrics::compute(trades),
        };
        let risk = RiskMetrics::compute(trades);
        let per_ticker = TickerResult::compute_per_ticker(trades);
        let patterns = detect_patterns(trades);
        let recommendations = recommendations(&patterns);
        let benchmark = inputs
            .benchmark
            .and_then(|(symbol, series)| compare_to_benchmark(trades, series, symbol));

        debug!(
            trades = trades.len(),
            closed = metrics.closed_trades,
            patterns = patterns.summary.total_patterns,
            benchmark = benchmark.is_some(),
            "analysis complete"
        );

        JournalAnalysis {
            metrics,
            risk,
            per_ticker,
            patterns,
            recommendations,
            benchmark,
        }
    }
}
