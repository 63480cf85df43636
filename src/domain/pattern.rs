//! Rule-based trading pattern detection.
//!
//! Closed trades are grouped by ticker and ordered by entry date; each group
//! is checked against four fixed-threshold rules (trend, mean reversion,
//! breakout, volume). Confidence is a heuristic score in [0, 1], not a
//! statistical measure. The thresholds are fixed and must not be tuned.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

use super::stats::{mean, safe_div};
use super::trade::Trade;

/// Fewer closed trades than this, overall or per ticker, yields nothing.
pub const MIN_TRADES: usize = 3;

const TREND_MIN_CONFIDENCE: f64 = 0.6;
const TREND_MIN_WIN_RATE: f64 = 0.5;

const OVERBOUGHT_FACTOR: f64 = 1.10;
const OVERSOLD_FACTOR: f64 = 0.90;
const REVERSION_MIN_BUCKET: usize = 2;
const REVERSION_CONFIDENCE_SCALE: f64 = 2.0;
const REVERSION_MIN_WIN_RATE: f64 = 0.6;
const REVERSION_MIN_CONFIDENCE: f64 = 0.5;

const BREAKOUT_THRESHOLD: f64 = 0.02;
const BREAKOUT_MIN_SIDE: usize = 2;
const BREAKOUT_CONFIDENCE_SCALE: f64 = 3.0;
const BREAKOUT_MIN_WIN_RATE: f64 = 0.5;
const BREAKOUT_MIN_CONFIDENCE: f64 = 0.4;

const VOLUME_MULTIPLE: f64 = 2.0;
const VOLUME_MIN_TRADES: usize = 2;
const VOLUME_CONFIDENCE_SCALE: f64 = 0.5;
const VOLUME_MIN_WIN_RATE: f64 = 0.5;
const VOLUME_MIN_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatternType {
    TrendFollowing,
    MeanReversion,
    Breakout,
    Volume,
}

impl PatternType {
    pub fn label(&self) -> &'static str {
        match self {
            PatternType::TrendFollowing => "trend_following",
            PatternType::MeanReversion => "mean_reversion",
            PatternType::Breakout => "breakout",
            PatternType::Volume => "volume",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketCondition {
    TrendingUp,
    TrendingDown,
    RangeBound,
    BreakingOut,
    BreakingDown,
    HighActivity,
}

impl fmt::Display for MarketCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketCondition::TrendingUp => "trending up",
            MarketCondition::TrendingDown => "trending down",
            MarketCondition::RangeBound => "range bound",
            MarketCondition::BreakingOut => "breaking out",
            MarketCondition::BreakingDown => "breaking down",
            MarketCondition::HighActivity => "high activity",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternPerformance {
    /// Fraction of matched trades with positive net P&L, 0-1.
    pub win_rate: f64,
    /// Mean percentage return of the matched trades.
    pub avg_return: f64,
    pub total_trades: usize,
}

impl PatternPerformance {
    fn of(trades: &[Trade]) -> Self {
        let returns: Vec<f64> = trades
            .iter()
            .filter_map(|t| t.profit_loss_percentage())
            .collect();
        PatternPerformance {
            win_rate: win_rate(trades),
            avg_return: mean(&returns),
            total_trades: trades.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternMetadata {
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    /// Raw score the confidence was derived from, before capping.
    pub pattern_strength: f64,
    pub market_conditions: MarketCondition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradingPattern {
    pub pattern_type: PatternType,
    pub name: String,
    pub ticker: String,
    pub description: String,
    pub confidence: f64,
    pub trades: Vec<Trade>,
    pub performance: PatternPerformance,
    pub metadata: PatternMetadata,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternSummary {
    pub total_patterns: usize,
    pub pattern_types: BTreeMap<PatternType, usize>,
    pub most_profitable: Option<TradingPattern>,
    pub average_confidence: f64,
}

impl PatternSummary {
    pub fn from_patterns(patterns: &[TradingPattern]) -> Self {
        let mut pattern_types = BTreeMap::new();
        for p in patterns {
            *pattern_types.entry(p.pattern_type).or_insert(0) += 1;
        }

        // first pattern wins ties
        let most_profitable = patterns
            .iter()
            .fold(None::<&TradingPattern>, |best, p| match best {
                Some(b) if b.performance.avg_return >= p.performance.avg_return => Some(b),
                _ => Some(p),
            })
            .cloned();

        let confidences: Vec<f64> = patterns.iter().map(|p| p.confidence).collect();

        PatternSummary {
            total_patterns: patterns.len(),
            pattern_types,
            most_profitable,
            average_confidence: mean(&confidences),
        }
    }

    /// The most frequent pattern type; earlier types win ties.
    pub fn dominant_type(&self) -> Option<PatternType> {
        self.pattern_types
            .iter()
            .fold(None::<(PatternType, usize)>, |best, (&t, &n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((t, n)),
            })
            .map(|(t, _)| t)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternReport {
    pub patterns: Vec<TradingPattern>,
    pub summary: PatternSummary,
}

/// Detect patterns across all tickers.
///
/// Returns an empty report when fewer than [`MIN_TRADES`] trades are closed.
pub fn detect_patterns(trades: &[Trade]) -> PatternReport {
    let closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
    if closed.len() < MIN_TRADES {
        return PatternReport::default();
    }

    let mut groups: BTreeMap<&str, Vec<Trade>> = BTreeMap::new();
    for trade in closed {
        groups
            .entry(trade.ticker.as_str())
            .or_default()
            .push(trade.clone());
    }

    let mut patterns = Vec::new();
    for (ticker, mut group) in groups {
        if group.len() < MIN_TRADES {
            continue;
        }
        group.sort_by_key(|t| t.entry_date);

        patterns.extend(detect_trend(ticker, &group));
        patterns.extend(detect_mean_reversion(ticker, &group));
        patterns.extend(detect_breakout(ticker, &group));
        patterns.extend(detect_volume(ticker, &group));
    }

    let summary = PatternSummary::from_patterns(&patterns);
    PatternReport { patterns, summary }
}

fn win_rate(trades: &[Trade]) -> f64 {
    let wins = trades
        .iter()
        .filter(|t| t.profit_loss().is_some_and(|p| p > 0.0))
        .count();
    safe_div(wins as f64, trades.len() as f64)
}

#[allow(clippy::too_many_arguments)]
fn build_pattern(
    pattern_type: PatternType,
    name: &str,
    ticker: &str,
    description: String,
    confidence: f64,
    strength: f64,
    market_conditions: MarketCondition,
    trades: Vec<Trade>,
) -> Option<TradingPattern> {
    let first = trades.first()?;
    let start_date = first.entry_date;
    let end_date = trades
        .iter()
        .map(|t| t.exit_date.unwrap_or(t.entry_date))
        .max()
        .unwrap_or(start_date);

    Some(TradingPattern {
        pattern_type,
        name: name.to_string(),
        ticker: ticker.to_string(),
        description,
        confidence,
        performance: PatternPerformance::of(&trades),
        trades,
        metadata: PatternMetadata {
            start_date,
            end_date,
            pattern_strength: strength,
            market_conditions,
        },
    })
}

/// Longest strictly rising and strictly falling runs, in trades.
fn monotonic_runs(prices: &[f64]) -> (usize, usize) {
    let mut longest_up = 1usize;
    let mut longest_down = 1usize;
    let mut up = 1usize;
    let mut down = 1usize;

    for pair in prices.windows(2) {
        if pair[1] > pair[0] {
            up += 1;
            down = 1;
        } else if pair[1] < pair[0] {
            down += 1;
            up = 1;
        } else {
            up = 1;
            down = 1;
        }
        longest_up = longest_up.max(up);
        longest_down = longest_down.max(down);
    }

    (longest_up, longest_down)
}

fn detect_trend(ticker: &str, group: &[Trade]) -> Option<TradingPattern> {
    let prices: Vec<f64> = group.iter().map(|t| t.entry_price).collect();
    let (up, down) = monotonic_runs(&prices);
    let (run, rising) = if up >= down { (up, true) } else { (down, false) };

    let strength = run as f64 / group.len() as f64;
    let confidence = strength.min(1.0);
    if confidence < TREND_MIN_CONFIDENCE || win_rate(group) < TREND_MIN_WIN_RATE {
        return None;
    }

    let (name, condition, word) = if rising {
        ("Uptrend Pattern", MarketCondition::TrendingUp, "rising")
    } else {
        ("Downtrend Pattern", MarketCondition::TrendingDown, "falling")
    };
    let description = format!(
        "{run} consecutive {ticker} entries at {word} prices out of {} trades",
        group.len()
    );

    build_pattern(
        PatternType::TrendFollowing,
        name,
        ticker,
        description,
        confidence,
        strength,
        condition,
        group.to_vec(),
    )
}

fn detect_mean_reversion(ticker: &str, group: &[Trade]) -> Vec<TradingPattern> {
    let average = mean(&group.iter().map(|t| t.entry_price).collect::<Vec<_>>());
    if average <= 0.0 {
        return Vec::new();
    }

    let overbought: Vec<Trade> = group
        .iter()
        .filter(|t| t.entry_price > average * OVERBOUGHT_FACTOR)
        .cloned()
        .collect();
    let oversold: Vec<Trade> = group
        .iter()
        .filter(|t| t.entry_price < average * OVERSOLD_FACTOR)
        .cloned()
        .collect();

    [
        ("Overbought Reversal", "above", overbought),
        ("Oversold Bounce", "below", oversold),
    ]
    .into_iter()
    .filter_map(|(name, side, bucket)| {
        if bucket.len() < REVERSION_MIN_BUCKET {
            return None;
        }
        let deviations: Vec<f64> = bucket
            .iter()
            .map(|t| (t.entry_price - average).abs() / average)
            .collect();
        let strength = mean(&deviations);
        let confidence = (strength * REVERSION_CONFIDENCE_SCALE).min(1.0);
        if win_rate(&bucket) < REVERSION_MIN_WIN_RATE || confidence < REVERSION_MIN_CONFIDENCE {
            return None;
        }
        let description = format!(
            "{} {ticker} entries {:.1}% {side} the average entry of {average:.2}",
            bucket.len(),
            strength * 100.0
        );
        build_pattern(
            PatternType::MeanReversion,
            name,
            ticker,
            description,
            confidence,
            strength,
            MarketCondition::RangeBound,
            bucket,
        )
    })
    .collect()
}

fn detect_breakout(ticker: &str, group: &[Trade]) -> Option<TradingPattern> {
    let mut resistance = group.first()?.entry_price;
    let mut support = resistance;
    let mut found: Option<(usize, f64, bool)> = None;

    for (i, trade) in group.iter().enumerate().skip(1) {
        let price = trade.entry_price;
        if price > resistance * (1.0 + BREAKOUT_THRESHOLD) {
            found = Some((i, resistance, true));
            break;
        }
        if price < support * (1.0 - BREAKOUT_THRESHOLD) {
            found = Some((i, support, false));
            break;
        }
        resistance = resistance.max(price);
        support = support.min(price);
    }

    let (index, level, bullish) = found?;
    let (pre, post) = group.split_at(index);
    if pre.len() < BREAKOUT_MIN_SIDE || post.len() < BREAKOUT_MIN_SIDE {
        return None;
    }

    let distances: Vec<f64> = post
        .iter()
        .map(|t| (t.entry_price - level).abs() / level)
        .collect();
    let strength = mean(&distances);
    let confidence = (strength * BREAKOUT_CONFIDENCE_SCALE).min(1.0);
    if win_rate(post) < BREAKOUT_MIN_WIN_RATE || confidence < BREAKOUT_MIN_CONFIDENCE {
        return None;
    }

    let (name, condition, kind) = if bullish {
        ("Bullish Breakout", MarketCondition::BreakingOut, "resistance")
    } else {
        ("Bearish Breakdown", MarketCondition::BreakingDown, "support")
    };
    let description = format!(
        "{ticker} broke {kind} at {level:.2} after {} trades; {} trades followed",
        pre.len(),
        post.len()
    );

    build_pattern(
        PatternType::Breakout,
        name,
        ticker,
        description,
        confidence,
        strength,
        condition,
        post.to_vec(),
    )
}

fn detect_volume(ticker: &str, group: &[Trade]) -> Option<TradingPattern> {
    let average = mean(&group.iter().map(|t| t.notional()).collect::<Vec<_>>());
    if average <= 0.0 {
        return None;
    }

    let heavy: Vec<Trade> = group
        .iter()
        .filter(|t| t.notional() > average * VOLUME_MULTIPLE)
        .cloned()
        .collect();
    if heavy.len() < VOLUME_MIN_TRADES {
        return None;
    }

    let ratios: Vec<f64> = heavy.iter().map(|t| t.notional() / average).collect();
    let strength = mean(&ratios);
    let confidence = ((strength - 1.0) * VOLUME_CONFIDENCE_SCALE).min(1.0);
    if win_rate(&heavy) < VOLUME_MIN_WIN_RATE || confidence < VOLUME_MIN_CONFIDENCE {
        return None;
    }

    let description = format!(
        "{} {ticker} trades sized {strength:.1}x the average position of {average:.2}",
        heavy.len()
    );

    build_pattern(
        PatternType::Volume,
        "High Volume Conviction",
        ticker,
        description,
        confidence,
        strength,
        MarketCondition::HighActivity,
        heavy,
    )
}
