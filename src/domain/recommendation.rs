//! Human-readable advice derived from a pattern report.
//!
//! Pure presentation: reads the summary and the pattern list, never the
//! trades themselves.

use super::pattern::{PatternReport, PatternType};

const LOW_CONFIDENCE: f64 = 0.5;
const STRONG_WIN_RATE: f64 = 0.7;

pub fn recommendations(report: &PatternReport) -> Vec<String> {
    let summary = &report.summary;
    if summary.total_patterns == 0 {
        return vec![
            "No recurring patterns detected yet. Keep journaling; at least three closed trades per ticker are needed."
                .to_string(),
        ];
    }

    let mut out = Vec::new();

    if let Some(best) = &summary.most_profitable {
        out.push(format!(
            "Focus on {} ({}): your most profitable pattern with {:.1}% average return.",
            best.name, best.ticker, best.performance.avg_return
        ));
    }

    if let Some(dominant) = summary.dominant_type() {
        out.push(type_advice(dominant).to_string());
    }

    if summary.average_confidence < LOW_CONFIDENCE {
        out.push(format!(
            "Average pattern confidence is {:.0}%. Treat these signals as tentative until more trades confirm them.",
            summary.average_confidence * 100.0
        ));
    }

    for pattern in report
        .patterns
        .iter()
        .filter(|p| p.performance.win_rate >= STRONG_WIN_RATE)
    {
        out.push(format!(
            "{} on {} wins {:.0}% of the time; consider sizing up when it recurs.",
            pattern.name,
            pattern.ticker,
            pattern.performance.win_rate * 100.0
        ));
    }

    out
}

fn type_advice(pattern_type: PatternType) -> &'static str {
    match pattern_type {
        PatternType::TrendFollowing => {
            "Most of your edge comes from trading with the trend. Avoid fighting established moves."
        }
        PatternType::MeanReversion => {
            "You do well fading stretched prices. Define exits near the average entry to lock in reversions."
        }
        PatternType::Breakout => {
            "Breakouts are your strongest setup. Wait for a clear break of the prior range before entering."
        }
        PatternType::Volume => {
            "Your larger positions perform well. Keep conviction sizing disciplined with predefined stops."
        }
    }
}
