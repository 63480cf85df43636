//! Market data supplied by the price collaborator.

use chrono::NaiveDate;
use std::collections::HashMap;

/// One daily close of an instrument or index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Latest quote per ticker, used to mark open trades.
pub type QuoteMap = HashMap<String, f64>;

/// Points within `[start, end]`, sorted by date.
pub fn window(series: &[PricePoint], start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = series
        .iter()
        .filter(|p| p.date >= start && p.date <= end)
        .copied()
        .collect();
    points.sort_by_key(|p| p.date);
    points
}
