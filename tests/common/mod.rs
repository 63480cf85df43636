#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::cell::Cell;
use std::collections::HashMap;
use tradejournal::domain::error::JournalError;
use tradejournal::domain::price::{PricePoint, QuoteMap};
pub use tradejournal::domain::trade::Trade;
use tradejournal::ports::price_port::PricePort;
use tradejournal::ports::trade_port::TradePort;

pub struct MockTradePort {
    pub trades: Vec<Trade>,
    pub error: Option<String>,
    pub loads: Cell<usize>,
}

impl MockTradePort {
    pub fn new() -> Self {
        Self {
            trades: Vec::new(),
            error: None,
            loads: Cell::new(0),
        }
    }

    pub fn with_trades(mut self, trades: Vec<Trade>) -> Self {
        self.trades = trades;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl TradePort for MockTradePort {
    fn load_trades(&self) -> Result<Vec<Trade>, JournalError> {
        self.loads.set(self.loads.get() + 1);
        if let Some(reason) = &self.error {
            return Err(JournalError::Csv {
                path: "mock".to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.trades.clone())
    }
}

pub struct MockPricePort {
    pub quotes: QuoteMap,
    pub series: HashMap<String, Vec<PricePoint>>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            quotes: QuoteMap::new(),
            series: HashMap::new(),
        }
    }

    pub fn with_quote(mut self, ticker: &str, price: f64) -> Self {
        self.quotes.insert(ticker.to_string(), price);
        self
    }

    pub fn with_series(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.series.insert(symbol.to_string(), points);
        self
    }
}

impl PricePort for MockPricePort {
    fn current_prices(&self) -> Result<QuoteMap, JournalError> {
        Ok(self.quotes.clone())
    }

    fn price_history(&self, symbol: &str) -> Result<Vec<PricePoint>, JournalError> {
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| JournalError::NoPriceData {
                symbol: symbol.to_string(),
            })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn point(s: &str, close: f64) -> PricePoint {
    PricePoint {
        date: NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap(),
        close,
    }
}

#[allow(clippy::too_many_arguments)]
pub fn closed_trade(
    ticker: &str,
    entry: &str,
    exit: &str,
    entry_price: f64,
    exit_price: f64,
    quantity: u32,
    fees: f64,
    is_short: bool,
) -> Trade {
    Trade::open(ticker, at(entry), entry_price, quantity, is_short)
        .closed_at(at(exit), exit_price)
        .with_fees(fees)
}

pub fn open_trade(ticker: &str, entry: &str, entry_price: f64, quantity: u32) -> Trade {
    Trade::open(ticker, at(entry), entry_price, quantity, false)
}

/// A journal with three AAPL trades entered at falling prices, a losing
/// TSLA short and one open MSFT position.
pub fn sample_journal() -> Vec<Trade> {
    vec![
        closed_trade("AAPL", "2024-01-02", "2024-01-09", 150.0, 160.0, 10, 9.99, false),
        closed_trade("AAPL", "2024-01-15", "2024-01-22", 140.0, 150.0, 10, 9.99, false),
        closed_trade("AAPL", "2024-02-01", "2024-02-08", 130.0, 125.0, 10, 9.99, false),
        closed_trade("TSLA", "2024-01-10", "2024-01-12", 200.0, 210.0, 5, 4.99, true),
        open_trade("MSFT", "2024-02-10", 400.0, 3),
    ]
}
