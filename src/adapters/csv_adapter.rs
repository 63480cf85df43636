//! CSV file adapters for trades, quotes and price history.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::error::JournalError;
use crate::domain::price::{PricePoint, QuoteMap};
use crate::domain::trade::Trade;
use crate::ports::price_port::PricePort;
use crate::ports::trade_port::TradePort;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Deserialize)]
struct TradeRow {
    ticker: String,
    entry_date: String,
    exit_date: Option<String>,
    entry_price: f64,
    exit_price: Option<f64>,
    quantity: u32,
    #[serde(default)]
    fees: Option<f64>,
    #[serde(default)]
    is_short: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteRow {
    ticker: String,
    price: f64,
}

fn csv_error(path: &Path, reason: impl std::fmt::Display) -> JournalError {
    JournalError::Csv {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn read_file(path: &Path) -> Result<String, JournalError> {
    fs::read_to_string(path).map_err(|e| csv_error(path, format!("failed to read: {}", e)))
}

/// Accepts a bare date (midnight) or a date with time of day.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_direction(value: Option<&str>) -> Option<bool> {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("") => Some(false),
        Some("true" | "yes" | "1" | "short") => Some(true),
        Some("false" | "no" | "0" | "long") => Some(false),
        _ => None,
    }
}

/// Trades stored as one CSV file with a header row.
pub struct CsvTradeAdapter {
    path: PathBuf,
}

impl CsvTradeAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn parse(&self, content: &str) -> Result<Vec<Trade>, JournalError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut trades = Vec::new();

        for (i, result) in rdr.deserialize::<TradeRow>().enumerate() {
            let row_number = i + 1;
            let row = result.map_err(|e| csv_error(&self.path, e))?;

            let entry_date = parse_timestamp(&row.entry_date).ok_or_else(|| {
                csv_error(
                    &self.path,
                    format!("row {}: invalid entry_date '{}'", row_number, row.entry_date),
                )
            })?;
            let exit_date = match row.exit_date.as_deref() {
                Some(s) => Some(parse_timestamp(s).ok_or_else(|| {
                    csv_error(
                        &self.path,
                        format!("row {}: invalid exit_date '{}'", row_number, s),
                    )
                })?),
                None => None,
            };
            let is_short = parse_direction(row.is_short.as_deref()).ok_or_else(|| {
                csv_error(
                    &self.path,
                    format!("row {}: invalid is_short value", row_number),
                )
            })?;

            let trade = Trade {
                ticker: row.ticker.to_uppercase(),
                entry_date,
                exit_date,
                entry_price: row.entry_price,
                exit_price: row.exit_price,
                quantity: row.quantity,
                fees: row.fees.unwrap_or(0.0),
                is_short,
                notes: row.notes.unwrap_or_default(),
            };

            if let Err(source) = trade.validate() {
                warn!(row = row_number, error = %source, "rejecting trade");
                return Err(JournalError::InvalidTrade {
                    row: row_number,
                    source,
                });
            }
            trades.push(trade);
        }

        Ok(trades)
    }
}

impl TradePort for CsvTradeAdapter {
    fn load_trades(&self) -> Result<Vec<Trade>, JournalError> {
        let content = read_file(&self.path)?;
        let trades = self.parse(&content)?;
        info!(
            path = %self.path.display(),
            count = trades.len(),
            open = trades.iter().filter(|t| t.is_open()).count(),
            "loaded trades"
        );
        Ok(trades)
    }
}

/// Quotes from a `ticker,price` file and daily closes from one file per symbol.
#[derive(Default)]
pub struct CsvPriceAdapter {
    quotes_path: Option<PathBuf>,
    history: HashMap<String, PathBuf>,
}

impl CsvPriceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quotes(mut self, path: PathBuf) -> Self {
        self.quotes_path = Some(path);
        self
    }

    pub fn with_history(mut self, symbol: &str, path: PathBuf) -> Self {
        self.history.insert(symbol.to_uppercase(), path);
        self
    }

    fn parse_history(path: &Path, content: &str) -> Result<Vec<PricePoint>, JournalError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr.headers().map_err(|e| csv_error(path, e))?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| csv_error(path, format!("missing {} column", name)))
        };
        let date_col = column("date")?;
        let close_col = column("close")?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| csv_error(path, e))?;

            let date_str = record
                .get(date_col)
                .ok_or_else(|| csv_error(path, "missing date value"))?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| csv_error(path, format!("invalid date format: {}", e)))?;

            let close: f64 = record
                .get(close_col)
                .ok_or_else(|| csv_error(path, "missing close value"))?
                .parse()
                .map_err(|e| csv_error(path, format!("invalid close value: {}", e)))?;

            points.push(PricePoint { date, close });
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

impl PricePort for CsvPriceAdapter {
    fn current_prices(&self) -> Result<QuoteMap, JournalError> {
        let Some(path) = &self.quotes_path else {
            return Ok(QuoteMap::new());
        };
        let content = read_file(path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut quotes = QuoteMap::new();
        for result in rdr.deserialize::<QuoteRow>() {
            let row = result.map_err(|e| csv_error(path, e))?;
            if row.price > 0.0 {
                quotes.insert(row.ticker.to_uppercase(), row.price);
            } else {
                warn!(ticker = %row.ticker, price = row.price, "ignoring non-positive quote");
            }
        }
        debug!(path = %path.display(), count = quotes.len(), "loaded quotes");
        Ok(quotes)
    }

    fn price_history(&self, symbol: &str) -> Result<Vec<PricePoint>, JournalError> {
        let path = self
            .history
            .get(&symbol.to_uppercase())
            .ok_or_else(|| JournalError::NoPriceData {
                symbol: symbol.to_string(),
            })?;
        let content = read_file(path)?;
        let points = Self::parse_history(path, &content)?;
        if points.is_empty() {
            return Err(JournalError::NoPriceData {
                symbol: symbol.to_string(),
            });
        }
        debug!(symbol, count = points.len(), "loaded price history");
        Ok(points)
    }
}
