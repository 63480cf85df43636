//! Market data port trait.

use crate::domain::error::JournalError;
use crate::domain::price::{PricePoint, QuoteMap};

pub trait PricePort {
    /// Latest price per ticker. Tickers without a quote are simply absent.
    fn current_prices(&self) -> Result<QuoteMap, JournalError>;

    /// Daily closes for `symbol`, sorted by date.
    fn price_history(&self, symbol: &str) -> Result<Vec<PricePoint>, JournalError>;
}
