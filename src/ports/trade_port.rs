//! Trade storage port trait.

use crate::domain::error::JournalError;
use crate::domain::trade::Trade;

pub trait TradePort {
    /// Every recorded trade, open and closed, in storage order.
    fn load_trades(&self) -> Result<Vec<Trade>, JournalError>;
}
