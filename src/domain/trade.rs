//! Journal trade records and their derived values.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// Reasons a trade record is rejected at ingestion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TradeError {
    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("entry price must be positive, got {0}")]
    NonPositiveEntryPrice(f64),

    #[error("exit price must be positive, got {0}")]
    NonPositiveExitPrice(f64),

    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("fees must be non-negative, got {0}")]
    NegativeFees(f64),

    #[error("exit date and exit price must be set together")]
    IncompleteExit,

    #[error("exit date {exit} is not after entry date {entry}")]
    ExitBeforeEntry {
        entry: NaiveDateTime,
        exit: NaiveDateTime,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub ticker: String,
    pub entry_date: NaiveDateTime,
    pub exit_date: Option<NaiveDateTime>,
    pub entry_price: f64,
    pub exit_price: Option<f64>,
    pub quantity: u32,
    pub fees: f64,
    pub is_short: bool,
    pub notes: String,
}

impl Trade {
    /// An open position with no fees and no notes.
    pub fn open(
        ticker: impl Into<String>,
        entry_date: NaiveDateTime,
        entry_price: f64,
        quantity: u32,
        is_short: bool,
    ) -> Self {
        Trade {
            ticker: ticker.into(),
            entry_date,
            exit_date: None,
            entry_price,
            exit_price: None,
            quantity,
            fees: 0.0,
            is_short,
            notes: String::new(),
        }
    }

    pub fn closed_at(mut self, exit_date: NaiveDateTime, exit_price: f64) -> Self {
        self.exit_date = Some(exit_date);
        self.exit_price = Some(exit_price);
        self
    }

    pub fn with_fees(mut self, fees: f64) -> Self {
        self.fees = fees;
        self
    }

    /// Check the record invariants. Mismatched exit fields are rejected
    /// rather than coerced.
    pub fn validate(&self) -> Result<(), TradeError> {
        if self.ticker.trim().is_empty() {
            return Err(TradeError::EmptyTicker);
        }
        if self.entry_price.is_nan() || self.entry_price <= 0.0 {
            return Err(TradeError::NonPositiveEntryPrice(self.entry_price));
        }
        if self.quantity == 0 {
            return Err(TradeError::ZeroQuantity);
        }
        if self.fees.is_nan() || self.fees < 0.0 {
            return Err(TradeError::NegativeFees(self.fees));
        }
        match (self.exit_date, self.exit_price) {
            (None, None) => Ok(()),
            (Some(exit), Some(price)) => {
                if price.is_nan() || price <= 0.0 {
                    return Err(TradeError::NonPositiveExitPrice(price));
                }
                if exit <= self.entry_date {
                    return Err(TradeError::ExitBeforeEntry {
                        entry: self.entry_date,
                        exit,
                    });
                }
                Ok(())
            }
            _ => Err(TradeError::IncompleteExit),
        }
    }

    pub fn direction(&self) -> Direction {
        if self.is_short {
            Direction::Short
        } else {
            Direction::Long
        }
    }

    /// Open unless both exit date and exit price are present.
    pub fn is_open(&self) -> bool {
        self.closing().is_none()
    }

    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    fn closing(&self) -> Option<(NaiveDateTime, f64)> {
        match (self.exit_date, self.exit_price) {
            (Some(date), Some(price)) => Some((date, price)),
            _ => None,
        }
    }

    pub fn notional(&self) -> f64 {
        self.entry_price * self.quantity as f64
    }

    fn gross_pnl_at(&self, price: f64) -> f64 {
        let qty = self.quantity as f64;
        if self.is_short {
            (self.entry_price - price) * qty
        } else {
            (price - self.entry_price) * qty
        }
    }

    /// Realized P&L net of fees; `None` while the trade is open.
    pub fn profit_loss(&self) -> Option<f64> {
        self.closing()
            .map(|(_, price)| self.gross_pnl_at(price) - self.fees)
    }

    /// Net P&L as a percentage of entry notional.
    pub fn profit_loss_percentage(&self) -> Option<f64> {
        let notional = self.notional();
        self.profit_loss().map(|pnl| {
            if notional > 0.0 {
                pnl / notional * 100.0
            } else {
                0.0
            }
        })
    }

    /// Mark-to-market P&L of an open trade at `current_price`, net of fees.
    /// Closed trades report their realized P&L instead.
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        match self.profit_loss() {
            Some(realized) => realized,
            None => self.gross_pnl_at(current_price) - self.fees,
        }
    }

    /// Whole days between entry and exit.
    pub fn holding_period(&self) -> Option<i64> {
        self.closing()
            .map(|(exit, _)| (exit - self.entry_date).num_days())
    }
}
