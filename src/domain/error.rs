//! Domain error types.

use super::trade::TradeError;

/// Top-level error type for tradejournal.
///
/// Only the edges (file loading, configuration, validation) produce these;
/// the metrics and pattern computations never fail.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("csv error in {path}: {reason}")]
    Csv { path: String, reason: String },

    #[error("invalid trade at row {row}: {source}")]
    InvalidTrade {
        row: usize,
        #[source]
        source: TradeError,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no trades found in {source_name}")]
    NoTrades { source_name: String },

    #[error("no price data for {symbol}")]
    NoPriceData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&JournalError> for std::process::ExitCode {
    fn from(err: &JournalError) -> Self {
        let code: u8 = match err {
            JournalError::Io(_) => 1,
            JournalError::ConfigParse { .. }
            | JournalError::ConfigMissing { .. }
            | JournalError::ConfigInvalid { .. } => 2,
            JournalError::Csv { .. } | JournalError::InvalidTrade { .. } => 3,
            JournalError::NoTrades { .. } | JournalError::NoPriceData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
