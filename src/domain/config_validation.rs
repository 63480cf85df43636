//! Configuration validation.
//!
//! Checks the journal configuration before any file is loaded.

use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_journal_config(config: &dyn ConfigPort) -> Result<(), JournalError> {
    validate_trades_path(config)?;
    validate_optional_path(config, "journal", "quotes_path")?;
    validate_optional_path(config, "journal", "benchmark_path")?;
    validate_benchmark_symbol(config)?;
    validate_optional_path(config, "report", "output_path")?;
    validate_log_level(config)?;
    Ok(())
}

fn validate_trades_path(config: &dyn ConfigPort) -> Result<(), JournalError> {
    match config.get_string("journal", "trades_path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(JournalError::ConfigMissing {
            section: "journal".to_string(),
            key: "trades_path".to_string(),
        }),
    }
}

fn validate_optional_path(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), JournalError> {
    match config.get_string(section, key) {
        Some(s) if s.trim().is_empty() => Err(JournalError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must not be empty when set", key),
        }),
        _ => Ok(()),
    }
}

fn validate_benchmark_symbol(config: &dyn ConfigPort) -> Result<(), JournalError> {
    let Some(symbol) = config.get_string("journal", "benchmark_symbol") else {
        return Ok(());
    };
    let symbol = symbol.trim();
    let valid = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '-'));
    if !valid {
        return Err(JournalError::ConfigInvalid {
            section: "journal".to_string(),
            key: "benchmark_symbol".to_string(),
            reason: format!("'{}' is not a valid ticker symbol", symbol),
        });
    }
    Ok(())
}

fn validate_log_level(config: &dyn ConfigPort) -> Result<(), JournalError> {
    let Some(level) = config.get_string("logging", "level") else {
        return Ok(());
    };
    if LOG_LEVELS.contains(&level.trim().to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(JournalError::ConfigInvalid {
            section: "logging".to_string(),
            key: "level".to_string(),
            reason: format!("expected one of {}", LOG_LEVELS.join(", ")),
        })
    }
}
