//! Error types for the slot core

use thiserror::Error;

use crate::symbols::Symbol;

/// Result alias used throughout the crate
pub type SlotResult<T> = Result<T, SlotError>;

/// Errors raised by spins, draws and evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotError {
    /// Pay-line index outside the 8-line catalog
    #[error("Invalid line index: {0} (expected 0..=7)")]
    InvalidLineIndex(usize),

    /// Spin requested with an empty line selection
    #[error("No active pay-lines selected")]
    NoActiveLines,

    /// Bet per line is zero, negative or not finite
    #[error("Invalid bet per line: {0}")]
    InvalidBet(f64),

    /// Balance cannot cover the total bet
    #[error("Insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: f64, required: f64 },

    /// Another spin currently holds the machine
    #[error("A spin is already in progress")]
    SpinInProgress,

    /// Symbol has no catalog entry
    #[error("Symbol {0} has no catalog entry")]
    UnknownSymbol(Symbol),

    /// Weights cannot produce a draw
    #[error("Symbol weights sum to zero or are not finite")]
    ZeroTotalWeight,

    /// Configuration failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SlotError {
    /// True for caller-side contract violations (bad bet, lines, balance)
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidLineIndex(_)
                | Self::NoActiveLines
                | Self::InvalidBet(_)
                | Self::InsufficientBalance { .. }
        )
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

impl From<serde_yml::Error> for ConfigError {
    fn from(e: serde_yml::Error) -> Self {
        Self::Yaml(e.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_classification() {
        assert!(SlotError::InvalidLineIndex(9).is_invalid_input());
        assert!(SlotError::InvalidBet(0.0).is_invalid_input());
        assert!(
            SlotError::InsufficientBalance {
                balance: 1.0,
                required: 8.0
            }
            .is_invalid_input()
        );
        assert!(!SlotError::ZeroTotalWeight.is_invalid_input());
        assert!(!SlotError::SpinInProgress.is_invalid_input());
    }

    #[test]
    fn test_config_error_wraps() {
        let err: SlotError = ConfigError::Invalid("bad".into()).into();
        assert_eq!(err.to_string(), "Configuration error: Invalid configuration: bad");
    }
}
