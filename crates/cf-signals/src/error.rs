//! Error types for signal generation.

use thiserror::Error;

/// Result type for signal operations.
pub type SignalResult<T> = Result<T, SignalError>;

/// Errors that can occur when building or selecting signals.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// Invalid argument provided to a constructor.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Selector value outside the switch's range.
    #[error("Signal selector out of range: {value} (expected 0..=2)")]
    SelectorOutOfRange { value: u8 },
}
