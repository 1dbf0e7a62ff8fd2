//! Error types for block construction and discretisation.

use thiserror::Error;

/// Result type for block operations.
pub type BlockResult<T> = Result<T, BlockError>;

/// Errors that can occur when building or transforming blocks.
///
/// All variants are construction-time failures; stepping a successfully
/// constructed block never fails.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BlockError {
    /// Invalid argument provided to a constructor.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Matrix/vector dimensions do not agree.
    #[error("Dimension mismatch: {what}")]
    DimensionMismatch { what: &'static str },
}
