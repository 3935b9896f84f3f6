//! Error types for simdmat operations.
//!
//! Every runtime-detected failure aborts the current call and is reported through
//! [`MatError`]. Operations that are not defined for a given element type (for
//! example a real-valued function on `bool`) are rejected by trait bounds at compile
//! time and never reach this module.

use thiserror::Error;

/// Errors that can occur while evaluating or reducing matrix expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatError {
    /// Operand shapes disagree with each other or with the destination.
    #[error("Dimension mismatch in {operation}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Name of the operation that detected the mismatch.
        operation: &'static str,
        /// Human-readable description of the expected extent.
        expected: String,
        /// Human-readable description of the actual extent.
        found: String,
    },
    /// Checked element access outside of the matrix bounds.
    #[error("Index out of range: index {index} is not below {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The bound it was checked against.
        len: usize,
    },
    /// An order-based reduction (or mean) was invoked on zero elements.
    #[error("Empty input: {operation} is undefined for an empty matrix")]
    EmptyInput {
        /// Name of the reduction.
        operation: &'static str,
    },
    /// Malformed argument that is not a plain dimension mismatch.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable error message.
        message: String,
    },
}

/// Result type alias for simdmat operations.
pub type Result<T> = std::result::Result<T, MatError>;

/// Creates a dimension mismatch error.
pub fn dimension_mismatch(
    operation: &'static str,
    expected: impl ToString,
    found: impl ToString,
) -> MatError {
    MatError::DimensionMismatch {
        operation,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// Creates an index out of range error.
pub fn index_out_of_range(index: usize, len: usize) -> MatError {
    MatError::IndexOutOfRange { index, len }
}

/// Creates an empty input error.
pub fn empty_input(operation: &'static str) -> MatError {
    MatError::EmptyInput { operation }
}

/// Creates an invalid argument error.
pub fn invalid_argument(message: impl Into<String>) -> MatError {
    MatError::InvalidArgument {
        message: message.into(),
    }
}
