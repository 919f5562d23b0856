//! Type coercion error types.

use thiserror::Error;

/// Errors that can occur while coercing a value into a column's wire form.
///
/// Every variant is row-level: the value is rejected, the connection and the
/// bulk-copy session stay usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    /// The value's runtime type cannot map to the column's wire type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Wire type name the column expects.
        expected: &'static str,
        /// Runtime type name of the value.
        actual: &'static str,
    },

    /// The encoded value is wider than the column allows.
    #[error("value too large: {size} bytes exceeds the {max} byte limit of {target}")]
    ValueTooLarge {
        /// Wire type name of the column.
        target: &'static str,
        /// Encoded size in bytes (or the integer width required).
        size: usize,
        /// Maximum width the column accepts.
        max: usize,
    },

    /// NULL was sent to a column that does not accept it.
    #[error("unexpected null value for non-nullable {target} column")]
    UnexpectedNull {
        /// Wire type name of the column.
        target: &'static str,
    },

    /// Text could not be parsed as the column's numeric type.
    #[error("invalid {target} literal: {text:?}")]
    InvalidNumber {
        /// Wire type name of the column.
        target: &'static str,
        /// The text that failed to parse.
        text: String,
    },

    /// The server reported a column type this layer cannot bind.
    #[error("unsupported wire type 0x{0:02X}")]
    UnsupportedType(u8),

    /// A declared SQL type name is not recognised.
    #[error("unknown SQL type: {0}")]
    UnknownSqlType(String),

    /// A column reported a width its wire type cannot have.
    #[error("invalid width {width} for {target}")]
    InvalidWidth {
        /// Wire type name of the column.
        target: &'static str,
        /// The reported width.
        width: u32,
    },

    /// A bound payload is malformed for its column type.
    #[error("invalid payload for {target}: {reason}")]
    InvalidPayload {
        /// Wire type name of the column.
        target: &'static str,
        /// What was wrong.
        reason: &'static str,
    },
}

impl TypeError {
    /// Check if this failure is a width overflow rather than a type problem.
    #[must_use]
    pub fn is_too_large(&self) -> bool {
        matches!(self, Self::ValueTooLarge { .. })
    }
}
