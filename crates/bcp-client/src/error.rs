//! Client error types.
//!
//! Every error carries an explicit [`ErrorKind`], and the kind alone decides
//! whether the connection survives: callers can catch statement-level
//! errors around one operation and keep using the same [`Connection`].
//!
//! [`Connection`]: crate::Connection

use bcp_types::TypeError;
use thiserror::Error;

use crate::transport::ServerMessage;

/// Closed set of error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The connection could not be established (network, login, session setup).
    ConnectionFailed,
    /// The connection is closed or was invalidated by a fatal error.
    NotConnected,
    /// The transport failed while the connection was in use.
    ConnectionLost,
    /// A statement failed on the server.
    StatementError,
    /// The destination table does not exist or is not visible.
    UnknownTable,
    /// A row's arity differs from the destination column count.
    ColumnCountMismatch,
    /// A value cannot map to its column's wire type.
    TypeMismatch,
    /// A value is wider than its column allows.
    ValueTooLarge,
    /// The bulk-copy session has already been finalized.
    SessionClosed,
    /// A table identifier is malformed.
    InvalidIdentifier,
    /// The configuration is invalid.
    Config,
}

impl ErrorKind {
    /// Check if errors of this kind end the connection.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed | Self::NotConnected | Self::ConnectionLost
        )
    }
}

/// A coercion failure for one column of a row.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("column {ordinal} ({column}): {source}")]
pub struct ColumnError {
    /// Column position, starting at 1.
    pub ordinal: u16,
    /// Column name.
    pub column: String,
    /// What went wrong.
    pub source: TypeError,
}

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation attempted on a closed or invalidated connection.
    #[error("not connected")]
    NotConnected,

    /// The transport failed mid-operation; the connection is unusable.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The server rejected a statement.
    #[error("statement failed: {0}")]
    Statement(ServerMessage),

    /// The destination table could not be resolved.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// Row arity differs from the bound column count.
    #[error("row has {actual} values but the table has {expected} columns")]
    ColumnCountMismatch {
        /// Number of bound columns.
        expected: usize,
        /// Number of values in the row.
        actual: usize,
    },

    /// One or more values of a row could not be coerced.
    ///
    /// The row was not sent.
    #[error("invalid row: {}", describe_failures(.0))]
    InvalidRow(Vec<ColumnError>),

    /// The destination table has a column this client cannot bind.
    #[error("cannot bind column {column}: {source}")]
    UnsupportedColumn {
        /// Column name.
        column: String,
        /// Why the column was rejected.
        source: TypeError,
    },

    /// The destination table has more columns than a row can address.
    #[error("table has {0} columns; at most 65535 can be bound")]
    TooManyColumns(usize),

    /// The bulk-copy session is finalized.
    #[error("bulk-copy session is closed")]
    SessionClosed,

    /// Invalid identifier (potential SQL injection attempt).
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

fn describe_failures(failures: &[ColumnError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Get the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionFailed(_) => ErrorKind::ConnectionFailed,
            Self::NotConnected => ErrorKind::NotConnected,
            Self::ConnectionLost(_) => ErrorKind::ConnectionLost,
            Self::Statement(_)
            | Self::UnsupportedColumn { .. }
            | Self::TooManyColumns(_) => ErrorKind::StatementError,
            Self::UnknownTable(_) => ErrorKind::UnknownTable,
            Self::ColumnCountMismatch { .. } => ErrorKind::ColumnCountMismatch,
            Self::InvalidRow(failures) => match failures.first() {
                Some(failure) if failure.source.is_too_large() => ErrorKind::ValueTooLarge,
                _ => ErrorKind::TypeMismatch,
            },
            Self::SessionClosed => ErrorKind::SessionClosed,
            Self::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Check if this error invalidates the connection.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }

    /// Check if this is a server error with a specific number.
    #[must_use]
    pub fn is_server_error(&self, number: i32) -> bool {
        matches!(self, Self::Statement(msg) if msg.number == number)
    }

    /// Get the error class/severity if this is a server error.
    ///
    /// Severity ranges from 0-25:
    /// - 0-10: Informational (never raised)
    /// - 11-16: User errors
    /// - 17-19: Resource/hardware errors
    /// - 20-25: System errors (connection terminating)
    #[must_use]
    pub fn class(&self) -> Option<u8> {
        match self {
            Self::Statement(msg) => Some(msg.class),
            _ => None,
        }
    }

    /// Get the per-column failures of a rejected row.
    #[must_use]
    pub fn column_errors(&self) -> &[ColumnError] {
        match self {
            Self::InvalidRow(failures) => failures,
            _ => &[],
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(ordinal: u16, source: TypeError) -> ColumnError {
        ColumnError {
            ordinal,
            column: format!("c{ordinal}"),
            source,
        }
    }

    #[test]
    fn test_fatal_split() {
        assert!(Error::NotConnected.is_fatal());
        assert!(Error::ConnectionFailed("refused".into()).is_fatal());
        assert!(!Error::SessionClosed.is_fatal());
        assert!(!Error::UnknownTable("t".into()).is_fatal());
        assert!(
            !Error::ColumnCountMismatch {
                expected: 3,
                actual: 2
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_invalid_row_kind_follows_first_failure() {
        let too_large = TypeError::ValueTooLarge {
            target: "VARCHAR",
            size: 9,
            max: 8,
        };
        let mismatch = TypeError::TypeMismatch {
            expected: "INT",
            actual: "bytes",
        };

        let err = Error::InvalidRow(vec![failure(1, too_large.clone()), failure(2, mismatch.clone())]);
        assert_eq!(err.kind(), ErrorKind::ValueTooLarge);
        assert_eq!(err.column_errors().len(), 2);

        let err = Error::InvalidRow(vec![failure(2, mismatch), failure(3, too_large)]);
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_invalid_row_message_lists_columns() {
        let err = Error::InvalidRow(vec![failure(
            2,
            TypeError::UnexpectedNull { target: "INT" },
        )]);
        let text = err.to_string();
        assert!(text.contains("column 2 (c2)"), "{text}");
    }

    #[test]
    fn test_server_error_accessors() {
        let err = Error::Statement(ServerMessage::new(3701, 11, "Cannot drop the table 't'"));
        assert!(err.is_server_error(3701));
        assert_eq!(err.class(), Some(11));
        assert_eq!(err.kind(), ErrorKind::StatementError);
        assert_eq!(Error::SessionClosed.class(), None);
    }
}
