//! Classification of transport failures into client errors.
//!
//! This is the only place a [`TransportError`] becomes an [`Error`]; the
//! fatal/statement-level split is decided here.

use crate::error::Error;
use crate::table::TableName;
use crate::transport::{
    MSG_DATABASE_CHANGED, MSG_INVALID_OBJECT, MSG_LANGUAGE_CHANGED, ServerMessage, TransportError,
};

/// What the connection was doing when the transport failed.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Phase<'a> {
    /// Opening the transport or applying session options.
    Connect,
    /// Executing SQL text.
    Query,
    /// Resolving a table's columns.
    Describe(&'a TableName),
    /// Running a bulk-copy primitive.
    Bulk,
}

pub(crate) fn classify(err: TransportError, phase: Phase<'_>) -> Error {
    if matches!(phase, Phase::Connect) {
        return Error::ConnectionFailed(err.to_string());
    }

    match err {
        TransportError::Io(e) => Error::ConnectionLost(e.to_string()),
        TransportError::Disconnected(reason) => Error::ConnectionLost(reason),
        TransportError::Login(reason) => Error::ConnectionFailed(reason),
        TransportError::Closed => Error::NotConnected,
        TransportError::UnknownObject(name) => Error::UnknownTable(name),
        TransportError::Server(msg) if msg.is_fatal() => Error::ConnectionLost(msg.to_string()),
        TransportError::Server(msg) => match phase {
            Phase::Describe(table) if msg.number == MSG_INVALID_OBJECT => {
                Error::UnknownTable(table.to_string())
            }
            _ => Error::Statement(msg),
        },
    }
}

/// Log informational server messages.
pub(crate) fn log_messages(messages: &[ServerMessage]) {
    for msg in messages {
        match msg.number {
            MSG_DATABASE_CHANGED | MSG_LANGUAGE_CHANGED => {
                tracing::trace!(number = msg.number, "{}", msg.message);
            }
            _ if msg.class <= 10 => {
                tracing::info!(number = msg.number, class = msg.class, "{}", msg.message);
            }
            _ => {
                tracing::warn!(number = msg.number, class = msg.class, "{}", msg.message);
            }
        }
    }
}
