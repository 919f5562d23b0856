//! The wire-protocol collaborator boundary.
//!
//! The client never speaks TDS itself. A [`Connector`] opens a
//! [`Transport`], a blocking, single-outstanding-operation handle that
//! provides the primitives the connection and bulk-copy session are built
//! from. Transport failures are reported as [`TransportError`] and
//! classified into [`crate::Error`] by the connection.

use bcp_types::{BoundColumn, ColumnBinding, ColumnMetadata};
use thiserror::Error;

use crate::config::Config;
use crate::options::BulkOptions;
use crate::result::ResultSet;
use crate::table::TableName;

/// Message number for "changed database context".
pub const MSG_DATABASE_CHANGED: i32 = 5701;

/// Message number for "changed language setting".
pub const MSG_LANGUAGE_CHANGED: i32 = 5703;

/// Message number for "invalid object name".
pub const MSG_INVALID_OBJECT: i32 = 208;

/// A message reported by the server (an ERROR or INFO token).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerMessage {
    /// Message number.
    pub number: i32,
    /// Severity class (0-25).
    pub class: u8,
    /// Message state.
    pub state: u8,
    /// Message text.
    pub message: String,
    /// Server name where the message originated.
    pub server: Option<String>,
    /// Stored procedure name (if applicable).
    pub procedure: Option<String>,
    /// Line number in the SQL batch or procedure.
    pub line: u32,
}

impl ServerMessage {
    /// Create a message with the given number, severity and text.
    pub fn new(number: i32, class: u8, message: impl Into<String>) -> Self {
        Self {
            number,
            class,
            state: 1,
            message: message.into(),
            server: None,
            procedure: None,
            line: 1,
        }
    }

    /// Set the server name.
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Check if this message is informational only.
    ///
    /// Context-change notices (5701, 5703) and anything at severity 10 or
    /// below never fail an operation.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        self.class <= 10 || matches!(self.number, MSG_DATABASE_CHANGED | MSG_LANGUAGE_CHANGED)
    }

    /// Check if this message terminates the connection (severity 20+).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.class >= 20
    }
}

impl std::fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Msg {}, Level {}, State {}: {}",
            self.number, self.class, self.state, self.message
        )
    }
}

/// Errors reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// IO error on the underlying socket.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection.
    #[error("disconnected: {0}")]
    Disconnected(String),

    /// Login was rejected.
    #[error("login failed: {0}")]
    Login(String),

    /// The server reported an error.
    #[error("{0}")]
    Server(ServerMessage),

    /// A named object does not exist or is not visible.
    #[error("unknown object: {0}")]
    UnknownObject(String),

    /// The transport was used after `close`.
    #[error("transport closed")]
    Closed,
}

/// Output of one executed batch of SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteOutput {
    /// Result sets in the order the server returned them.
    pub result_sets: Vec<ResultSet>,
    /// Informational messages raised while executing.
    pub messages: Vec<ServerMessage>,
    /// Rows affected by the last statement, if reported.
    pub rows_affected: Option<u64>,
}

/// Opens transports.
pub trait Connector {
    /// Transport type this connector produces.
    type Transport: Transport;

    /// Open a transport and log in.
    fn open(&self, config: &Config) -> Result<Self::Transport, TransportError>;
}

/// A connected wire-protocol session.
///
/// All methods block until the server has answered. Only one operation is
/// outstanding at a time; the bulk-copy primitives are only called between
/// `begin_bulk` and `finalize`.
pub trait Transport {
    /// Execute a batch of SQL text.
    fn execute(&mut self, sql: &str) -> Result<ExecuteOutput, TransportError>;

    /// Describe the columns of a table, in table order.
    fn describe_columns(&mut self, table: &TableName) -> Result<Vec<ColumnMetadata>, TransportError>;

    /// Start a bulk-copy operation into `table`.
    fn begin_bulk(
        &mut self,
        table: &TableName,
        columns: &[ColumnBinding],
        options: &BulkOptions,
    ) -> Result<(), TransportError>;

    /// Append one fully bound row to the current batch.
    fn append_row(&mut self, row: &[BoundColumn]) -> Result<(), TransportError>;

    /// Commit the current batch; returns the rows it contained.
    fn commit_batch(&mut self) -> Result<u64, TransportError>;

    /// End the bulk-copy operation; returns the rows in the final batch.
    fn finalize(&mut self) -> Result<u64, TransportError>;

    /// Release the transport.
    fn close(&mut self);
}
