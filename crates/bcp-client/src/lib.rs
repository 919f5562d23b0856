//! # bcp-client
//!
//! Blocking bulk-copy client for TDS servers (SQL Server, Sybase).
//!
//! The client sits on top of a wire-protocol [`Transport`] and provides:
//!
//! - **Connections**: login, session options, ad hoc SQL with tabular display
//! - **Bulk-copy sessions**: bind a table, stream dynamically-typed rows,
//!   commit in batches, finalize with a total row count
//! - **Explicit error classification**: every [`Error`] has an [`ErrorKind`]
//!   that says whether the connection survived
//!
//! ## Lifecycle
//!
//! ```text
//! Connection::connect -> init(table) -> send(row)* -> done() -> disconnect()
//! ```
//!
//! A [`BulkCopySession`] mutably borrows its [`Connection`], so the borrow
//! checker rules out two open sessions, SQL interleaved with a session, and
//! a session outliving its connection.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bcp_client::{Config, Connection, Value};
//!
//! let config = Config::from_connection_string(
//!     "Server=dbhost;Database=tempdb;User Id=sa;Password=secret;Batch Size=1000;",
//! )?;
//! let mut conn = Connection::connect(&connector, config)?;
//!
//! // Statement errors leave the connection usable
//! let _ = conn.simple_query("DROP TABLE people", false);
//! conn.simple_query("CREATE TABLE people (name varchar(256), age float null)", false)?;
//!
//! let (_, total) = conn.bulk_copy("tempdb.dbo.people", |session| {
//!     session.send(&[Value::from("me"), Value::from(2)])?;
//!     session.send(&[Value::from("you"), Value::Null])?;
//!     Ok(())
//! })?;
//! assert_eq!(total, 2);
//!
//! conn.simple_query("SELECT * FROM people", true)?;
//! conn.disconnect();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod batch;
mod classify;
pub mod config;
pub mod connection;
pub mod error;
pub mod instrumentation;
pub mod options;
pub mod result;
pub mod row;
pub mod session;
pub mod state;
pub mod table;
pub mod transport;

pub use batch::BatchController;
pub use bcp_types::{BoundColumn, BoundValue, ColumnBinding, ColumnMetadata, Value, WireType};
pub use config::{Config, Credentials};
pub use connection::Connection;
pub use error::{ColumnError, Error, ErrorKind, Result};
pub use options::{BulkControl, BulkOptions};
pub use result::ResultSet;
pub use row::RowEncoder;
pub use session::BulkCopySession;
pub use state::{ConnectionState, SessionState};
pub use table::TableName;
pub use transport::{Connector, ExecuteOutput, ServerMessage, Transport, TransportError};
