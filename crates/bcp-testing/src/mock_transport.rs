//! In-memory transport for testing the client without a server.
//!
//! [`MockConnector`] plays the wire-protocol collaborator. It keeps a small
//! catalog of tables, understands a subset of SQL (`CREATE TABLE`,
//! `DROP TABLE`, `TRUNCATE TABLE`, `SELECT ... FROM`, `SET`, `USE`), stores
//! bulk-copied rows, and journals every primitive call so tests can count
//! commits and finalizations.
//!
//! Rows are framed exactly as they would be inside a TDS ROW token and
//! decoded back before they are stored, so a payload the server could not
//! parse fails here too.
//!
//! The connector is a cheap handle over shared state: clone it to keep an
//! inspector around after handing it to [`Connection::connect`].
//!
//! [`Connection::connect`]: bcp_client::Connection::connect

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bcp_client::{
    BulkOptions, Config, Connector, ExecuteOutput, ResultSet, ServerMessage, TableName, Transport,
    TransportError,
};
use bcp_types::{BoundColumn, ColumnBinding, ColumnMetadata, SqlType, TypeError, Value, decode};
use bytes::BytesMut;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

/// Name the mock reports as the server.
pub const DEFAULT_SERVER_NAME: &str = "MOCKSERVER";

/// Mock response configuration for a specific SQL text.
#[derive(Clone)]
pub enum MockResponse {
    /// Return one result set.
    Rows {
        /// Column names.
        columns: Vec<String>,
        /// Row data.
        rows: Vec<Vec<Value>>,
    },

    /// Return a server error.
    Error {
        /// Error number.
        number: i32,
        /// Error message.
        message: String,
        /// Severity class.
        severity: u8,
    },

    /// Return an informational message and no rows.
    Message {
        /// Message number.
        number: i32,
        /// Message text.
        message: String,
        /// Severity class.
        severity: u8,
    },

    /// Return rows affected count.
    RowsAffected(u64),

    /// Execute a custom handler.
    Custom(Arc<dyn Fn(&str) -> MockResponse + Send + Sync>),
}

impl fmt::Debug for MockResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows { columns, rows } => f
                .debug_struct("Rows")
                .field("columns", columns)
                .field("rows", rows)
                .finish(),
            Self::Error {
                number,
                message,
                severity,
            } => f
                .debug_struct("Error")
                .field("number", number)
                .field("message", message)
                .field("severity", severity)
                .finish(),
            Self::Message {
                number,
                message,
                severity,
            } => f
                .debug_struct("Message")
                .field("number", number)
                .field("message", message)
                .field("severity", severity)
                .finish(),
            Self::RowsAffected(n) => f.debug_tuple("RowsAffected").field(n).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<fn>").finish(),
        }
    }
}

impl MockResponse {
    /// Create an empty result response.
    pub fn empty() -> Self {
        Self::RowsAffected(0)
    }

    /// Create a rows affected response.
    pub fn affected(count: u64) -> Self {
        Self::RowsAffected(count)
    }

    /// Create an error response (severity 16).
    pub fn error(number: i32, message: impl Into<String>) -> Self {
        Self::Error {
            number,
            message: message.into(),
            severity: 16,
        }
    }

    /// Create an error response with an explicit severity.
    pub fn error_with_severity(number: i32, severity: u8, message: impl Into<String>) -> Self {
        Self::Error {
            number,
            message: message.into(),
            severity,
        }
    }

    /// Create an informational message response.
    pub fn message(number: i32, message: impl Into<String>) -> Self {
        Self::Message {
            number,
            message: message.into(),
            severity: 10,
        }
    }

    /// Create a single result set response.
    pub fn rows<S: Into<String>>(columns: impl IntoIterator<Item = S>, rows: Vec<Vec<Value>>) -> Self {
        Self::Rows {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
        }
    }
}

/// A transport primitive, as recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// A transport was opened.
    Open,
    /// SQL text was executed.
    Execute(String),
    /// A table was described.
    Describe(String),
    /// A bulk load started with the given `INSERT BULK` statement.
    BeginBulk {
        /// Table key.
        table: String,
        /// Announcing statement.
        statement: String,
    },
    /// A row was appended.
    AppendRow,
    /// A batch was committed.
    CommitBatch {
        /// Rows in the batch.
        rows: u64,
    },
    /// The bulk load ended.
    Finalize {
        /// Rows committed by the finalization itself.
        rows: u64,
    },
    /// The transport was closed.
    Close,
}

/// Transport primitive a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// `Connector::open`.
    Open,
    /// `Transport::execute`.
    Execute,
    /// `Transport::describe_columns`.
    Describe,
    /// `Transport::begin_bulk`.
    BeginBulk,
    /// `Transport::append_row`.
    AppendRow,
    /// `Transport::commit_batch`.
    CommitBatch,
    /// `Transport::finalize`.
    Finalize,
}

/// An injected failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// The server reports an error.
    Server {
        /// Error number.
        number: i32,
        /// Severity class.
        severity: u8,
        /// Error message.
        message: String,
    },
    /// The connection drops.
    Disconnect,
}

impl MockFailure {
    /// Create a server error failure.
    pub fn server(number: i32, severity: u8, message: impl Into<String>) -> Self {
        Self::Server {
            number,
            severity,
            message: message.into(),
        }
    }

    fn to_error(&self, server: &str) -> TransportError {
        match self {
            Self::Server {
                number,
                severity,
                message,
            } => TransportError::Server(
                ServerMessage::new(*number, *severity, message.clone()).with_server(server),
            ),
            Self::Disconnect => TransportError::Disconnected("connection reset by peer".into()),
        }
    }
}

/// A table held by the mock server.
#[derive(Debug, Clone, PartialEq)]
pub struct MockTable {
    name: String,
    columns: Vec<(String, SqlType)>,
    rows: Vec<Vec<Value>>,
}

impl MockTable {
    /// Create a table from `(name, declaration)` column pairs.
    pub fn new(name: impl Into<String>, columns: &[(&str, &str)]) -> Result<Self, TypeError> {
        let columns = columns
            .iter()
            .map(|(name, decl)| Ok(((*name).to_string(), SqlType::parse(decl)?)))
            .collect::<Result<Vec<_>, TypeError>>()?;
        Ok(Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        })
    }

    /// Get the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the stored rows.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    fn metadata(&self) -> Vec<ColumnMetadata> {
        self.columns
            .iter()
            .map(|(name, ty)| ty.to_metadata(name.as_str()))
            .collect()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|(c, _)| c.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug)]
struct InjectedFailure {
    point: FailurePoint,
    skip: usize,
    failure: MockFailure,
}

struct MockState {
    tables: HashMap<String, MockTable>,
    responses: HashMap<String, MockResponse>,
    default_response: Option<MockResponse>,
    journal: Vec<Operation>,
    failures: Vec<InjectedFailure>,
    login_failure: Option<String>,
    server_name: String,
    database: String,
    open_transports: usize,
}

impl MockState {
    fn take_failure(&mut self, point: FailurePoint) -> Option<TransportError> {
        let index = self.failures.iter().position(|f| f.point == point)?;
        let failure = &mut self.failures[index];
        if failure.skip > 0 {
            failure.skip -= 1;
            return None;
        }
        let failure = self.failures.remove(index);
        Some(failure.failure.to_error(&self.server_name))
    }

    fn server_error(&self, number: i32, severity: u8, message: String) -> TransportError {
        TransportError::Server(ServerMessage::new(number, severity, message).with_server(&self.server_name))
    }
}

/// Builder for [`MockConnector`].
pub struct MockConnectorBuilder {
    state: MockState,
}

impl MockConnectorBuilder {
    /// Create a builder with an empty catalog.
    pub fn new() -> Self {
        Self {
            state: MockState {
                tables: HashMap::new(),
                responses: HashMap::new(),
                default_response: None,
                journal: Vec::new(),
                failures: Vec::new(),
                login_failure: None,
                server_name: DEFAULT_SERVER_NAME.to_string(),
                database: "master".to_string(),
                open_transports: 0,
            },
        }
    }

    /// Register a table.
    #[must_use]
    pub fn with_table(mut self, table: MockTable) -> Self {
        self.state.tables.insert(table_key(&table.name), table);
        self
    }

    /// Add a canned response for an exact SQL text (case-insensitive).
    #[must_use]
    pub fn with_response(mut self, sql: impl Into<String>, response: MockResponse) -> Self {
        self.state.responses.insert(normalize(&sql.into()), response);
        self
    }

    /// Set the response for SQL the mock does not understand.
    #[must_use]
    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        self.state.default_response = Some(response);
        self
    }

    /// Set the server name.
    #[must_use]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.state.server_name = name.into();
        self
    }

    /// Set the database the mock starts in.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.state.database = database.into();
        self
    }

    /// Reject every login with `message`.
    #[must_use]
    pub fn with_login_failure(mut self, message: impl Into<String>) -> Self {
        self.state.login_failure = Some(message.into());
        self
    }

    /// Build the connector.
    pub fn build(self) -> MockConnector {
        MockConnector {
            state: Arc::new(Mutex::new(self.state)),
        }
    }
}

impl Default for MockConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Opens [`MockTransport`]s over shared in-memory state.
#[derive(Clone)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Create a new builder.
    pub fn builder() -> MockConnectorBuilder {
        MockConnectorBuilder::new()
    }

    /// Fail the next call at `point`.
    pub fn fail_next(&self, point: FailurePoint, failure: MockFailure) {
        self.fail_nth(point, 1, failure);
    }

    /// Fail the `n`th call (1-based, counted from now) at `point`.
    pub fn fail_nth(&self, point: FailurePoint, n: usize, failure: MockFailure) {
        self.state.lock().failures.push(InjectedFailure {
            point,
            skip: n.saturating_sub(1),
            failure,
        });
    }

    /// Get a copy of the operation journal.
    pub fn journal(&self) -> Vec<Operation> {
        self.state.lock().journal.clone()
    }

    /// Count journal entries matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Operation) -> bool) -> usize {
        self.state.lock().journal.iter().filter(|op| predicate(op)).count()
    }

    /// Get the row counts of every committed batch, in order.
    pub fn commits(&self) -> Vec<u64> {
        self.state
            .lock()
            .journal
            .iter()
            .filter_map(|op| match op {
                Operation::CommitBatch { rows } => Some(*rows),
                _ => None,
            })
            .collect()
    }

    /// Count finalized bulk loads.
    pub fn finalize_count(&self) -> usize {
        self.count(|op| matches!(op, Operation::Finalize { .. }))
    }

    /// Get the SQL batches executed, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state
            .lock()
            .journal
            .iter()
            .filter_map(|op| match op {
                Operation::Execute(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    /// Clear the journal.
    pub fn clear_journal(&self) {
        self.state.lock().journal.clear();
    }

    /// Get the committed rows of a table.
    pub fn table_rows(&self, table: &str) -> Option<Vec<Vec<Value>>> {
        self.state
            .lock()
            .tables
            .get(&table_key(table))
            .map(|t| t.rows.clone())
    }

    /// Check if a table exists.
    pub fn has_table(&self, table: &str) -> bool {
        self.state.lock().tables.contains_key(&table_key(table))
    }

    /// Get the current database.
    pub fn database(&self) -> String {
        self.state.lock().database.clone()
    }

    /// Get the number of transports that are open.
    pub fn open_transports(&self) -> usize {
        self.state.lock().open_transports
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    fn open(&self, config: &Config) -> Result<MockTransport, TransportError> {
        let mut state = self.state.lock();
        if let Some(err) = state.take_failure(FailurePoint::Open) {
            return Err(err);
        }
        if let Some(message) = &state.login_failure {
            return Err(TransportError::Login(message.clone()));
        }

        tracing::debug!(host = %config.host, "mock transport opened");
        if let Some(db) = &config.database {
            state.database = db.clone();
        }
        state.journal.push(Operation::Open);
        state.open_transports += 1;
        drop(state);

        Ok(MockTransport {
            state: Arc::clone(&self.state),
            bulk: None,
            closed: false,
        })
    }
}

impl fmt::Debug for MockConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockConnector")
            .field("server", &state.server_name)
            .field("tables", &state.tables.len())
            .field("journal", &state.journal.len())
            .finish()
    }
}

struct BulkLoad {
    table: String,
    columns: Vec<ColumnBinding>,
    pending: Vec<Vec<Value>>,
    frame: BytesMut,
}

/// One open mock session.
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    bulk: Option<BulkLoad>,
    closed: bool,
}

impl MockTransport {
    fn check_open(&self) -> Result<(), TransportError> {
        if self.closed {
            Err(TransportError::Closed)
        } else {
            Ok(())
        }
    }

    fn bulk_mut(&mut self) -> Result<&mut BulkLoad, TransportError> {
        self.bulk.as_mut().ok_or_else(|| {
            TransportError::Server(ServerMessage::new(
                4804,
                16,
                "No bulk load in progress",
            ))
        })
    }

    /// Move pending rows into their table; returns how many moved.
    fn flush_pending(&mut self) -> Result<u64, TransportError> {
        let state = Arc::clone(&self.state);
        let bulk = self.bulk_mut()?;
        let rows = std::mem::take(&mut bulk.pending);
        let count = rows.len() as u64;

        let mut state = state.lock();
        let server = state.server_name.clone();
        let table = state.tables.get_mut(&bulk.table).ok_or_else(|| {
            TransportError::Server(
                ServerMessage::new(208, 16, format!("Invalid object name '{}'.", bulk.table))
                    .with_server(server),
            )
        })?;
        table.rows.extend(rows);
        Ok(count)
    }
}

impl Transport for MockTransport {
    fn execute(&mut self, sql: &str) -> Result<ExecuteOutput, TransportError> {
        self.check_open()?;
        let mut state = self.state.lock();
        state.journal.push(Operation::Execute(sql.to_string()));
        if let Some(err) = state.take_failure(FailurePoint::Execute) {
            return Err(err);
        }
        if self.bulk.is_some() {
            return Err(state.server_error(
                4827,
                16,
                "Cannot execute a batch while a bulk load is in progress".into(),
            ));
        }

        let canned = state.responses.get(&normalize(sql)).cloned();
        match canned {
            Some(response) => respond(&state, sql, response),
            None => run_sql(&mut state, sql),
        }
    }

    fn describe_columns(&mut self, table: &TableName) -> Result<Vec<ColumnMetadata>, TransportError> {
        self.check_open()?;
        let mut state = self.state.lock();
        state.journal.push(Operation::Describe(table.to_string()));
        if let Some(err) = state.take_failure(FailurePoint::Describe) {
            return Err(err);
        }

        match state.tables.get(&table_key(table.table())) {
            Some(t) => Ok(t.metadata()),
            None => Err(state.server_error(
                208,
                16,
                format!("Invalid object name '{table}'."),
            )),
        }
    }

    fn begin_bulk(
        &mut self,
        table: &TableName,
        columns: &[ColumnBinding],
        options: &BulkOptions,
    ) -> Result<(), TransportError> {
        self.check_open()?;
        let key = table_key(table.table());
        {
            let mut state = self.state.lock();
            state.journal.push(Operation::BeginBulk {
                table: key.clone(),
                statement: options.insert_bulk_statement(table, columns, 0),
            });
            if let Some(err) = state.take_failure(FailurePoint::BeginBulk) {
                return Err(err);
            }
            if !state.tables.contains_key(&key) {
                return Err(state.server_error(208, 16, format!("Invalid object name '{table}'.")));
            }
        }

        self.bulk = Some(BulkLoad {
            table: key,
            columns: columns.to_vec(),
            pending: Vec::new(),
            frame: BytesMut::with_capacity(1024),
        });
        Ok(())
    }

    fn append_row(&mut self, row: &[BoundColumn]) -> Result<(), TransportError> {
        self.check_open()?;
        {
            let mut state = self.state.lock();
            state.journal.push(Operation::AppendRow);
            if let Some(err) = state.take_failure(FailurePoint::AppendRow) {
                return Err(err);
            }
        }

        let bulk = self.bulk_mut()?;
        let invalid = |e: TypeError| {
            TransportError::Server(ServerMessage::new(
                4815,
                16,
                format!("Received an invalid column value from the bcp client: {e}"),
            ))
        };

        if row.len() != bulk.columns.len() {
            return Err(TransportError::Server(ServerMessage::new(
                4816,
                16,
                "Invalid column count in the bulk load row",
            )));
        }

        // Frame as a ROW token would, then read the values back
        bulk.frame.clear();
        let mut values = Vec::with_capacity(row.len());
        for (column, binding) in row.iter().zip(&bulk.columns) {
            column.write_to(binding, &mut bulk.frame).map_err(invalid)?;
            values.push(decode(&column.value, binding).map_err(invalid)?);
        }
        bulk.pending.push(values);
        Ok(())
    }

    fn commit_batch(&mut self) -> Result<u64, TransportError> {
        self.check_open()?;
        {
            let mut state = self.state.lock();
            if let Some(err) = state.take_failure(FailurePoint::CommitBatch) {
                // A failed batch is rolled back
                if let Some(bulk) = self.bulk.as_mut() {
                    bulk.pending.clear();
                }
                return Err(err);
            }
        }

        let rows = self.flush_pending()?;
        self.state.lock().journal.push(Operation::CommitBatch { rows });
        Ok(rows)
    }

    fn finalize(&mut self) -> Result<u64, TransportError> {
        self.check_open()?;
        {
            let mut state = self.state.lock();
            if let Some(err) = state.take_failure(FailurePoint::Finalize) {
                self.bulk = None;
                return Err(err);
            }
        }

        let rows = self.flush_pending()?;
        self.bulk = None;
        self.state.lock().journal.push(Operation::Finalize { rows });
        Ok(rows)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.bulk = None;
        let mut state = self.state.lock();
        state.journal.push(Operation::Close);
        state.open_transports = state.open_transports.saturating_sub(1);
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("closed", &self.closed)
            .field("bulk", &self.bulk.as_ref().map(|b| &b.table))
            .finish()
    }
}

/// Key a table by its unqualified, case-folded name.
fn table_key(name: &str) -> String {
    match TableName::parse(name) {
        Ok(parsed) => parsed.table().to_lowercase(),
        Err(_) => name.trim().to_lowercase(),
    }
}

fn normalize(sql: &str) -> String {
    sql.trim().trim_end_matches(';').trim().to_uppercase()
}

fn respond(state: &MockState, sql: &str, response: MockResponse) -> Result<ExecuteOutput, TransportError> {
    match response {
        MockResponse::Rows { columns, rows } => {
            let mut result_set = ResultSet::new(columns);
            let count = rows.len() as u64;
            for row in rows {
                result_set.push_row(row);
            }
            Ok(ExecuteOutput {
                result_sets: vec![result_set],
                messages: Vec::new(),
                rows_affected: Some(count),
            })
        }
        MockResponse::Error {
            number,
            message,
            severity,
        } => Err(state.server_error(number, severity, message)),
        MockResponse::Message {
            number,
            message,
            severity,
        } => Ok(ExecuteOutput {
            messages: vec![ServerMessage::new(number, severity, message).with_server(&state.server_name)],
            ..ExecuteOutput::default()
        }),
        MockResponse::RowsAffected(n) => Ok(ExecuteOutput {
            rows_affected: Some(n),
            ..ExecuteOutput::default()
        }),
        MockResponse::Custom(handler) => respond(state, sql, handler(sql)),
    }
}

#[allow(clippy::unwrap_used)]
static CREATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*CREATE\s+TABLE\s+(?P<name>[^\s(]+)\s*\((?P<cols>.*)\)\s*;?\s*$").unwrap()
});

#[allow(clippy::unwrap_used)]
static DROP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*DROP\s+TABLE\s+(?P<name>\S+?)\s*;?\s*$").unwrap());

#[allow(clippy::unwrap_used)]
static TRUNCATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*TRUNCATE\s+TABLE\s+(?P<name>\S+?)\s*;?\s*$").unwrap());

#[allow(clippy::unwrap_used)]
static SELECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*SELECT\s+(?P<cols>.+?)\s+FROM\s+(?P<name>\S+?)\s*;?\s*$").unwrap()
});

#[allow(clippy::unwrap_used)]
static USE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*USE\s+(?P<name>\S+?)\s*;?\s*$").unwrap());

#[allow(clippy::unwrap_used)]
static SET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)^\s*SET\s+\w+").unwrap());

/// Run the SQL subset against the catalog.
fn run_sql(state: &mut MockState, sql: &str) -> Result<ExecuteOutput, TransportError> {
    if let Some(caps) = CREATE_RE.captures(sql) {
        let name = &caps["name"];
        let key = table_key(name);
        if state.tables.contains_key(&key) {
            return Err(state.server_error(
                2714,
                16,
                format!("There is already an object named '{name}' in the database."),
            ));
        }

        let mut columns = Vec::new();
        for def in split_top_level(&caps["cols"]) {
            let def = def.trim();
            let (column, decl) = def.split_once(char::is_whitespace).ok_or_else(|| {
                state.server_error(173, 15, format!("The definition for column '{def}' must include a data type."))
            })?;
            let ty = SqlType::parse(decl).map_err(|e| state.server_error(2715, 16, e.to_string()))?;
            columns.push((unquote(column), ty));
        }

        let display = TableName::parse(name)
            .map(|t| t.table().to_string())
            .unwrap_or_else(|_| name.to_string());
        state.tables.insert(
            key,
            MockTable {
                name: display,
                columns,
                rows: Vec::new(),
            },
        );
        return Ok(ExecuteOutput::default());
    }

    if let Some(caps) = DROP_RE.captures(sql) {
        let name = &caps["name"];
        return match state.tables.remove(&table_key(name)) {
            Some(_) => Ok(ExecuteOutput::default()),
            None => Err(state.server_error(
                3701,
                11,
                format!(
                    "Cannot drop the table '{name}', because it does not exist or you do not have permission."
                ),
            )),
        };
    }

    if let Some(caps) = TRUNCATE_RE.captures(sql) {
        let name = &caps["name"];
        let key = table_key(name);
        if !state.tables.contains_key(&key) {
            return Err(state.server_error(
                4701,
                16,
                format!("Cannot find the object \"{name}\" because it does not exist or you do not have permissions."),
            ));
        }
        let removed = state
            .tables
            .get_mut(&key)
            .map(|table| std::mem::take(&mut table.rows).len() as u64);
        return Ok(ExecuteOutput {
            rows_affected: removed,
            ..ExecuteOutput::default()
        });
    }

    if let Some(caps) = SELECT_RE.captures(sql) {
        return select(state, &caps["cols"], &caps["name"]);
    }

    if let Some(caps) = USE_RE.captures(sql) {
        let database = unquote(&caps["name"]);
        state.database = database.clone();
        return Ok(ExecuteOutput {
            messages: vec![
                ServerMessage::new(5701, 10, format!("Changed database context to '{database}'."))
                    .with_server(&state.server_name),
            ],
            ..ExecuteOutput::default()
        });
    }

    if SET_RE.is_match(sql) {
        return Ok(ExecuteOutput::default());
    }

    let fallback = state.default_response.clone().unwrap_or_else(MockResponse::empty);
    respond(state, sql, fallback)
}

fn select(state: &MockState, cols: &str, name: &str) -> Result<ExecuteOutput, TransportError> {
    let table = state.tables.get(&table_key(name)).ok_or_else(|| {
        state.server_error(208, 16, format!("Invalid object name '{name}'."))
    })?;

    let indices: Vec<usize> = if cols.trim() == "*" {
        (0..table.columns.len()).collect()
    } else {
        cols.split(',')
            .map(|c| {
                let c = unquote(c.trim());
                table.column_index(&c).ok_or_else(|| {
                    state.server_error(207, 16, format!("Invalid column name '{c}'."))
                })
            })
            .collect::<Result<_, _>>()?
    };

    let mut result_set = ResultSet::new(indices.iter().map(|&i| table.columns[i].0.clone()));
    for row in &table.rows {
        result_set.push_row(indices.iter().map(|&i| row[i].clone()).collect());
    }
    let count = result_set.len() as u64;

    Ok(ExecuteOutput {
        result_sets: vec![result_set],
        messages: Vec::new(),
        rows_affected: Some(count),
    })
}

/// Split on commas that are not inside parentheses.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

fn unquote(name: &str) -> String {
    let name = name.trim();
    match name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
        Some(inner) => inner.replace("]]", "]"),
        None => name.to_string(),
    }
}
