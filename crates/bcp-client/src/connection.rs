//! Connection lifecycle and ad hoc SQL.

use crate::classify::{Phase, classify, log_messages};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::instrumentation;
use crate::result::ResultSet;
use crate::session::BulkCopySession;
use crate::state::ConnectionState;
use crate::table::TableName;
use crate::transport::{Connector, Transport, TransportError};

/// A connection to a TDS server.
///
/// The connection exclusively owns its transport. Bulk-copy sessions borrow
/// the connection mutably, so only one session can be open at a time, no
/// SQL can be interleaved with it, and a session can never outlive its
/// connection.
///
/// A fatal error (transport failure, severity 20+ server error) poisons the
/// connection: the transport is released and every later operation fails
/// with [`Error::NotConnected`]. Statement-level errors leave the
/// connection usable.
pub struct Connection<T: Transport> {
    transport: Option<T>,
    config: Config,
    state: ConnectionState,
}

impl<T: Transport> Connection<T> {
    /// Open a transport through `connector` and apply the session options.
    ///
    /// After login the connection issues `SET TEXTSIZE` with the configured
    /// text size and `SET QUOTED_IDENTIFIER ON`. Any failure, including one
    /// of those statements, is reported as [`Error::ConnectionFailed`].
    pub fn connect<C>(connector: &C, config: Config) -> Result<Self>
    where
        C: Connector<Transport = T>,
    {
        config.validate()?;

        let span = instrumentation::connect_span(&config);
        let _guard = span.enter();

        tracing::debug!(
            host = %config.host,
            port = config.port,
            user = config.credentials.username(),
            "opening transport"
        );
        let transport = connector
            .open(&config)
            .map_err(|e| classify(e, Phase::Connect))?;

        let mut conn = Self {
            transport: Some(transport),
            config,
            state: ConnectionState::Connected,
        };

        let session_options = [
            format!("SET TEXTSIZE {}", conn.config.text_size),
            "SET QUOTED_IDENTIFIER ON".to_string(),
        ];
        for sql in &session_options {
            let transport = conn.transport_mut()?;
            let output = transport
                .execute(sql)
                .map_err(|e| classify(e, Phase::Connect))?;
            log_messages(&output.messages);
        }

        tracing::debug!("connection ready");
        Ok(conn)
    }

    /// Execute SQL outside the bulk-copy path.
    ///
    /// Returns every result set the statement produced. With
    /// `print_results` each set is also written to stdout in the
    /// [`ResultSet`] display format.
    ///
    /// A server error at severity 11-19 is returned as
    /// [`Error::Statement`] and the connection stays usable.
    pub fn simple_query(&mut self, sql: &str, print_results: bool) -> Result<Vec<ResultSet>> {
        let span = instrumentation::query_span(sql);
        let _guard = span.enter();

        tracing::debug!("executing query");
        let output = self.run(Phase::Query, |t| t.execute(sql))?;
        log_messages(&output.messages);

        if print_results {
            for result_set in output.result_sets.iter().filter(|rs| !rs.columns().is_empty()) {
                print!("{result_set}");
            }
        }

        Ok(output.result_sets)
    }

    /// Start a bulk-copy session into `table`.
    ///
    /// `table` may be qualified as `database.owner.table`; see
    /// [`TableName::parse`]. The session binds the table's columns before
    /// it is returned. Call [`BulkCopySession::done`] when finished; a
    /// session dropped without it is finalized on drop.
    pub fn init(&mut self, table: &str) -> Result<BulkCopySession<'_, T>> {
        let table = TableName::parse(table)?;
        if !self.state.is_usable() {
            return Err(Error::NotConnected);
        }
        BulkCopySession::bind(self, table)
    }

    /// Run a bulk-copy session scoped to a closure.
    ///
    /// `done()` runs on every exit path, including when the closure fails.
    /// Returns the closure's output and the total row count. If both the
    /// closure and `done()` fail, the closure's error is returned.
    pub fn bulk_copy<F, R>(&mut self, table: &str, f: F) -> Result<(R, u64)>
    where
        F: FnOnce(&mut BulkCopySession<'_, T>) -> Result<R>,
    {
        let mut session = self.init(table)?;
        let outcome = f(&mut session);
        let done = session.done();

        match (outcome, done) {
            (Ok(value), Ok(total)) => Ok((value, total)),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(done_err)) => {
                tracing::warn!(error = %done_err, "finalizing after a failed bulk copy also failed");
                Err(e)
            }
        }
    }

    /// Release the transport.
    ///
    /// Later operations fail with [`Error::NotConnected`]. Calling this
    /// more than once is harmless.
    pub fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            tracing::debug!("closing transport");
            transport.close();
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Check if the connection can run operations.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.is_usable()
    }

    /// Get the connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn transport_mut(&mut self) -> Result<&mut T> {
        if !self.state.is_usable() {
            return Err(Error::NotConnected);
        }
        self.transport.as_mut().ok_or(Error::NotConnected)
    }

    /// Run one transport primitive, classifying its failure.
    pub(crate) fn run<R>(
        &mut self,
        phase: Phase<'_>,
        f: impl FnOnce(&mut T) -> std::result::Result<R, TransportError>,
    ) -> Result<R> {
        let transport = self.transport_mut()?;
        match f(transport) {
            Ok(value) => Ok(value),
            Err(e) => {
                let err = classify(e, phase);
                if err.is_fatal() {
                    self.poison(&err);
                }
                Err(err)
            }
        }
    }

    fn poison(&mut self, err: &Error) {
        tracing::warn!(error = %err, "connection is no longer usable");
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.state = ConnectionState::Poisoned;
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}

impl<T: Transport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("database", &self.config.database)
            .field("state", &self.state)
            .finish()
    }
}
