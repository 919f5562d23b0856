//! Bulk-copy sessions.
//!
//! A session binds a destination table, streams rows into it and commits
//! them in batches:
//!
//! ```rust,ignore
//! let mut session = conn.init("tempdb.dbo.people")?;
//! for row in rows {
//!     session.send(&row)?;
//! }
//! let total = session.done()?;
//! ```
//!
//! ## Batching
//!
//! With a batch size `B > 0`, every `B` appended rows are committed as one
//! batch. `done()` commits the remaining `1..B-1` rows, if any, and ends the
//! bulk-copy operation. With `B = 0` nothing is committed before `done()`,
//! which commits every row at once.
//!
//! A batch boundary is the smallest unit that can be safely abandoned: if a
//! commit fails, the rows of that batch are discarded and counted by
//! [`BulkCopySession::rows_lost`], and the error is returned. The total from
//! `done()` is always the number of `send()` calls that returned `Ok`.

use bcp_types::{ColumnBinding, TypeCoercer, Value};
use tracing::Span;

use crate::batch::BatchController;
use crate::classify::Phase;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::instrumentation;
use crate::options::{BulkControl, BulkOptions};
use crate::row::RowEncoder;
use crate::state::SessionState;
use crate::table::TableName;
use crate::transport::Transport;

/// An open bulk-copy operation into one table.
///
/// Created by [`Connection::init`]. Borrows the connection for its whole
/// lifetime.
pub struct BulkCopySession<'c, T: Transport> {
    conn: &'c mut Connection<T>,
    table: TableName,
    encoder: RowEncoder,
    batch: BatchController,
    options: BulkOptions,
    rows_sent: u64,
    rows_lost: u64,
    state: SessionState,
    span: Span,
}

impl<'c, T: Transport> BulkCopySession<'c, T> {
    /// Resolve the table's columns and return a bound session.
    pub(crate) fn bind(conn: &'c mut Connection<T>, table: TableName) -> Result<Self> {
        let config = conn.config();
        let batch = BatchController::new(config.batch_size);
        let options = config.bulk.clone();
        let coercer = TypeCoercer::new(config.coercion_options());

        let mut session = Self {
            conn,
            span: instrumentation::bulk_copy_span(&table),
            table,
            encoder: RowEncoder::new(Vec::new(), coercer),
            batch,
            options,
            rows_sent: 0,
            rows_lost: 0,
            state: SessionState::Uninitialized,
        };
        session.resolve_columns(coercer)?;
        Ok(session)
    }

    fn resolve_columns(&mut self, coercer: TypeCoercer) -> Result<()> {
        let _guard = self.span.clone().entered();

        let table = &self.table;
        let metadata = self
            .conn
            .run(Phase::Describe(table), |t| t.describe_columns(table))?;
        if metadata.is_empty() {
            return Err(Error::UnknownTable(self.table.to_string()));
        }

        let columns = metadata
            .iter()
            .enumerate()
            .map(|(i, meta)| {
                let ordinal = column_ordinal(i, &meta.name)?;
                ColumnBinding::from_metadata(ordinal, meta).map_err(|source| {
                    Error::UnsupportedColumn {
                        column: meta.name.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            columns = columns.len(),
            batch_size = self.batch.batch_size(),
            "bulk-copy session bound"
        );
        self.encoder = RowEncoder::new(columns, coercer);
        self.state = SessionState::Bound;
        Ok(())
    }

    /// Send one row.
    ///
    /// The row must have one value per column. If any value cannot be
    /// coerced, nothing is sent, the counters are unchanged and the error
    /// lists every failing column; the session stays usable.
    pub fn send(&mut self, row: &[Value]) -> Result<()> {
        if !self.state.accepts_rows() {
            return Err(Error::SessionClosed);
        }
        let _guard = self.span.clone().entered();

        let bound = self.encoder.encode(row)?;

        if self.state == SessionState::Bound {
            let (table, columns, options) = (&self.table, self.encoder.columns(), &self.options);
            let batch_size = self.batch.batch_size();
            self.conn.run(Phase::Bulk, |t| {
                tracing::debug!(
                    statement = %options.insert_bulk_statement(table, columns, batch_size),
                    "starting bulk load"
                );
                t.begin_bulk(table, columns, options)
            })?;
            self.state = SessionState::Sending;
        }

        self.conn.run(Phase::Bulk, |t| t.append_row(&bound))?;
        self.rows_sent += 1;
        tracing::trace!(row = self.rows_sent, "row appended");

        if self.batch.record_row() {
            if let Err(e) = self.commit_pending() {
                // This send fails, so its row leaves the total with the batch
                self.rows_sent -= 1;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Commit the rows sent since the last commit.
    ///
    /// Returns the number of rows committed (0 if none were pending).
    pub fn commit(&mut self) -> Result<u64> {
        match self.state {
            SessionState::Finalized | SessionState::Uninitialized => Err(Error::SessionClosed),
            SessionState::Bound => Ok(0),
            SessionState::Sending if self.batch.pending() == 0 => Ok(0),
            SessionState::Sending => {
                let _guard = self.span.clone().entered();
                self.commit_pending()
            }
        }
    }

    /// Finalize the session and return the total rows sent.
    ///
    /// Commits any pending partial batch, then ends the bulk-copy
    /// operation. The session is finalized even if this fails; a second
    /// call returns [`Error::SessionClosed`].
    pub fn done(&mut self) -> Result<u64> {
        let previous = std::mem::replace(&mut self.state, SessionState::Finalized);
        let _guard = self.span.clone().entered();

        match previous {
            SessionState::Finalized => return Err(Error::SessionClosed),
            SessionState::Uninitialized | SessionState::Bound => {
                tracing::info!(rows = 0, "bulk copy complete");
                return Ok(0);
            }
            SessionState::Sending => {}
        }

        let commit = if self.batch.pending() > 0 {
            self.commit_pending().map(|_| ())
        } else {
            Ok(())
        };
        // Finalize even after a failed commit to release the server-side operation
        let finalize = self.conn.run(Phase::Bulk, |t| t.finalize());

        commit?;
        finalize?;

        tracing::info!(
            rows = self.rows_sent,
            batches = self.batch.batches_committed(),
            "bulk copy complete"
        );
        Ok(self.rows_sent)
    }

    /// Change a bulk-copy hint.
    ///
    /// Hints are sent when the first row is, so they can only change while
    /// the session is bound and no row has been sent.
    pub fn control(&mut self, control: BulkControl) -> Result<()> {
        match self.state {
            SessionState::Bound => {
                tracing::debug!(?control, "bulk-copy hint changed");
                self.options.apply(control);
                Ok(())
            }
            SessionState::Sending => Err(Error::Config(
                "bulk-copy hints must be set before the first row".into(),
            )),
            SessionState::Uninitialized | SessionState::Finalized => Err(Error::SessionClosed),
        }
    }

    /// Change the rows per automatic commit (0 = commit only at `done()`).
    pub fn set_batch_size(&mut self, rows: u64) {
        self.batch.set_batch_size(rows);
    }

    /// Get the number of `send()` calls that returned `Ok`.
    #[must_use]
    pub fn rows_sent(&self) -> u64 {
        self.rows_sent
    }

    /// Get the rows discarded by failed batch commits.
    ///
    /// Includes rows from `send()` calls that already returned `Ok`.
    #[must_use]
    pub fn rows_lost(&self) -> u64 {
        self.rows_lost
    }

    /// Get the rows sent since the last commit.
    #[must_use]
    pub fn rows_pending(&self) -> u64 {
        self.batch.pending()
    }

    /// Get the number of committed batches.
    #[must_use]
    pub fn batches_committed(&self) -> u64 {
        self.batch.batches_committed()
    }

    /// Get the rows per automatic commit.
    #[must_use]
    pub fn batch_size(&self) -> u64 {
        self.batch.batch_size()
    }

    /// Get the session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the bound columns, in table order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnBinding] {
        self.encoder.columns()
    }

    /// Get the destination table.
    #[must_use]
    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Get the current bulk-copy hints.
    #[must_use]
    pub fn options(&self) -> &BulkOptions {
        &self.options
    }

    fn commit_pending(&mut self) -> Result<u64> {
        let pending = self.batch.pending();
        let span = instrumentation::batch_commit_span(self.batch.batches_committed() + 1, pending);
        let _guard = span.enter();

        match self.conn.run(Phase::Bulk, |t| t.commit_batch()) {
            Ok(reported) => {
                if reported != pending {
                    tracing::debug!(reported, pending, "transport reported a different batch size");
                }
                self.batch.record_commit();
                tracing::info!(rows = pending, total = self.rows_sent, "batch committed");
                Ok(pending)
            }
            Err(e) => {
                let lost = self.batch.discard_pending();
                self.rows_lost += lost;
                tracing::warn!(lost, error = %e, "batch commit failed");
                Err(e)
            }
        }
    }
}

/// Map a zero-based column index to its one-based wire ordinal.
fn column_ordinal(index: usize, name: &str) -> Result<u16> {
    index
        .checked_add(1)
        .and_then(|ordinal| u16::try_from(ordinal).ok())
        .ok_or_else(|| {
            tracing::debug!(column = name, index, "column ordinal out of range");
            Error::TooManyColumns(index.saturating_add(1))
        })
}

impl<T: Transport> Drop for BulkCopySession<'_, T> {
    fn drop(&mut self) {
        if self.state.is_streaming() {
            tracing::warn!(table = %self.table, "bulk-copy session dropped without done(); finalizing");
            if let Err(e) = self.done() {
                tracing::warn!(error = %e, "finalizing dropped bulk-copy session failed");
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for BulkCopySession<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkCopySession")
            .field("table", &self.table)
            .field("state", &self.state)
            .field("rows_sent", &self.rows_sent)
            .field("rows_lost", &self.rows_lost)
            .field("rows_pending", &self.batch.pending())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_column_ordinal_is_one_based() {
        assert_eq!(column_ordinal(0, "a").unwrap(), 1);
        assert_eq!(column_ordinal(65_534, "last").unwrap(), u16::MAX);
    }

    #[test]
    fn test_column_ordinal_rejects_overflow() {
        let err = column_ordinal(65_535, "extra").unwrap_err();
        assert!(matches!(err, Error::TooManyColumns(65_536)));
        assert_eq!(err.kind(), ErrorKind::StatementError);
        assert!(column_ordinal(usize::MAX, "extra").is_err());
    }
}
