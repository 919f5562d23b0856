//! Tracing spans for client operations.
//!
//! Every blocking round trip runs inside one of the spans below, so a
//! subscriber can attribute time to connecting, ad hoc SQL, bulk loads and
//! individual batch commits.
//!
//! ## Attributes
//!
//! - `db.system`: "tds"
//! - `db.name`: Database name
//! - `db.operation`: Statement verb (SELECT, DROP, ...)
//! - `db.statement`: SQL text, truncated
//! - `server.address`, `server.port`

use tracing::Span;

use crate::config::Config;
use crate::table::TableName;

/// Database system identifier.
pub const DB_SYSTEM: &str = "tds";

/// Longest statement text recorded on a span, in characters.
pub const MAX_STATEMENT_LEN: usize = 256;

/// Span names for client operations.
pub mod span_names {
    /// Span name for connection establishment.
    pub const CONNECT: &str = "bcp.connect";
    /// Span name for ad hoc SQL execution.
    pub const SIMPLE_QUERY: &str = "bcp.simple_query";
    /// Span name for a bulk-copy session.
    pub const BULK_COPY: &str = "bcp.bulk_copy";
    /// Span name for one batch commit.
    pub const BATCH_COMMIT: &str = "bcp.batch_commit";
}

/// Span covering connection establishment.
pub fn connect_span(config: &Config) -> Span {
    tracing::info_span!(
        span_names::CONNECT,
        db.system = DB_SYSTEM,
        db.name = config.database.as_deref().unwrap_or(""),
        server.address = %config.host,
        server.port = config.port,
    )
}

/// Span covering one ad hoc SQL batch.
pub fn query_span(sql: &str) -> Span {
    tracing::info_span!(
        span_names::SIMPLE_QUERY,
        db.system = DB_SYSTEM,
        db.operation = extract_operation(sql),
        db.statement = %truncate_statement(sql, MAX_STATEMENT_LEN),
    )
}

/// Span covering a bulk-copy session.
pub fn bulk_copy_span(table: &TableName) -> Span {
    tracing::info_span!(span_names::BULK_COPY, db.system = DB_SYSTEM, table = %table)
}

/// Span covering one batch commit.
pub fn batch_commit_span(batch: u64, rows: u64) -> Span {
    tracing::info_span!(span_names::BATCH_COMMIT, batch = batch, rows = rows)
}

/// Truncate a statement to at most `max_chars` characters.
fn truncate_statement(sql: &str, max_chars: usize) -> String {
    match sql.char_indices().nth(max_chars) {
        None => sql.to_string(),
        Some((end, _)) => format!("{}...", &sql[..end]),
    }
}

/// Extract the operation type from a SQL statement.
#[must_use]
pub fn extract_operation(sql: &str) -> &'static str {
    let sql_upper = sql.trim_start().to_uppercase();
    let verb = sql_upper.split_whitespace().next().unwrap_or("");

    match verb {
        "SELECT" => "SELECT",
        "INSERT" => "INSERT",
        "UPDATE" => "UPDATE",
        "DELETE" => "DELETE",
        "CREATE" => "CREATE",
        "DROP" => "DROP",
        "TRUNCATE" => "TRUNCATE",
        "SET" => "SET",
        "USE" => "USE",
        "EXEC" | "EXECUTE" => "EXECUTE",
        _ => "OTHER",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_operation() {
        assert_eq!(extract_operation("drop table people"), "DROP");
        assert_eq!(extract_operation("  SELECT * FROM t"), "SELECT");
        assert_eq!(extract_operation("set textsize 100"), "SET");
        assert_eq!(extract_operation("SELECTED"), "OTHER");
        assert_eq!(extract_operation(""), "OTHER");
    }

    #[test]
    fn test_truncate_statement() {
        assert_eq!(truncate_statement("hello", 10), "hello");
        assert_eq!(truncate_statement("hello world", 5), "hello...");
        // Multi-byte characters are never split
        assert_eq!(truncate_statement("héllo", 2), "hé...");
    }

    #[test]
    fn test_span_names() {
        assert_eq!(span_names::CONNECT, "bcp.connect");
        assert_eq!(span_names::BATCH_COMMIT, "bcp.batch_commit");
    }
}
