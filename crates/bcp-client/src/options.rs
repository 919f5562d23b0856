//! Bulk-copy hints.
//!
//! These map to the server's bulk load hints and affect locking, logging
//! and constraint checking. They are handed to the transport when the
//! bulk-copy operation begins.

use bcp_types::{ColumnBinding, MAX_WIDTH_MARKER, WireType};

use crate::table::TableName;

/// Options controlling bulk-copy behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOptions {
    /// Check constraints during insert.
    ///
    /// Default: true
    pub check_constraints: bool,

    /// Fire INSERT triggers on the table.
    ///
    /// Default: false (better performance)
    pub fire_triggers: bool,

    /// Keep NULL values instead of using column defaults.
    ///
    /// Default: true
    pub keep_nulls: bool,

    /// Acquire a table-level lock for the duration of the bulk operation.
    ///
    /// Default: false
    pub table_lock: bool,

    /// Order hint for the data being inserted.
    ///
    /// If data is pre-sorted by the clustered index, specify the columns
    /// here to avoid a sort operation on the server.
    /// Default: None
    pub order_hint: Option<Vec<String>>,

    /// Maximum rejected rows allowed before the server aborts.
    ///
    /// Default: 0 (abort on first error)
    pub max_errors: u32,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            check_constraints: true,
            fire_triggers: false,
            keep_nulls: true,
            table_lock: false,
            order_hint: None,
            max_errors: 0,
        }
    }
}

impl BulkOptions {
    /// Apply a single control change.
    pub fn apply(&mut self, control: BulkControl) {
        match control {
            BulkControl::CheckConstraints(v) => self.check_constraints = v,
            BulkControl::FireTriggers(v) => self.fire_triggers = v,
            BulkControl::KeepNulls(v) => self.keep_nulls = v,
            BulkControl::TableLock(v) => self.table_lock = v,
            BulkControl::OrderHint(columns) => {
                self.order_hint = if columns.is_empty() { None } else { Some(columns) };
            }
            BulkControl::MaxErrors(n) => self.max_errors = n,
        }
    }

    /// Render the hints as they appear in a `WITH (...)` clause.
    #[must_use]
    pub fn hints(&self, batch_size: u64) -> Vec<String> {
        let mut hints: Vec<String> = Vec::new();

        if self.check_constraints {
            hints.push("CHECK_CONSTRAINTS".to_string());
        }
        if self.fire_triggers {
            hints.push("FIRE_TRIGGERS".to_string());
        }
        if self.keep_nulls {
            hints.push("KEEP_NULLS".to_string());
        }
        if self.table_lock {
            hints.push("TABLOCK".to_string());
        }
        if batch_size > 0 {
            hints.push(format!("ROWS_PER_BATCH = {batch_size}"));
        }
        if let Some(ref order) = self.order_hint {
            let names: Vec<String> = order.iter().map(|name| quote_name(name)).collect();
            hints.push(format!("ORDER({})", names.join(", ")));
        }
        if self.max_errors > 0 {
            hints.push(format!("MAXERRORS = {}", self.max_errors));
        }

        hints
    }

    /// Build the `INSERT BULK` statement announcing a bulk load.
    #[must_use]
    pub fn insert_bulk_statement(
        &self,
        table: &TableName,
        columns: &[ColumnBinding],
        batch_size: u64,
    ) -> String {
        let mut sql = format!("INSERT BULK {table}");

        if !columns.is_empty() {
            let cols: Vec<String> = columns
                .iter()
                .map(|c| format!("{} {}", quote_name(&c.name), sql_type_name(c)))
                .collect();
            sql.push_str(" (");
            sql.push_str(&cols.join(", "));
            sql.push(')');
        }

        let hints = self.hints(batch_size);
        if !hints.is_empty() {
            sql.push_str(" WITH (");
            sql.push_str(&hints.join(", "));
            sql.push(')');
        }

        sql
    }
}

/// One bulk-copy hint change, applied with
/// [`BulkCopySession::control`](crate::BulkCopySession::control).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkControl {
    /// Check constraints during insert.
    CheckConstraints(bool),
    /// Fire INSERT triggers.
    FireTriggers(bool),
    /// Keep NULLs instead of column defaults.
    KeepNulls(bool),
    /// Take a table-level lock.
    TableLock(bool),
    /// Declare the sort order of the incoming rows; empty clears the hint.
    OrderHint(Vec<String>),
    /// Rejected rows tolerated before aborting.
    MaxErrors(u32),
}

/// Bracket-quote an identifier, doubling any closing bracket.
fn quote_name(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// SQL type declaration for a bound column.
pub(crate) fn sql_type_name(column: &ColumnBinding) -> String {
    let width = column.max_width;
    let sized = |name: &str, units: u32| {
        if width == MAX_WIDTH_MARKER {
            format!("{name}(max)")
        } else {
            format!("{name}({units})")
        }
    };

    match column.wire_type {
        WireType::Int1 => "tinyint".into(),
        WireType::Int2 => "smallint".into(),
        WireType::Int4 => "int".into(),
        WireType::Int8 => "bigint".into(),
        WireType::IntN => match width {
            1 => "tinyint".into(),
            2 => "smallint".into(),
            8 => "bigint".into(),
            _ => "int".into(),
        },
        WireType::Float4 => "real".into(),
        WireType::Float8 => "float".into(),
        WireType::FloatN => {
            if width == 4 {
                "real".into()
            } else {
                "float".into()
            }
        }
        WireType::BigVarChar => sized("varchar", width),
        WireType::BigChar => sized("char", width),
        WireType::NVarChar => sized("nvarchar", width / 2),
        WireType::NChar => sized("nchar", width / 2),
        WireType::BigVarBinary => sized("varbinary", width),
        WireType::BigBinary => sized("binary", width),
        WireType::Xml => "xml".into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hints() {
        let hints = BulkOptions::default().hints(0);
        assert_eq!(hints, vec!["CHECK_CONSTRAINTS", "KEEP_NULLS"]);
    }

    #[test]
    fn test_apply_controls() {
        let mut options = BulkOptions::default();
        options.apply(BulkControl::TableLock(true));
        options.apply(BulkControl::CheckConstraints(false));
        options.apply(BulkControl::OrderHint(vec!["name".into()]));
        options.apply(BulkControl::MaxErrors(5));
        assert_eq!(
            options.hints(100),
            vec![
                "KEEP_NULLS",
                "TABLOCK",
                "ROWS_PER_BATCH = 100",
                "ORDER([name])",
                "MAXERRORS = 5"
            ]
        );

        options.apply(BulkControl::OrderHint(Vec::new()));
        assert_eq!(options.order_hint, None);
    }

    #[test]
    fn test_order_hint_names_are_bracket_quoted() {
        let mut options = BulkOptions::default();
        options.apply(BulkControl::OrderHint(vec![
            "id".into(),
            "odd]col".into(),
            "x) DESC; drop table t --".into(),
        ]));
        let hints = options.hints(0);
        assert_eq!(
            hints.last().unwrap(),
            "ORDER([id], [odd]]col], [x) DESC; drop table t --])"
        );
    }

    #[test]
    fn test_insert_bulk_statement() {
        let table = TableName::parse("tempdb.dbo.people").unwrap();
        let columns = vec![
            ColumnBinding::new(1, "name", WireType::BigVarChar, 256),
            ColumnBinding::new(2, "age", WireType::FloatN, 8),
            ColumnBinding::new(3, "nick", WireType::NVarChar, 40),
            ColumnBinding::new(4, "xmldata", WireType::Xml, MAX_WIDTH_MARKER),
        ];
        let sql = BulkOptions::default().insert_bulk_statement(&table, &columns, 0);
        assert_eq!(
            sql,
            "INSERT BULK [tempdb].[dbo].[people] ([name] varchar(256), [age] float, \
             [nick] nvarchar(20), [xmldata] xml) WITH (CHECK_CONSTRAINTS, KEEP_NULLS)"
        );
    }
}
