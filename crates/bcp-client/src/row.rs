//! Row binding.

use bcp_types::{BoundColumn, ColumnBinding, TypeCoercer, Value};

use crate::error::{ColumnError, Error, Result};

/// Binds application rows against a fixed column list.
#[derive(Debug, Clone)]
pub struct RowEncoder {
    columns: Vec<ColumnBinding>,
    coercer: TypeCoercer,
}

impl RowEncoder {
    /// Create an encoder for the given columns.
    #[must_use]
    pub fn new(columns: Vec<ColumnBinding>, coercer: TypeCoercer) -> Self {
        Self { columns, coercer }
    }

    /// Get the bound columns.
    #[must_use]
    pub fn columns(&self) -> &[ColumnBinding] {
        &self.columns
    }

    /// Coerce every value of `row` into its column's wire form.
    ///
    /// All columns are attempted; if any fail, the error lists every failing
    /// column and no bound row is produced.
    pub fn encode(&self, row: &[Value]) -> Result<Vec<BoundColumn>> {
        if row.len() != self.columns.len() {
            return Err(Error::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }

        let mut bound = Vec::with_capacity(row.len());
        let mut failures = Vec::new();

        for (value, column) in row.iter().zip(&self.columns) {
            match self.coercer.coerce(value, column) {
                Ok(v) => bound.push(BoundColumn::new(column.ordinal, v)),
                Err(source) => failures.push(ColumnError {
                    ordinal: column.ordinal,
                    column: column.name.clone(),
                    source,
                }),
            }
        }

        if failures.is_empty() {
            Ok(bound)
        } else {
            Err(Error::InvalidRow(failures))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use bcp_types::{BoundValue, MAX_WIDTH_MARKER, WireType};

    fn encoder() -> RowEncoder {
        RowEncoder::new(
            vec![
                ColumnBinding::new(1, "name", WireType::BigVarChar, 4),
                ColumnBinding::new(2, "age", WireType::FloatN, 8),
                ColumnBinding::new(3, "xmldata", WireType::Xml, MAX_WIDTH_MARKER),
            ],
            TypeCoercer::default(),
        )
    }

    #[test]
    fn test_encode_row() {
        let row = encoder()
            .encode(&[Value::from("me"), Value::Int(2), Value::Null])
            .unwrap();
        assert_eq!(row.len(), 3);
        assert_eq!(row[0].ordinal, 1);
        assert_eq!(row[2].value, BoundValue::Null);
    }

    #[test]
    fn test_arity_mismatch() {
        let err = encoder().encode(&[Value::from("me")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ColumnCountMismatch);
    }

    #[test]
    fn test_failures_are_aggregated() {
        let err = encoder()
            .encode(&[Value::from("toolong"), Value::from(vec![1u8]), Value::Null])
            .unwrap_err();
        let failures = err.column_errors();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].column, "name");
        assert_eq!(failures[1].ordinal, 2);
        assert_eq!(err.kind(), ErrorKind::ValueTooLarge);
    }
}
