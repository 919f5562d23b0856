//! Tabular query results.

use bcp_types::Value;

/// One result set: column names and rows of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Create a result set with the given column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    /// Get the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get the rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Get the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result set has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a value by row index and column name.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))?;
        self.rows.get(row)?.get(index)
    }
}

/// Renders the set as comma-separated lines: a `row,<columns>` header,
/// then one line per row numbered from 0, with values quoted and NULL
/// written as `null`.
impl std::fmt::Display for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("row")?;
        for column in &self.columns {
            write!(f, ",{column}")?;
        }
        writeln!(f)?;

        for (n, row) in self.rows.iter().enumerate() {
            write!(f, "{n}")?;
            for value in row {
                match value {
                    Value::Null => f.write_str(",null")?,
                    other => write!(f, ",\"{other}\"")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_layout() {
        let mut rs = ResultSet::new(["name", "age", "xmldata"]);
        rs.push_row(vec![Value::from("me"), Value::Float(2.0), Value::Null]);
        rs.push_row(vec![Value::from("you"), Value::Float(1.5), Value::from("")]);
        assert_eq!(
            rs.to_string(),
            "row,name,age,xmldata\n0,\"me\",\"2\",null\n1,\"you\",\"1.5\",\"\"\n"
        );
    }

    #[test]
    fn test_get_by_name() {
        let mut rs = ResultSet::new(["name"]);
        rs.push_row(vec![Value::from("me")]);
        assert_eq!(rs.get(0, "NAME"), Some(&Value::from("me")));
        assert_eq!(rs.get(1, "name"), None);
        assert_eq!(rs.get(0, "age"), None);
        assert_eq!(rs.len(), 1);
    }
}
