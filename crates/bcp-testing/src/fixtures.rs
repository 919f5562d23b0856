//! Test fixture utilities.

use bcp_client::Config;
use bcp_types::Value;
use bytes::Bytes;

use crate::mock_transport::{MockConnector, MockTable};

/// Table definition used by the demo load: a name, a nullable float and a
/// nullable XML document.
pub const PEOPLE_COLUMNS: &[(&str, &str)] = &[
    ("name", "varchar(256)"),
    ("age", "float null"),
    ("xml", "xml null"),
];

/// Text size the demo load raises the session limit to.
pub const DEMO_TEXT_SIZE: u32 = 33_554_432;

/// Batch size the demo load commits with.
pub const DEMO_BATCH_SIZE: u64 = 16;

/// Test database fixture for setting up and tearing down test data.
#[derive(Debug, Clone)]
pub struct TestFixture {
    /// Database name.
    pub database: String,
    /// Tables created by this fixture, with their column declarations.
    pub tables: Vec<(String, Vec<(String, String)>)>,
}

impl TestFixture {
    /// Create a new test fixture.
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            tables: Vec::new(),
        }
    }

    /// Add a table to the fixture.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>, columns: &[(&str, &str)]) -> Self {
        let columns = columns
            .iter()
            .map(|(n, d)| ((*n).to_string(), (*d).to_string()))
            .collect();
        self.tables.push((table.into(), columns));
        self
    }

    /// Qualify a table as `database.dbo.table`.
    #[must_use]
    pub fn qualified(&self, table: &str) -> String {
        format!("{}.dbo.{table}", self.database)
    }

    /// Generate SQL to create a fixture table.
    #[must_use]
    pub fn create_table_sql(&self, table: &str) -> Option<String> {
        let (_, columns) = self.tables.iter().find(|(name, _)| name == table)?;
        let cols: Vec<String> = columns.iter().map(|(n, d)| format!("{n} {d}")).collect();
        Some(format!("create table {table} ({})", cols.join(", ")))
    }

    /// Generate SQL to drop a fixture table.
    #[must_use]
    pub fn drop_table_sql(&self, table: &str) -> String {
        format!("drop table {table}")
    }

    /// Build a connector whose catalog already holds the fixture tables.
    #[must_use]
    pub fn connector(&self) -> MockConnector {
        let mut builder = MockConnector::builder().with_database(self.database.clone());
        for (name, columns) in &self.tables {
            let columns: Vec<(&str, &str)> = columns
                .iter()
                .map(|(n, d)| (n.as_str(), d.as_str()))
                .collect();
            match MockTable::new(name.clone(), &columns) {
                Ok(table) => builder = builder.with_table(table),
                Err(e) => tracing::warn!(table = %name, error = %e, "skipping fixture table"),
            }
        }
        builder.build()
    }

    /// Build a configuration pointing at the fixture database.
    #[must_use]
    pub fn config(&self) -> Config {
        Config::new()
            .host("mockhost")
            .database(self.database.clone())
    }
}

/// Encode an XML document the way a UTF-16 client library does: a
/// byte-order mark followed by UTF-16LE code units.
#[must_use]
pub fn utf16_xml(xml: &str) -> Bytes {
    let mut out = Vec::with_capacity(2 + xml.len() * 2);
    out.extend_from_slice(&[0xFF, 0xFE]);
    for unit in xml.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    Bytes::from(out)
}

/// The five rows of the demo load into [`PEOPLE_COLUMNS`].
///
/// Ages mix integers and floats; one age is NULL. The first and last rows
/// carry XML documents, the others an empty string.
#[must_use]
pub fn demo_rows() -> Vec<Vec<Value>> {
    let null_xml = utf16_xml("<?xml version=\"1.0\"?><root/>");
    let doc = utf16_xml("<?xml version=\"1.0\"?><root><who>me</who></root>");

    vec![
        vec![Value::from("me"), Value::from(2), Value::Bytes(null_xml)],
        vec![Value::from("you"), Value::from(1), Value::from("")],
        vec![Value::from("them"), Value::from(12.177), Value::from("")],
        vec![Value::from("us"), Value::from(99.2), Value::from("")],
        vec![Value::from("who"), Value::Null, Value::Bytes(doc)],
    ]
}
