//! Bulk-copy walkthrough.
//!
//! Creates a table, loads five rows of mixed types in batches of 16 and
//! prints the table back. Runs against the in-memory transport from
//! `bcp-testing`, so no server is needed.
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=bcp_client=debug cargo run --example bulk_load
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bcp_client::{Config, Connection, Error};
use bcp_testing::fixtures::{DEMO_BATCH_SIZE, DEMO_TEXT_SIZE, PEOPLE_COLUMNS};
use bcp_testing::{TestFixture, demo_rows};

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let fixture = TestFixture::new("tempdb").with_table("people", PEOPLE_COLUMNS);
    let connector = bcp_testing::MockConnector::builder().build();

    let user = std::env::var("BCP_USER").unwrap_or_else(|_| "sa".into());
    let conn_str = format!(
        "Server=mockhost;Database={};User Id={user};Password=secret;Batch Size={DEMO_BATCH_SIZE};Text Size={DEMO_TEXT_SIZE}",
        fixture.database
    );
    let config = Config::from_connection_string(&conn_str)?;

    let mut conn = Connection::connect(&connector, config)?;
    println!("Connected");

    // The table may not exist yet
    if let Err(e) = conn.simple_query(&fixture.drop_table_sql("people"), false) {
        println!("{e}");
    }
    conn.simple_query(&fixture.create_table_sql("people").expect("fixture table"), false)?;

    let (_, total) = conn.bulk_copy(&fixture.qualified("people"), |session| {
        for row in demo_rows() {
            session.send(&row)?;
        }
        Ok(())
    })?;
    println!("Copied {total} rows");

    conn.simple_query("select * from people", true)?;
    conn.disconnect();
    Ok(())
}
