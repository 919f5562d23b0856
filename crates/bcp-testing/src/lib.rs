//! # bcp-testing
//!
//! Test infrastructure for bulk-copy client development.
//!
//! This crate provides an in-memory transport that stands in for a TDS
//! server, so the client's lifecycle, batching and error classification can
//! be tested without a database.
//!
//! ## Features
//!
//! - Mock transport with a small SQL subset and a table catalog
//! - Row framing and decoding through the real wire encoders
//! - Operation journal for counting batches and finalizations
//! - Failure injection at every transport primitive
//! - Test fixture utilities
//!
//! ## Example
//!
//! ```rust,ignore
//! use bcp_client::{Config, Connection, Value};
//! use bcp_testing::{MockConnector, MockTable};
//!
//! let connector = MockConnector::builder()
//!     .with_table(MockTable::new("people", &[("name", "varchar(256)")])?)
//!     .build();
//!
//! let mut conn = Connection::connect(&connector, Config::new().batch_size(2))?;
//! let (_, total) = conn.bulk_copy("people", |s| {
//!     for name in ["a", "b", "c"] {
//!         s.send(&[Value::from(name)])?;
//!     }
//!     Ok(())
//! })?;
//!
//! assert_eq!(total, 3);
//! assert_eq!(connector.commits(), vec![2]);
//! assert_eq!(connector.finalize_count(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod fixtures;
pub mod mock_transport;

pub use fixtures::{TestFixture, demo_rows, utf16_xml};
pub use mock_transport::{
    FailurePoint, MockConnector, MockConnectorBuilder, MockFailure, MockResponse, MockTable,
    MockTransport, Operation,
};
