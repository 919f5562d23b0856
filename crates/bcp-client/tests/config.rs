//! Connection string parsing and builder tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::time::Duration;

use bcp_client::{BulkOptions, Config, Credentials, ErrorKind};

// ============================================================================
// Basic Parsing Tests
// ============================================================================

#[test]
fn test_empty_connection_string() {
    let config = Config::from_connection_string("").unwrap();
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 1433);
    assert_eq!(config.batch_size, 0);
    assert_eq!(config.text_size, bcp_types::DEFAULT_TEXT_SIZE);
}

#[test]
fn test_separators_only() {
    assert!(Config::from_connection_string(";;;").is_ok());
    assert!(Config::from_connection_string("   \t\n  ").is_ok());
}

#[test]
fn test_full_connection_string() {
    let config = Config::from_connection_string(
        "Server=dbhost,1444;Database=tempdb;User Id=sa;Password=secret;\
         Batch Size=16;Text Size=33554432;Application Name=loader;",
    )
    .unwrap();

    assert_eq!(config.host, "dbhost");
    assert_eq!(config.port, 1444);
    assert_eq!(config.database.as_deref(), Some("tempdb"));
    assert_eq!(config.credentials.username(), "sa");
    assert_eq!(config.credentials.password(), "secret");
    assert_eq!(config.batch_size, 16);
    assert_eq!(config.text_size, 33_554_432);
    assert_eq!(config.application_name, "loader");
}

#[test]
fn test_key_aliases_and_case() {
    let config = Config::from_connection_string(
        "DATA SOURCE=h;initial catalog=db;UID=u;PWD=p;batchsize=5;Connect Timeout=30",
    )
    .unwrap();

    assert_eq!(config.host, "h");
    assert_eq!(config.database.as_deref(), Some("db"));
    assert_eq!(config.credentials, Credentials::new("u", "p"));
    assert_eq!(config.batch_size, 5);
    assert_eq!(config.login_timeout, Some(Duration::from_secs(30)));
}

#[test]
fn test_password_order_independent() {
    let a = Config::from_connection_string("Password=p;User=u").unwrap();
    let b = Config::from_connection_string("User=u;Password=p").unwrap();
    assert_eq!(a.credentials, b.credentials);
}

#[test]
fn test_values_are_trimmed() {
    let config = Config::from_connection_string("  Server =  dbhost  ; Port = 2000 ").unwrap();
    assert_eq!(config.host, "dbhost");
    assert_eq!(config.port, 2000);
}

#[test]
fn test_paths() {
    let config =
        Config::from_connection_string("Interfaces=/etc/freetds/interfaces;Dump File=/tmp/tds.log")
            .unwrap();
    assert_eq!(
        config.interfaces_file,
        Some(PathBuf::from("/etc/freetds/interfaces"))
    );
    assert_eq!(config.dump_file, Some(PathBuf::from("/tmp/tds.log")));
}

// ============================================================================
// Bulk-copy hints
// ============================================================================

#[test]
fn test_bulk_hints_from_connection_string() {
    let config = Config::from_connection_string(
        "Table Lock=yes;Fire Triggers=true;Check Constraints=0;Keep Nulls=no",
    )
    .unwrap();

    assert!(config.bulk.table_lock);
    assert!(config.bulk.fire_triggers);
    assert!(!config.bulk.check_constraints);
    assert!(!config.bulk.keep_nulls);
}

#[test]
fn test_default_bulk_hints() {
    let config = Config::new();
    assert_eq!(config.bulk, BulkOptions::default());
    assert!(config.bulk.check_constraints);
    assert!(config.bulk.keep_nulls);
    assert!(!config.bulk.table_lock);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_equals() {
    let err = Config::from_connection_string("Server").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_invalid_numbers() {
    for conn_str in [
        "Port=abc",
        "Port=70000",
        "Server=h,xyz",
        "Batch Size=-1",
        "Text Size=big",
        "Login Timeout=soon",
    ] {
        let err = Config::from_connection_string(conn_str).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config, "{conn_str}");
    }
}

#[test]
fn test_invalid_boolean() {
    let err = Config::from_connection_string("Table Lock=maybe").unwrap_err();
    assert!(err.to_string().contains("maybe"));
}

#[test]
fn test_unknown_keys_ignored() {
    let config = Config::from_connection_string("Server=h;Encrypt=true;Foo=bar").unwrap();
    assert_eq!(config.host, "h");
}

#[test]
fn test_validate() {
    assert!(Config::new().validate().is_ok());
    assert!(Config::new().host("  ").validate().is_err());
    assert!(Config::new().text_size(0).validate().is_err());
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn test_builder() {
    let config = Config::new()
        .host("dbhost")
        .port(1500)
        .database("tempdb")
        .credentials(Credentials::new("sa", "secret"))
        .batch_size(16)
        .text_size(1024)
        .application_name("loader")
        .command_timeout(Duration::from_secs(5))
        .integral_floats(true);

    assert_eq!(config.host, "dbhost");
    assert_eq!(config.port, 1500);
    assert_eq!(config.command_timeout, Some(Duration::from_secs(5)));

    let coercion = config.coercion_options();
    assert_eq!(coercion.text_size, 1024);
    assert!(coercion.integral_floats);
}

#[test]
fn test_password_not_in_debug() {
    let config = Config::new().credentials(Credentials::new("sa", "hunter2"));
    let debug = format!("{config:?}");
    assert!(debug.contains("sa"));
    assert!(!debug.contains("hunter2"));
}
