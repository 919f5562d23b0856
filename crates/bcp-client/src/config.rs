//! Connection and bulk-copy configuration.

use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Duration;

use bcp_types::{CoercionOptions, DEFAULT_TEXT_SIZE};

use crate::error::Error;
use crate::options::BulkOptions;

/// Login credentials.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    username: Cow<'static, str>,
    password: Cow<'static, str>,
}

impl Credentials {
    /// Create credentials for server authentication.
    pub fn new(
        username: impl Into<Cow<'static, str>>,
        password: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Get the login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Configuration for a connection and the bulk-copy sessions it creates.
///
/// This struct is marked `#[non_exhaustive]` so new fields can be added
/// without breaking semver. Use [`Config::default()`] or
/// [`Config::from_connection_string()`] to construct instances.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Server name, as resolved by the transport (host name, address or
    /// interfaces-file entry).
    pub host: String,

    /// Server port (default: 1433).
    pub port: u16,

    /// Database to use after login.
    pub database: Option<String>,

    /// Login credentials.
    pub credentials: Credentials,

    /// Rows per automatic batch commit; 0 commits once, at `done()`.
    pub batch_size: u64,

    /// Largest variable-length value the session accepts, in bytes
    /// (default: 16 MiB). Sent to the server as `SET TEXTSIZE`.
    pub text_size: u32,

    /// Application name reported at login.
    pub application_name: String,

    /// Login timeout, handed to the transport.
    pub login_timeout: Option<Duration>,

    /// Command timeout, handed to the transport.
    pub command_timeout: Option<Duration>,

    /// Interfaces file used to resolve server names.
    pub interfaces_file: Option<PathBuf>,

    /// File the transport writes a protocol dump to.
    pub dump_file: Option<PathBuf>,

    /// Bulk-copy hints for new sessions.
    pub bulk: BulkOptions,

    /// Value coercion options for new sessions.
    pub coercion: CoercionOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1433,
            database: None,
            credentials: Credentials::default(),
            batch_size: 0,
            text_size: DEFAULT_TEXT_SIZE,
            application_name: "bcp-client".to_string(),
            login_timeout: None,
            command_timeout: None,
            interfaces_file: None,
            dump_file: None,
            bulk: BulkOptions::default(),
            coercion: CoercionOptions::default(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes") || value == "1" {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") || value.eq_ignore_ascii_case("no") || value == "0"
    {
        Ok(false)
    } else {
        Err(Error::Config(format!("invalid boolean for {key}: {value}")))
    }
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N, Error> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("invalid {key}: {value}")))
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a connection string into configuration.
    ///
    /// Supports ADO.NET-style connection strings:
    /// ```text
    /// Server=dbhost;Database=mydb;User Id=sa;Password=secret;Batch Size=1000;
    /// ```
    pub fn from_connection_string(conn_str: &str) -> Result<Self, Error> {
        let mut config = Self::default();

        for part in conn_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("invalid key-value: {part}")))?;

            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "server" | "data source" | "host" => {
                    // Handle host,port format
                    if let Some((host, port)) = value.split_once(',') {
                        config.host = host.trim().to_string();
                        config.port = parse_number("port", port.trim())?;
                    } else {
                        config.host = value.to_string();
                    }
                }
                "port" => config.port = parse_number("port", value)?,
                "database" | "initial catalog" => {
                    config.database = Some(value.to_string());
                }
                "user id" | "uid" | "user" | "username" => {
                    config.credentials =
                        Credentials::new(value.to_string(), config.credentials.password.clone());
                }
                "password" | "pwd" => {
                    config.credentials =
                        Credentials::new(config.credentials.username.clone(), value.to_string());
                }
                "batch size" | "batchsize" => {
                    config.batch_size = parse_number("batch size", value)?;
                }
                "text size" | "textsize" => {
                    config.text_size = parse_number("text size", value)?;
                }
                "application name" | "app" => {
                    config.application_name = value.to_string();
                }
                "login timeout" | "connect timeout" | "connection timeout" => {
                    let secs: u64 = parse_number("timeout", value)?;
                    config.login_timeout = Some(Duration::from_secs(secs));
                }
                "command timeout" => {
                    let secs: u64 = parse_number("timeout", value)?;
                    config.command_timeout = Some(Duration::from_secs(secs));
                }
                "interfaces" | "interfaces file" => {
                    config.interfaces_file = Some(PathBuf::from(value));
                }
                "dump file" => config.dump_file = Some(PathBuf::from(value)),
                "table lock" => config.bulk.table_lock = parse_bool(&key, value)?,
                "fire triggers" => config.bulk.fire_triggers = parse_bool(&key, value)?,
                "check constraints" => {
                    config.bulk.check_constraints = parse_bool(&key, value)?;
                }
                "keep nulls" => config.bulk.keep_nulls = parse_bool(&key, value)?,
                _ => {
                    // Ignore unknown options for forward compatibility
                    tracing::debug!(
                        key = key,
                        "ignoring unknown connection string option"
                    );
                }
            }
        }

        Ok(config)
    }

    /// Check the configuration for values no connection can use.
    pub fn validate(&self) -> Result<(), Error> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("server name cannot be empty".into()));
        }
        if self.text_size == 0 {
            return Err(Error::Config("text size must be positive".into()));
        }
        Ok(())
    }

    /// Set the server host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the database.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the rows per automatic batch commit (0 = single final commit).
    #[must_use]
    pub fn batch_size(mut self, rows: u64) -> Self {
        self.batch_size = rows;
        self
    }

    /// Set the largest accepted variable-length value in bytes.
    #[must_use]
    pub fn text_size(mut self, bytes: u32) -> Self {
        self.text_size = bytes;
        self
    }

    /// Set the application name.
    #[must_use]
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Set the login timeout.
    #[must_use]
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = Some(timeout);
        self
    }

    /// Set the command timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Set the interfaces file used to resolve server names.
    #[must_use]
    pub fn interfaces_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.interfaces_file = Some(path.into());
        self
    }

    /// Set the protocol dump file.
    #[must_use]
    pub fn dump_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_file = Some(path.into());
        self
    }

    /// Set the bulk-copy hints.
    #[must_use]
    pub fn bulk_options(mut self, options: BulkOptions) -> Self {
        self.bulk = options;
        self
    }

    /// Accept floats without a fractional part in integer columns.
    #[must_use]
    pub fn integral_floats(mut self, enabled: bool) -> Self {
        self.coercion.integral_floats = enabled;
        self
    }

    /// Get the coercion options sessions use, with the configured text size.
    #[must_use]
    pub fn coercion_options(&self) -> CoercionOptions {
        CoercionOptions {
            text_size: self.text_size,
            ..self.coercion
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 1433);
        assert_eq!(config.batch_size, 0);
        assert_eq!(config.text_size, 16_777_216);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("sa", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("sa"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_coercion_options_use_text_size() {
        let config = Config::new().text_size(1024).integral_floats(true);
        let options = config.coercion_options();
        assert_eq!(options.text_size, 1024);
        assert!(options.integral_floats);
    }
}
