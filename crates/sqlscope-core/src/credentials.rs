//! Connection credentials.

use std::fmt;

/// Structured connection parameters, rendered to a driver connection string
/// on demand.
///
/// Immutable value object: construct with the three required fields, adjust
/// host and port with the builder setters. No field is validated here; blank
/// values reach the driver verbatim and the driver rejects them.
///
/// # Example
///
/// ```
/// use sqlscope_core::Credentials;
///
/// let creds = Credentials::new("app", "secret", "inventory").hostname("db01");
/// assert_eq!(
///     creds.render(),
///     "dbname=inventory user=app password=secret host=db01 port=5432"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
    database: String,
    hostname: String,
    port: u16,
}

impl Credentials {
    /// Create credentials for `database` as `username`, connecting to
    /// `localhost:5432` unless overridden.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            database: database.into(),
            hostname: "localhost".to_string(),
            port: 5432,
        }
    }

    /// Set the host to connect to.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the port to connect to.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Render the driver connection string.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dbname={} user={} password={} host={} port={}",
            self.database, self.username, self.password, self.hostname, self.port
        )
    }
}
