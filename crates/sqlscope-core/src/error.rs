//! Error types for sqlscope operations.

use std::fmt;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type for all sqlscope operations.
///
/// Driver failures travel through unchanged: the message, the offending SQL,
/// and the driver's native result code ride along. Re-entry violations
/// (opening a second transaction on a session that already has one) are not
/// represented here; those are programmer faults and panic.
#[derive(Debug)]
pub enum Error {
    /// Configuration errors (no connection source, invalid mock pattern)
    Config(ConfigError),
    /// Connection-level errors (open, close, connection already closed)
    Connection(ConnectionError),
    /// Statement-level errors (prepare, bind, execute, fetch)
    Query(QueryError),
    /// Value conversion errors
    Type(TypeError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<BoxedSource>,
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<BoxedSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish the connection
    Open,
    /// Operation attempted on a closed connection
    Closed,
    /// Failed to close the connection
    Close,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
    /// Driver-native result code, when the driver has one.
    pub code: Option<i32>,
    pub source: Option<BoxedSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Statement failed to compile
    Prepare,
    /// Parameter binding failed
    Bind,
    /// Statement execution failed
    Execute,
    /// Row fetch failed (including fetch before any execute)
    Fetch,
    /// Transaction control statement failed
    Transaction,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

impl Error {
    /// Configuration error from a plain message.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(ConfigError {
            message: message.into(),
            source: None,
        })
    }

    /// The SQL that caused this error, if any was recorded.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }

    /// The driver-native result code, if the driver reported one.
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Query(q) => q.code,
            _ => None,
        }
    }

    /// Does this error mean the connection is gone (closed or never opened)?
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    fn boxed_source(&self) -> Option<&BoxedSource> {
        match self {
            Error::Config(e) => e.source.as_ref(),
            Error::Connection(e) => e.source.as_ref(),
            Error::Query(e) => e.source.as_ref(),
            Error::Type(_) | Error::Custom(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {e}"),
            Error::Connection(e) => write!(f, "Connection error: {e}"),
            Error::Query(e) => write!(f, "Query error: {e}"),
            Error::Type(e) => write!(f, "Type error: {e}"),
            Error::Custom(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.boxed_source()
            .map(|err| err.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(col) => write!(
                f,
                "expected {} for column '{col}', found {}",
                self.expected, self.actual
            ),
            None => write!(f, "expected {}, found {}", self.expected, self.actual),
        }
    }
}

macro_rules! error_from_payload {
    ($($payload:ty => $variant:ident),+ $(,)?) => {$(
        impl From<$payload> for Error {
            fn from(err: $payload) -> Self {
                Error::$variant(err)
            }
        }
    )+};
}

error_from_payload! {
    ConfigError => Config,
    ConnectionError => Connection,
    QueryError => Query,
    TypeError => Type,
}
