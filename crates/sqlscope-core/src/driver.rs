//! The driver boundary.
//!
//! Everything that actually talks SQL lives behind three object-safe traits:
//!
//! - [`Driver`] - opens connections from a connection string
//! - [`DriverConnection`] - one physical connection: cursors and
//!   transaction control
//! - [`DriverCursor`] - one statement stream: execute, fetch-one, batch
//!
//! The scope layer owns lifetimes and nesting; drivers own execution,
//! binding, and wire/file formats. A driver implementation must not retry,
//! reclassify, or suppress its own errors: they travel to the caller
//! unchanged.

use crate::Result;
use crate::params::Params;
use crate::row::Row;

/// Placeholder syntax spoken by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// PostgreSQL dialect (uses $1, $2 placeholders)
    #[default]
    Postgres,
    /// SQLite dialect (uses ?1, ?2 placeholders)
    Sqlite,
    /// MySQL dialect (uses ? placeholders)
    Mysql,
}

impl Dialect {
    /// Generate a placeholder for the given parameter index (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Mysql => "?".to_string(),
        }
    }
}

/// What a connection factory hands back: either a live connection, or a
/// connection string for the configured driver to open.
pub enum Connect {
    /// An already-open connection, used as-is.
    Ready(Box<dyn DriverConnection>),
    /// A connection string to be opened by the configured driver.
    Dsn(String),
}

impl std::fmt::Debug for Connect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connect::Ready(_) => f.write_str("Connect::Ready(..)"),
            Connect::Dsn(dsn) => f.debug_tuple("Connect::Dsn").field(dsn).finish(),
        }
    }
}

/// A database driver: a connection opener.
pub trait Driver: Send + Sync {
    /// Short driver name for diagnostics ("sqlite", "postgres", ...).
    fn name(&self) -> &'static str;

    /// Open a new physical connection described by `dsn`.
    ///
    /// What the string means is driver-defined: a `dbname=.. user=..`
    /// keyword string, a filesystem path, `:memory:`, a URL.
    fn connect(&self, dsn: &str) -> Result<Box<dyn DriverConnection>>;
}

/// One physical connection.
///
/// Interior mutability is the implementor's business (connections are shared
/// across scope values via `Arc`): all methods take `&self`.
///
/// Transaction-control contract:
/// - `begin` with a transaction already open is an error;
/// - `commit`/`rollback` with no open transaction are no-ops, so an explicit
///   mid-scope commit composes with the commit issued at scope exit;
/// - `close` is idempotent; any other call after it fails with a
///   connection-closed error.
pub trait DriverConnection: Send + Sync {
    /// Placeholder syntax for statements on this connection.
    fn dialect(&self) -> Dialect;

    /// Open a fresh cursor over this connection.
    fn open_cursor(&self) -> Result<Box<dyn DriverCursor>>;

    /// Begin a driver-level transaction.
    fn begin(&self) -> Result<()>;

    /// Commit the open transaction, if any.
    fn commit(&self) -> Result<()>;

    /// Roll back the open transaction, if any.
    fn rollback(&self) -> Result<()>;

    /// Close the physical connection.
    fn close(&self) -> Result<()>;
}

/// One statement stream over a connection.
///
/// `execute` runs the statement eagerly (DML takes effect whether or not any
/// row is ever fetched); `fetch_next` then streams rows one at a time until
/// it returns `None`. Calling `fetch_next` before any `execute` is an error.
/// A cursor may be reused: a second `execute` discards the previous
/// statement's remaining rows.
pub trait DriverCursor: Send {
    /// Execute one statement with the given parameters.
    fn execute(&mut self, sql: &str, params: &Params) -> Result<()>;

    /// Fetch the next row of the executed statement; `None` means end of
    /// data.
    fn fetch_next(&mut self) -> Result<Option<Row>>;

    /// Execute one parameterized statement once per parameter set
    /// (driver-level batching: prepare once, bind and run per set).
    fn execute_batch(&mut self, sql: &str, batches: &[Params]) -> Result<()>;

    /// Release the cursor. Idempotent.
    fn close(&mut self) -> Result<()>;
}
