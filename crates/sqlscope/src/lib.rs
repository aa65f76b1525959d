//! sqlscope - scoped SQL access where every resource has an owner.
//!
//! sqlscope wraps a database driver in four nested scopes:
//!
//! - [`Database`] knows how to open connections but holds none
//! - [`Session`] is one open connection
//! - [`Transaction`] brackets work between BEGIN and COMMIT
//! - [`Cursor`] runs statements and streams rows
//!
//! Each scope opens the next and releases it in reverse order, so a dropped
//! transaction rolls back and a dropped session closes its connection. The
//! [`Queryable`] trait runs the whole dance per statement: `select` /
//! `insert` / `execute` on a [`Database`] open a session, a transaction, and
//! a cursor, do the work, and put everything away again.
//!
//! # Quick Start
//!
//! ```ignore
//! use sqlscope::{Database, Queryable, Record, params};
//! use sqlscope_sqlite::SqliteDriver;
//!
//! let mut db = Database::builder()
//!     .driver(SqliteDriver::new())
//!     .dsn("app.db")
//!     .build()?;
//!
//! db.execute("CREATE TABLE people (name TEXT, age INTEGER)", params![])?;
//! db.insert(
//!     "people",
//!     &[
//!         Record::new().set("name", "ada").set("age", 36),
//!         Record::new().set("name", "grace").set("age", 45),
//!     ],
//! )?;
//!
//! let mut select = db.select("SELECT name FROM people WHERE age > ?1", params![40]);
//! for row in select.rows()? {
//!     println!("{:?}", row?.get_as::<String>(0)?);
//! }
//! ```
//!
//! # Features
//!
//! - **Deterministic teardown**: scopes release in reverse order, on the
//!   error path too
//! - **Lazy selects**: a [`Select`] records the query; nothing runs until
//!   its rows are iterated
//! - **One trait for every scope**: code against [`Queryable`] and run it
//!   on a database, a session, a transaction, or a [`QueryableMock`]
//! - **Shared session registry**: a `const`-constructible
//!   [`SessionRegistry`] for the process-wide connection
//! - **Driver-agnostic core**: drivers implement three small traits;
//!   `sqlscope-sqlite` ships the SQLite one

// Re-export the driver-facing core so applications depend on one crate
pub use sqlscope_core::{
    // Connection sources
    Connect,
    Credentials,
    Dialect,
    // Driver traits
    Driver,
    DriverConnection,
    DriverCursor,
    // Errors
    ConfigError,
    ConnectionError,
    ConnectionErrorKind,
    Error,
    QueryError,
    QueryErrorKind,
    Result,
    TypeError,
    // Rows and values
    ColumnInfo,
    FromValue,
    Params,
    Row,
    Value,
    format_uuid,
};

pub use sqlscope_core::{named_params, params, values};

pub mod cursor;
pub mod database;
pub mod insert;
pub mod queryable;
pub mod registry;
pub mod select;
pub mod session;
pub mod transaction;

pub use cursor::Cursor;
pub use database::{Database, DatabaseBuilder};
pub use insert::{Record, insert_rows};
pub use queryable::{Queryable, QueryableMock};
pub use registry::{RegistryHandle, SessionRegistry};
pub use select::{Rows, Select};
pub use session::Session;
pub use transaction::Transaction;
