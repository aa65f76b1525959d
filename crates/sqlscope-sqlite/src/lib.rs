//! SQLite driver for sqlscope.
//!
// FFI bindings require unsafe code - this is expected for database drivers
#![allow(unsafe_code)]
//!
//! This crate implements the sqlscope-core driver traits over SQLite via
//! `libsqlite3-sys` (built with the bundled amalgamation, so no host
//! libsqlite3 is needed).
//!
//! # Features
//!
//! - Full [`Driver`](sqlscope_core::Driver) / cursor implementation
//! - Positional (`?1`) and named (`:name`) parameter binding
//! - In-memory and file-based databases
//! - Configurable open flags and busy timeout
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlscope_core::{Driver, Params, Value};
//! use sqlscope_sqlite::SqliteDriver;
//!
//! let driver = SqliteDriver::new();
//! let conn = driver.connect(":memory:")?;
//! let mut cursor = conn.open_cursor()?;
//! cursor.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", &Params::None)?;
//! cursor.execute(
//!     "INSERT INTO users (name) VALUES (?1)",
//!     &Params::Positional(vec![Value::from("Alice")]),
//! )?;
//! ```
//!
//! # Type Mapping
//!
//! | sqlscope value | SQLite storage |
//! |----------------|----------------|
//! | `Null` | NULL |
//! | `Bool` | INTEGER (0/1) |
//! | `Int` | INTEGER |
//! | `Double` | REAL |
//! | `Text` | TEXT |
//! | `Bytes` | BLOB |
//! | `Uuid` | BLOB (16 bytes) |
//! | `Json` | TEXT |
//!
//! Reads map the four non-null storage classes back to `Int`, `Double`,
//! `Text`, and `Bytes`; SQLite keeps no column-level type metadata beyond
//! that.
//!
//! # Thread Safety
//!
//! [`SqliteConnection`] is `Send` and `Sync`: the raw handle sits behind a
//! mutex, and the bundled library is compiled in serialized threading mode.

pub mod connection;
pub mod ffi;
pub mod types;

pub use connection::{OpenFlags, SqliteConfig, SqliteConnection, SqliteCursor, SqliteDriver};

/// Runtime SQLite library version.
pub fn sqlite_version() -> &'static str {
    ffi::version()
}

/// Runtime SQLite library version number.
pub fn sqlite_version_number() -> i32 {
    ffi::version_number()
}
