//! Core types and traits for sqlscope.
//!
//! This crate provides the foundation the scope layer builds on:
//!
//! - `Value`, `Row`, `Params` - the dynamic data model
//! - `Credentials` - structured connection parameters
//! - `Driver` / `DriverConnection` / `DriverCursor` - the boundary behind
//!   which all real SQL execution happens
//! - `Error` / `Result` - the workspace-wide error type

pub mod credentials;
pub mod driver;
pub mod error;
pub mod params;
pub mod row;
pub mod value;

pub use credentials::Credentials;
pub use driver::{Connect, Dialect, Driver, DriverConnection, DriverCursor};
pub use error::{
    ConfigError, ConnectionError, ConnectionErrorKind, Error, QueryError, QueryErrorKind, Result,
    TypeError,
};
pub use params::Params;
pub use row::{ColumnInfo, FromValue, Row};
pub use value::{Value, format_uuid};
