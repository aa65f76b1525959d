//! Low-level SQLite interface.
//!
//! The raw symbols come from `libsqlite3-sys` built with the `bundled`
//! feature, so the amalgamation is compiled in and linked statically. Only
//! the items the driver actually uses are re-exported here, plus a few safe
//! wrappers around the version and error-string entry points.

pub use libsqlite3_sys::{
    SQLITE_BLOB, SQLITE_DONE, SQLITE_FLOAT, SQLITE_INTEGER, SQLITE_NULL, SQLITE_OK,
    SQLITE_OPEN_CREATE, SQLITE_OPEN_READONLY, SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, SQLITE_ROW,
    SQLITE_TEXT, SQLITE_TRANSIENT, sqlite3, sqlite3_bind_blob, sqlite3_bind_double,
    sqlite3_bind_int, sqlite3_bind_int64, sqlite3_bind_null, sqlite3_bind_parameter_index,
    sqlite3_bind_text, sqlite3_busy_timeout, sqlite3_clear_bindings, sqlite3_column_blob,
    sqlite3_column_bytes, sqlite3_column_count, sqlite3_column_double, sqlite3_column_int64,
    sqlite3_column_name, sqlite3_column_text, sqlite3_column_type, sqlite3_errmsg, sqlite3_errstr,
    sqlite3_exec, sqlite3_finalize, sqlite3_free, sqlite3_libversion, sqlite3_libversion_number,
    sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_reset, sqlite3_step, sqlite3_stmt,
};

use std::ffi::{CStr, c_int};

// The shipped bindings stop at sqlite3_close, but the bundled amalgamation
// compiles and exports sqlite3_close_v2, which defers teardown until
// outstanding statements are finalized. Declared here by hand.
unsafe extern "C" {
    pub fn sqlite3_close_v2(db: *mut sqlite3) -> c_int;
}

/// Runtime SQLite library version, e.g. "3.46.0".
pub fn version() -> &'static str {
    // SAFETY: sqlite3_libversion returns a static NUL-terminated string.
    unsafe { CStr::from_ptr(sqlite3_libversion()) }
        .to_str()
        .unwrap_or("unknown")
}

/// Runtime SQLite library version as a number, e.g. 3046000.
pub fn version_number() -> i32 {
    // SAFETY: no preconditions.
    unsafe { sqlite3_libversion_number() }
}

/// Human-readable description of a SQLite result code.
pub fn error_string(code: c_int) -> String {
    // SAFETY: sqlite3_errstr returns a static NUL-terminated string for any
    // code, known or not.
    unsafe { CStr::from_ptr(sqlite3_errstr(code)) }
        .to_string_lossy()
        .into_owned()
}
