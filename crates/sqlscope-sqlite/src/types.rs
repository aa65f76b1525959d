//! Value encoding and decoding between sqlscope and SQLite.
//!
//! SQLite stores everything in five storage classes (INTEGER, REAL, TEXT,
//! BLOB, NULL). Richer sqlscope values are encoded on the way in: booleans
//! as 0/1 integers, UUIDs as 16-byte blobs, JSON as text.

// Buffer lengths cross the FFI boundary as c_int; SQLite caps them at
// SQLITE_MAX_LENGTH well below i32::MAX.
#![allow(clippy::cast_possible_truncation)]

use crate::ffi;
use sqlscope_core::Value;
use std::ffi::{CStr, c_int};

/// Bind a Value to a prepared statement parameter.
///
/// # Safety
/// - `stmt` must be a valid, non-null prepared statement handle
/// - `index` must be a valid 1-based parameter index
pub unsafe fn bind_value(stmt: *mut ffi::sqlite3_stmt, index: c_int, value: &Value) -> c_int {
    // SAFETY: callers uphold the handle and index contract.
    unsafe {
        match value {
            Value::Null => ffi::sqlite3_bind_null(stmt, index),
            Value::Bool(b) => ffi::sqlite3_bind_int(stmt, index, c_int::from(*b)),
            Value::Int(v) => ffi::sqlite3_bind_int64(stmt, index, *v),
            Value::Double(v) => ffi::sqlite3_bind_double(stmt, index, *v),
            Value::Text(s) => bind_text(stmt, index, s),
            Value::Bytes(b) => ffi::sqlite3_bind_blob(
                stmt,
                index,
                b.as_ptr().cast(),
                b.len() as c_int,
                ffi::SQLITE_TRANSIENT(),
            ),
            // UUID stored as a 16-byte blob
            Value::Uuid(bytes) => ffi::sqlite3_bind_blob(
                stmt,
                index,
                bytes.as_ptr().cast(),
                16,
                ffi::SQLITE_TRANSIENT(),
            ),
            // JSON stored as text
            Value::Json(json) => bind_text(stmt, index, &json.to_string()),
        }
    }
}

unsafe fn bind_text(stmt: *mut ffi::sqlite3_stmt, index: c_int, s: &str) -> c_int {
    let bytes = s.as_bytes();
    // SAFETY: the buffer is valid for `bytes.len()` bytes and SQLITE_TRANSIENT
    // tells SQLite to copy it before returning.
    unsafe {
        ffi::sqlite3_bind_text(
            stmt,
            index,
            bytes.as_ptr().cast(),
            bytes.len() as c_int,
            ffi::SQLITE_TRANSIENT(),
        )
    }
}

/// Read one column from the row the statement is currently positioned on.
///
/// # Safety
/// - `stmt` must be a valid prepared statement that has just returned
///   SQLITE_ROW
/// - `index` must be a valid 0-based column index
pub unsafe fn read_column(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Value {
    // SAFETY: callers uphold the handle and index contract; column pointers
    // stay valid until the next step or finalize.
    unsafe {
        match ffi::sqlite3_column_type(stmt, index) {
            ffi::SQLITE_NULL => Value::Null,
            ffi::SQLITE_INTEGER => Value::Int(ffi::sqlite3_column_int64(stmt, index)),
            ffi::SQLITE_FLOAT => Value::Double(ffi::sqlite3_column_double(stmt, index)),
            ffi::SQLITE_TEXT => {
                let ptr = ffi::sqlite3_column_text(stmt, index);
                let len = ffi::sqlite3_column_bytes(stmt, index);
                if ptr.is_null() {
                    Value::Null
                } else {
                    let slice = std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize);
                    Value::Text(String::from_utf8_lossy(slice).into_owned())
                }
            }
            ffi::SQLITE_BLOB => {
                let ptr = ffi::sqlite3_column_blob(stmt, index);
                let len = ffi::sqlite3_column_bytes(stmt, index);
                if ptr.is_null() || len == 0 {
                    Value::Bytes(Vec::new())
                } else {
                    let slice = std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize);
                    Value::Bytes(slice.to_vec())
                }
            }
            _ => Value::Null,
        }
    }
}

/// Column names of a prepared statement, with `col{i}` fallbacks for
/// unnamed result columns.
///
/// # Safety
/// - `stmt` must be a valid, non-null prepared statement handle
pub unsafe fn column_names(stmt: *mut ffi::sqlite3_stmt) -> Vec<String> {
    // SAFETY: callers uphold the handle contract; name pointers stay valid
    // until finalize.
    unsafe {
        let count = ffi::sqlite3_column_count(stmt);
        (0..count)
            .map(|i| {
                let ptr = ffi::sqlite3_column_name(stmt, i);
                if ptr.is_null() {
                    format!("col{i}")
                } else {
                    CStr::from_ptr(ptr).to_string_lossy().into_owned()
                }
            })
            .collect()
    }
}
