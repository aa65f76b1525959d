//! SQLite implementations of the sqlscope driver traits.
//!
//! One [`SqliteConnection`] wraps one `sqlite3*` handle behind a mutex so
//! the connection can be shared between a session and the cursors opened on
//! it. Statement execution is eager: `execute` runs the first step
//! immediately, so DML takes effect even when nobody fetches, and a result
//! row produced by that first step is buffered for the first `fetch_next`.

// Lengths and indexes cross the FFI boundary as c_int; SQLite caps both at
// limits well below i32::MAX.
#![allow(clippy::cast_possible_truncation)]

use crate::ffi;
use crate::types;
use sqlscope_core::{
    ColumnInfo, ConnectionError, ConnectionErrorKind, Dialect, Driver, DriverConnection,
    DriverCursor, Error, Params, QueryError, QueryErrorKind, Result, Row,
};
use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;
use std::sync::{Arc, Mutex};

/// Flags controlling how the database file is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    /// Open for reading only.
    pub read_only: bool,
    /// Open for reading and writing.
    pub read_write: bool,
    /// Create the database if it doesn't exist.
    pub create: bool,
    /// Enable URI filename interpretation.
    pub uri: bool,
}

impl OpenFlags {
    /// Flags for read-only access.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    /// Flags for read-write access with creation if needed.
    pub fn create_read_write() -> Self {
        Self {
            read_write: true,
            create: true,
            ..Default::default()
        }
    }

    fn to_sqlite_flags(self) -> c_int {
        let mut flags = 0;

        if self.read_only {
            flags |= ffi::SQLITE_OPEN_READONLY;
        }
        if self.read_write {
            flags |= ffi::SQLITE_OPEN_READWRITE;
        }
        if self.create {
            flags |= ffi::SQLITE_OPEN_CREATE;
        }
        if self.uri {
            flags |= ffi::SQLITE_OPEN_URI;
        }

        // Default to read-write if no mode specified
        if flags & (ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_READWRITE) == 0 {
            flags |= ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        }

        flags
    }
}

/// Configuration applied to every connection a [`SqliteDriver`] opens.
///
/// The database location itself is not part of the config; it comes from
/// the connection string handed to [`Driver::connect`].
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Open flags (read-only, read-write, create, etc.)
    pub flags: OpenFlags,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            flags: OpenFlags::create_read_write(),
            busy_timeout_ms: 5000,
        }
    }
}

impl SqliteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set open flags.
    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set busy timeout.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }
}

/// The SQLite driver.
///
/// The connection string is a filesystem path; `:memory:` (or an empty
/// string) opens a private in-memory database.
#[derive(Debug, Clone, Default)]
pub struct SqliteDriver {
    config: SqliteConfig,
}

impl SqliteDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every connection with a non-default configuration.
    pub fn with_config(config: SqliteConfig) -> Self {
        Self { config }
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self, dsn: &str) -> Result<Box<dyn DriverConnection>> {
        let path = if dsn.is_empty() { ":memory:" } else { dsn };
        Ok(Box::new(SqliteConnection::open(path, &self.config)?))
    }
}

/// Connection state guarded by the handle mutex. A null `db` means the
/// connection has been closed.
struct SqliteInner {
    db: *mut ffi::sqlite3,
    in_transaction: bool,
}

// SAFETY: the raw handle is only touched while holding the surrounding
// mutex, and the bundled SQLite is compiled in serialized threading mode.
unsafe impl Send for SqliteInner {}

/// One open SQLite database connection.
pub struct SqliteConnection {
    inner: Arc<Mutex<SqliteInner>>,
    path: String,
}

impl SqliteConnection {
    /// Open a database at `path` (`:memory:` for in-memory).
    pub fn open(path: &str, config: &SqliteConfig) -> Result<Self> {
        let c_path = CString::new(path).map_err(|_| {
            Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Open,
                message: "database path contains a null byte".to_string(),
                source: None,
            })
        })?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = config.flags.to_sqlite_flags();

        // SAFETY: c_path is NUL-terminated and db is a valid out-pointer.
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            // SQLite usually allocates a handle even on failure; read the
            // message off it, then release it.
            let message = if db.is_null() {
                ffi::error_string(rc)
            } else {
                let msg = errmsg(db);
                // SAFETY: db is non-null and was returned by sqlite3_open_v2.
                unsafe { ffi::sqlite3_close_v2(db) };
                msg
            };
            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Open,
                message: format!("failed to open {path}: {message}"),
                source: None,
            }));
        }

        if config.busy_timeout_ms > 0 {
            // SAFETY: db is a valid open handle.
            unsafe { ffi::sqlite3_busy_timeout(db, config.busy_timeout_ms as c_int) };
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(SqliteInner {
                db,
                in_transaction: false,
            })),
            path: path.to_string(),
        })
    }

    /// Open a private in-memory database with the default configuration.
    pub fn open_memory() -> Result<Self> {
        Self::open(":memory:", &SqliteConfig::default())
    }

    /// The path this connection was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl DriverConnection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn open_cursor(&self) -> Result<Box<dyn DriverCursor>> {
        let inner = self.inner.lock().unwrap();
        guard_open(&inner)?;
        drop(inner);
        Ok(Box::new(SqliteCursor::new(Arc::clone(&self.inner))))
    }

    fn begin(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        guard_open(&inner)?;
        if inner.in_transaction {
            return Err(Error::Query(QueryError {
                kind: QueryErrorKind::Transaction,
                sql: Some("BEGIN".to_string()),
                message: "a transaction is already open on this connection".to_string(),
                code: None,
                source: None,
            }));
        }
        exec(inner.db, "BEGIN")?;
        inner.in_transaction = true;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        guard_open(&inner)?;
        // Committing with no open transaction is a no-op, so an explicit
        // commit inside a scope composes with the commit at scope exit.
        if !inner.in_transaction {
            return Ok(());
        }
        exec(inner.db, "COMMIT")?;
        inner.in_transaction = false;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        guard_open(&inner)?;
        if !inner.in_transaction {
            return Ok(());
        }
        exec(inner.db, "ROLLBACK")?;
        inner.in_transaction = false;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.db.is_null() {
            return Ok(());
        }
        // SAFETY: db is a valid handle. close_v2 defers teardown until any
        // outstanding statements are finalized, which covers cursors that
        // outlive their connection.
        let rc = unsafe { ffi::sqlite3_close_v2(inner.db) };
        inner.db = ptr::null_mut();
        inner.in_transaction = false;
        if rc != ffi::SQLITE_OK {
            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Close,
                message: ffi::error_string(rc),
                source: None,
            }));
        }
        Ok(())
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            if !inner.db.is_null() {
                // SAFETY: db is valid; an open transaction rolls back when
                // the handle closes.
                unsafe { ffi::sqlite3_close_v2(inner.db) };
                inner.db = ptr::null_mut();
            }
        }
    }
}

/// A cursor over one SQLite connection.
pub struct SqliteCursor {
    conn: Arc<Mutex<SqliteInner>>,
    stmt: *mut ffi::sqlite3_stmt,
    sql: String,
    columns: Option<Arc<ColumnInfo>>,
    pending_first: Option<Row>,
    executed: bool,
}

// SAFETY: the statement handle is used from one thread at a time (all
// methods take &mut self) and the connection behind it is serialized.
unsafe impl Send for SqliteCursor {}

impl SqliteCursor {
    fn new(conn: Arc<Mutex<SqliteInner>>) -> Self {
        Self {
            conn,
            stmt: ptr::null_mut(),
            sql: String::new(),
            columns: None,
            pending_first: None,
            executed: false,
        }
    }

    /// Finalize the current statement, if any, and clear row state.
    fn reset_statement(&mut self) {
        if !self.stmt.is_null() {
            // SAFETY: stmt is a valid statement handle.
            unsafe { ffi::sqlite3_finalize(self.stmt) };
            self.stmt = ptr::null_mut();
        }
        self.sql.clear();
        self.columns = None;
        self.pending_first = None;
        self.executed = false;
    }
}

impl DriverCursor for SqliteCursor {
    fn execute(&mut self, sql: &str, params: &Params) -> Result<()> {
        // A second execute discards the previous statement and whatever
        // rows it still had.
        self.reset_statement();

        let inner = self.conn.lock().unwrap();
        guard_open(&inner)?;

        let stmt = prepare(inner.db, sql)?;
        if let Err(err) = bind_params(inner.db, stmt, sql, params) {
            // SAFETY: stmt was just prepared.
            unsafe { ffi::sqlite3_finalize(stmt) };
            return Err(err);
        }

        // SAFETY: stmt is valid.
        let names = unsafe { types::column_names(stmt) };
        let columns = Arc::new(ColumnInfo::new(names));

        // The first step runs now: DML takes effect even if the caller
        // never fetches, and a result row is buffered for the first fetch.
        // SAFETY: stmt is valid.
        match unsafe { ffi::sqlite3_step(stmt) } {
            ffi::SQLITE_ROW => {
                self.pending_first = Some(read_row(stmt, &columns));
                self.stmt = stmt;
                self.sql = sql.to_string();
            }
            ffi::SQLITE_DONE => {
                // Exhausted immediately; nothing to keep beyond the column
                // layout.
                // SAFETY: stmt is valid.
                unsafe { ffi::sqlite3_finalize(stmt) };
            }
            rc => {
                let err = step_error(inner.db, sql, QueryErrorKind::Execute, rc);
                // SAFETY: stmt is valid.
                unsafe { ffi::sqlite3_finalize(stmt) };
                return Err(err);
            }
        }

        self.columns = Some(columns);
        self.executed = true;
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Row>> {
        if !self.executed {
            return Err(Error::Query(QueryError {
                kind: QueryErrorKind::Fetch,
                sql: None,
                message: "no statement has been executed on this cursor".to_string(),
                code: None,
                source: None,
            }));
        }
        if let Some(row) = self.pending_first.take() {
            return Ok(Some(row));
        }
        if self.stmt.is_null() {
            return Ok(None);
        }

        let inner = self.conn.lock().unwrap();
        guard_open(&inner)?;

        // SAFETY: stmt is valid.
        match unsafe { ffi::sqlite3_step(self.stmt) } {
            ffi::SQLITE_ROW => {
                let columns = self.columns.clone().unwrap_or_else(ColumnInfo::unnamed);
                Ok(Some(read_row(self.stmt, &columns)))
            }
            ffi::SQLITE_DONE => {
                // Finalize eagerly so database locks release as soon as the
                // rows run out.
                // SAFETY: stmt is valid.
                unsafe { ffi::sqlite3_finalize(self.stmt) };
                self.stmt = ptr::null_mut();
                Ok(None)
            }
            rc => {
                let err = step_error(inner.db, &self.sql, QueryErrorKind::Fetch, rc);
                // SAFETY: stmt is valid.
                unsafe { ffi::sqlite3_finalize(self.stmt) };
                self.stmt = ptr::null_mut();
                Err(err)
            }
        }
    }

    fn execute_batch(&mut self, sql: &str, batches: &[Params]) -> Result<()> {
        self.reset_statement();
        if batches.is_empty() {
            return Ok(());
        }

        let inner = self.conn.lock().unwrap();
        guard_open(&inner)?;

        // Prepare once, bind and run per parameter set.
        let stmt = prepare(inner.db, sql)?;
        for params in batches {
            if let Err(err) = run_once(inner.db, stmt, sql, params) {
                // SAFETY: stmt is valid.
                unsafe { ffi::sqlite3_finalize(stmt) };
                return Err(err);
            }
        }
        // SAFETY: stmt is valid.
        unsafe { ffi::sqlite3_finalize(stmt) };
        self.executed = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.reset_statement();
        Ok(())
    }
}

impl Drop for SqliteCursor {
    fn drop(&mut self) {
        self.reset_statement();
    }
}

fn guard_open(inner: &SqliteInner) -> Result<()> {
    if inner.db.is_null() {
        return Err(Error::Connection(ConnectionError {
            kind: ConnectionErrorKind::Closed,
            message: "connection is closed".to_string(),
            source: None,
        }));
    }
    Ok(())
}

/// Run a zero-parameter statement via sqlite3_exec. Used for transaction
/// control, which never produces rows.
fn exec(db: *mut ffi::sqlite3, sql: &str) -> Result<()> {
    let c_sql = CString::new(sql).map_err(|_| sql_null_byte_error(sql))?;
    let mut errptr: *mut c_char = ptr::null_mut();
    // SAFETY: db is a valid handle, c_sql is NUL-terminated, errptr is a
    // valid out-pointer.
    let rc = unsafe { ffi::sqlite3_exec(db, c_sql.as_ptr(), None, ptr::null_mut(), &mut errptr) };
    if rc != ffi::SQLITE_OK {
        let message = if errptr.is_null() {
            ffi::error_string(rc)
        } else {
            // SAFETY: errptr is a NUL-terminated string allocated by SQLite
            // and must be released with sqlite3_free.
            let msg = unsafe { CStr::from_ptr(errptr).to_string_lossy().into_owned() };
            unsafe { ffi::sqlite3_free(errptr.cast()) };
            msg
        };
        return Err(Error::Query(QueryError {
            kind: QueryErrorKind::Transaction,
            sql: Some(sql.to_string()),
            message,
            code: Some(rc),
            source: None,
        }));
    }
    Ok(())
}

fn prepare(db: *mut ffi::sqlite3, sql: &str) -> Result<*mut ffi::sqlite3_stmt> {
    let c_sql = CString::new(sql).map_err(|_| sql_null_byte_error(sql))?;
    let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();

    // SAFETY: db is a valid handle, c_sql is NUL-terminated, stmt is a
    // valid out-pointer.
    let rc = unsafe {
        ffi::sqlite3_prepare_v2(
            db,
            c_sql.as_ptr(),
            c_sql.as_bytes().len() as c_int,
            &mut stmt,
            ptr::null_mut(),
        )
    };

    if rc != ffi::SQLITE_OK {
        return Err(Error::Query(QueryError {
            kind: QueryErrorKind::Prepare,
            sql: Some(sql.to_string()),
            message: errmsg(db),
            code: Some(rc),
            source: None,
        }));
    }
    Ok(stmt)
}

fn bind_params(
    db: *mut ffi::sqlite3,
    stmt: *mut ffi::sqlite3_stmt,
    sql: &str,
    params: &Params,
) -> Result<()> {
    match params {
        Params::None => Ok(()),
        Params::Positional(values) => {
            for (i, value) in values.iter().enumerate() {
                // SAFETY: stmt is valid and parameter indexes are 1-based.
                let rc = unsafe { types::bind_value(stmt, (i + 1) as c_int, value) };
                if rc != ffi::SQLITE_OK {
                    return Err(bind_error(db, sql, &(i + 1).to_string(), rc));
                }
            }
            Ok(())
        }
        Params::Named(pairs) => {
            for (name, value) in pairs {
                let c_name =
                    CString::new(format!(":{name}")).map_err(|_| sql_null_byte_error(sql))?;
                // SAFETY: stmt is valid and c_name is NUL-terminated.
                let index = unsafe { ffi::sqlite3_bind_parameter_index(stmt, c_name.as_ptr()) };
                if index == 0 {
                    return Err(Error::Query(QueryError {
                        kind: QueryErrorKind::Bind,
                        sql: Some(sql.to_string()),
                        message: format!("no parameter named :{name} in statement"),
                        code: None,
                        source: None,
                    }));
                }
                // SAFETY: stmt is valid and index came from SQLite.
                let rc = unsafe { types::bind_value(stmt, index, value) };
                if rc != ffi::SQLITE_OK {
                    return Err(bind_error(db, sql, name, rc));
                }
            }
            Ok(())
        }
    }
}

/// Bind one parameter set and step until done, for batch execution.
fn run_once(
    db: *mut ffi::sqlite3,
    stmt: *mut ffi::sqlite3_stmt,
    sql: &str,
    params: &Params,
) -> Result<()> {
    // SAFETY: stmt is valid; reset and clear_bindings are always safe on a
    // prepared statement.
    unsafe {
        ffi::sqlite3_reset(stmt);
        ffi::sqlite3_clear_bindings(stmt);
    }
    bind_params(db, stmt, sql, params)?;
    loop {
        // SAFETY: stmt is valid.
        match unsafe { ffi::sqlite3_step(stmt) } {
            ffi::SQLITE_ROW => {}
            ffi::SQLITE_DONE => return Ok(()),
            rc => return Err(step_error(db, sql, QueryErrorKind::Execute, rc)),
        }
    }
}

fn read_row(stmt: *mut ffi::sqlite3_stmt, columns: &Arc<ColumnInfo>) -> Row {
    let mut values = Vec::with_capacity(columns.len());
    for i in 0..columns.len() {
        // SAFETY: stmt has just returned SQLITE_ROW and i is in range.
        values.push(unsafe { types::read_column(stmt, i as c_int) });
    }
    Row::new(Arc::clone(columns), values)
}

fn errmsg(db: *mut ffi::sqlite3) -> String {
    // SAFETY: db is a valid handle; the message is NUL-terminated and owned
    // by SQLite.
    unsafe { CStr::from_ptr(ffi::sqlite3_errmsg(db)) }
        .to_string_lossy()
        .into_owned()
}

fn bind_error(db: *mut ffi::sqlite3, sql: &str, param: &str, rc: c_int) -> Error {
    Error::Query(QueryError {
        kind: QueryErrorKind::Bind,
        sql: Some(sql.to_string()),
        message: format!("failed to bind parameter {param}: {}", errmsg(db)),
        code: Some(rc),
        source: None,
    })
}

fn step_error(db: *mut ffi::sqlite3, sql: &str, kind: QueryErrorKind, rc: c_int) -> Error {
    Error::Query(QueryError {
        kind,
        sql: Some(sql.to_string()),
        message: errmsg(db),
        code: Some(rc),
        source: None,
    })
}

fn sql_null_byte_error(sql: &str) -> Error {
    Error::Query(QueryError {
        kind: QueryErrorKind::Prepare,
        sql: Some(sql.to_string()),
        message: "SQL contains a null byte".to_string(),
        code: None,
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlscope_core::Value;

    fn memory_conn() -> SqliteConnection {
        SqliteConnection::open_memory().unwrap()
    }

    fn setup_users(conn: &SqliteConnection) {
        let mut cursor = conn.open_cursor().unwrap();
        cursor
            .execute(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)",
                &Params::None,
            )
            .unwrap();
        cursor
            .execute(
                "INSERT INTO users (name, age) VALUES ('alice', 30), ('bob', 31)",
                &Params::None,
            )
            .unwrap();
        cursor.close().unwrap();
    }

    #[test]
    fn select_streams_rows() {
        let conn = memory_conn();
        setup_users(&conn);
        let mut cursor = conn.open_cursor().unwrap();
        cursor
            .execute("SELECT name, age FROM users ORDER BY id", &Params::None)
            .unwrap();

        let first = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(
            first.get_by_name("name"),
            Some(&Value::Text("alice".into()))
        );
        assert_eq!(first.get_by_name("age"), Some(&Value::Int(30)));

        let second = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(second.get_by_name("name"), Some(&Value::Text("bob".into())));

        assert!(cursor.fetch_next().unwrap().is_none());
        // fetching past the end stays at end of data
        assert!(cursor.fetch_next().unwrap().is_none());
    }

    #[test]
    fn dml_runs_without_any_fetch() {
        let conn = memory_conn();
        setup_users(&conn);
        let mut cursor = conn.open_cursor().unwrap();
        cursor
            .execute("DELETE FROM users WHERE name = 'alice'", &Params::None)
            .unwrap();
        drop(cursor);

        let mut cursor = conn.open_cursor().unwrap();
        cursor
            .execute("SELECT COUNT(*) FROM users", &Params::None)
            .unwrap();
        let row = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(row.get(0), Some(&Value::Int(1)));
    }

    #[test]
    fn positional_and_named_binding() {
        let conn = memory_conn();
        setup_users(&conn);
        let mut cursor = conn.open_cursor().unwrap();

        cursor
            .execute(
                "SELECT name FROM users WHERE age = ?1",
                &Params::Positional(vec![Value::Int(31)]),
            )
            .unwrap();
        let row = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(row.get_as::<String>(0).unwrap(), "bob");

        cursor
            .execute(
                "SELECT age FROM users WHERE name = :name",
                &Params::Named(vec![("name".to_string(), Value::from("alice"))]),
            )
            .unwrap();
        let row = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(row.get_as::<i64>(0).unwrap(), 30);
    }

    #[test]
    fn unknown_named_parameter_is_a_bind_error() {
        let conn = memory_conn();
        setup_users(&conn);
        let mut cursor = conn.open_cursor().unwrap();
        let err = cursor
            .execute(
                "SELECT 1 FROM users WHERE name = :name",
                &Params::Named(vec![("nombre".to_string(), Value::from("x"))]),
            )
            .unwrap_err();
        assert!(err.to_string().contains("nombre"));
    }

    #[test]
    fn fetch_before_execute_fails() {
        let conn = memory_conn();
        let mut cursor = conn.open_cursor().unwrap();
        let err = cursor.fetch_next().unwrap_err();
        assert!(err.to_string().contains("no statement"));
    }

    #[test]
    fn prepare_error_carries_sql_and_code() {
        let conn = memory_conn();
        let mut cursor = conn.open_cursor().unwrap();
        let err = cursor.execute("SELEC wrong", &Params::None).unwrap_err();
        assert_eq!(err.sql(), Some("SELEC wrong"));
        assert!(err.code().is_some());
    }

    #[test]
    fn reusing_a_cursor_discards_previous_rows() {
        let conn = memory_conn();
        setup_users(&conn);
        let mut cursor = conn.open_cursor().unwrap();
        cursor
            .execute("SELECT name FROM users ORDER BY id", &Params::None)
            .unwrap();
        cursor
            .execute("SELECT age FROM users ORDER BY id DESC", &Params::None)
            .unwrap();
        let row = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(row.get_as::<i64>(0).unwrap(), 31);
    }

    #[test]
    fn begin_twice_is_an_error_and_idle_commit_is_not() {
        let conn = memory_conn();
        setup_users(&conn);
        conn.begin().unwrap();
        let err = conn.begin().unwrap_err();
        assert!(err.to_string().contains("already open"));
        conn.rollback().unwrap();

        // idle commit and rollback are no-ops
        conn.commit().unwrap();
        conn.rollback().unwrap();
    }

    #[test]
    fn rollback_discards_changes() {
        let conn = memory_conn();
        setup_users(&conn);
        conn.begin().unwrap();
        let mut cursor = conn.open_cursor().unwrap();
        cursor.execute("DELETE FROM users", &Params::None).unwrap();
        cursor.close().unwrap();
        conn.rollback().unwrap();

        let mut cursor = conn.open_cursor().unwrap();
        cursor
            .execute("SELECT COUNT(*) FROM users", &Params::None)
            .unwrap();
        let row = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(row.get(0), Some(&Value::Int(2)));
    }

    #[test]
    fn operations_fail_after_close() {
        let conn = memory_conn();
        conn.close().unwrap();
        // close is idempotent
        conn.close().unwrap();

        let Err(err) = conn.open_cursor() else {
            panic!("open_cursor succeeded on a closed connection")
        };
        assert!(err.is_connection_error());
        let err = conn.begin().unwrap_err();
        assert!(err.is_connection_error());
    }

    #[test]
    fn close_with_an_outstanding_cursor_defers_teardown() {
        let conn = memory_conn();
        setup_users(&conn);
        let mut cursor = conn.open_cursor().unwrap();
        cursor
            .execute("SELECT name FROM users", &Params::None)
            .unwrap();

        // close_v2 reports OK and defers teardown until the statement
        // finalizes
        conn.close().unwrap();
        // the row buffered at execute time is still served; stepping
        // further requires the connection
        assert!(cursor.fetch_next().unwrap().is_some());
        assert!(cursor.fetch_next().unwrap_err().is_connection_error());
        drop(cursor);
    }

    #[test]
    fn batch_executes_every_parameter_set() {
        let conn = memory_conn();
        setup_users(&conn);
        let mut cursor = conn.open_cursor().unwrap();
        cursor
            .execute_batch(
                "INSERT INTO users (name, age) VALUES (?1, ?2)",
                &[
                    Params::Positional(vec![Value::from("carol"), Value::Int(40)]),
                    Params::Positional(vec![Value::from("dave"), Value::Int(41)]),
                ],
            )
            .unwrap();

        cursor
            .execute("SELECT COUNT(*) FROM users", &Params::None)
            .unwrap();
        let row = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(row.get(0), Some(&Value::Int(4)));
    }

    #[test]
    fn rich_values_round_trip() {
        let conn = memory_conn();
        let mut cursor = conn.open_cursor().unwrap();
        cursor
            .execute(
                "CREATE TABLE t (b INTEGER, d REAL, s TEXT, raw BLOB, u BLOB, j TEXT, n TEXT)",
                &Params::None,
            )
            .unwrap();

        let uuid = [0x11u8; 16];
        cursor
            .execute(
                "INSERT INTO t VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                &Params::Positional(vec![
                    Value::Bool(true),
                    Value::Double(1.5),
                    Value::from("text"),
                    Value::Bytes(vec![1, 2, 3]),
                    Value::Uuid(uuid),
                    Value::Json(serde_json::json!({"k": 1})),
                    Value::Null,
                ]),
            )
            .unwrap();

        cursor.execute("SELECT * FROM t", &Params::None).unwrap();
        let row = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(row.get(0), Some(&Value::Int(1)));
        assert_eq!(row.get(1), Some(&Value::Double(1.5)));
        assert_eq!(row.get(2), Some(&Value::Text("text".into())));
        assert_eq!(row.get(3), Some(&Value::Bytes(vec![1, 2, 3])));
        assert_eq!(row.get(4), Some(&Value::Bytes(uuid.to_vec())));
        assert_eq!(row.get(5), Some(&Value::Text("{\"k\":1}".into())));
        assert_eq!(row.get(6), Some(&Value::Null));
    }
}
