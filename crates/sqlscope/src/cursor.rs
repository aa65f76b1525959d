//! Cursors: the innermost scope, where statements actually run.

use sqlscope_core::{Dialect, DriverCursor, Params, Result, Row};

/// One statement stream inside a transaction.
///
/// A cursor is obtained from [`Transaction::cursor`](crate::Transaction::cursor)
/// and released with [`close`](Cursor::close) (or on drop). It can be reused:
/// a second `execute` discards whatever rows the previous statement still
/// had.
pub struct Cursor {
    raw: Box<dyn DriverCursor>,
    dialect: Dialect,
}

impl Cursor {
    pub(crate) fn new(raw: Box<dyn DriverCursor>, dialect: Dialect) -> Self {
        Self { raw, dialect }
    }

    /// Run one statement with the given parameters.
    ///
    /// Execution is eager: the statement takes effect even if no row is
    /// ever fetched.
    pub fn execute(&mut self, sql: &str, params: &Params) -> Result<()> {
        tracing::debug!(sql, "executing statement");
        self.raw.execute(sql, params)
    }

    /// Run one parameterized statement once per parameter set.
    pub fn execute_batch(&mut self, sql: &str, batches: &[Params]) -> Result<()> {
        tracing::debug!(sql, batches = batches.len(), "executing batch");
        self.raw.execute_batch(sql, batches)
    }

    /// Fetch the next row of the executed statement; `None` means end of
    /// data.
    pub fn fetch_next(&mut self) -> Result<Option<Row>> {
        self.raw.fetch_next()
    }

    /// Drain the remaining rows of the executed statement.
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.raw.fetch_next()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Placeholder syntax of the connection this cursor runs on.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Release the cursor.
    pub fn close(mut self) -> Result<()> {
        self.raw.close()
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        // driver cursor close is idempotent
        let _ = self.raw.close();
    }
}
