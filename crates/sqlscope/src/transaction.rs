//! Transactions: the unit of commit and rollback.

use crate::cursor::Cursor;
use sqlscope_core::{DriverConnection, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A driver-level transaction scoped to one session.
///
/// Obtained from [`Session::transaction`](crate::Session::transaction).
/// Consume it with [`commit`](Transaction::commit) or
/// [`rollback`](Transaction::rollback); dropping it without either rolls
/// back.
pub struct Transaction {
    conn: Arc<dyn DriverConnection>,
    active: Arc<AtomicBool>,
    finished: bool,
}

impl Transaction {
    pub(crate) fn new(conn: Arc<dyn DriverConnection>, active: Arc<AtomicBool>) -> Self {
        Self {
            conn,
            active,
            finished: false,
        }
    }

    /// Open a fresh cursor inside this transaction.
    pub fn cursor(&self) -> Result<Cursor> {
        let raw = self.conn.open_cursor()?;
        Ok(Cursor::new(raw, self.conn.dialect()))
    }

    /// Run `f` with a cursor that is released afterwards.
    ///
    /// The cursor is closed whether `f` succeeds or not; an error from `f`
    /// takes precedence over an error from the close.
    pub fn with_cursor<T>(&self, f: impl FnOnce(&mut Cursor) -> Result<T>) -> Result<T> {
        let mut cursor = self.cursor()?;
        let result = f(&mut cursor);
        let close_result = cursor.close();
        match result {
            Ok(value) => close_result.map(|()| value),
            Err(err) => Err(err),
        }
    }

    /// Commit the transaction and end the scope.
    pub fn commit(self) -> Result<()> {
        self.end(true)
    }

    /// Roll the transaction back and end the scope.
    pub fn rollback(self) -> Result<()> {
        self.end(false)
    }

    pub(crate) fn end(mut self, commit: bool) -> Result<()> {
        self.finished = true;
        self.active.store(false, Ordering::Release);
        if commit {
            tracing::debug!("transaction committed");
            self.conn.commit()
        } else {
            tracing::debug!("transaction rolled back");
            self.conn.rollback()
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.finished {
            self.active.store(false, Ordering::Release);
            tracing::debug!("transaction dropped without commit; rolling back");
            let _ = self.conn.rollback();
        }
    }
}
