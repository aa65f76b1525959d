//! Sessions: one dedicated connection with at most one open transaction.

use crate::transaction::Transaction;
use sqlscope_core::{Dialect, DriverConnection, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One dedicated database connection.
///
/// A session hands out transactions one at a time. Opening a second
/// transaction while one is live is a programming error and panics; it is
/// not a recoverable condition.
///
/// Close a session with [`close`](Session::close). Dropping it without
/// closing closes the connection anyway, rolling back whatever was not
/// committed.
pub struct Session {
    conn: Arc<dyn DriverConnection>,
    tx_active: Arc<AtomicBool>,
    closed: bool,
}

impl Session {
    /// Wrap an already-open driver connection.
    ///
    /// Most sessions come from [`Database::session`](crate::Database::session);
    /// this constructor is for callers that open connections themselves.
    pub fn new(conn: Box<dyn DriverConnection>) -> Self {
        Self {
            conn: Arc::from(conn),
            tx_active: Arc::new(AtomicBool::new(false)),
            closed: false,
        }
    }

    /// Begin a transaction on this session.
    ///
    /// # Panics
    ///
    /// Panics if a transaction is already open on this session.
    pub fn transaction(&self) -> Result<Transaction> {
        assert!(
            !self.tx_active.swap(true, Ordering::AcqRel),
            "a transaction is already open on this session"
        );
        if let Err(err) = self.conn.begin() {
            self.tx_active.store(false, Ordering::Release);
            return Err(err);
        }
        tracing::debug!("transaction started");
        Ok(Transaction::new(
            Arc::clone(&self.conn),
            Arc::clone(&self.tx_active),
        ))
    }

    /// Run `f` inside a transaction that commits when `f` succeeds and
    /// rolls back when it fails.
    ///
    /// An error from `f` takes precedence; a rollback failure after a
    /// failed body is logged and swallowed.
    pub fn with_transaction<T>(&self, f: impl FnOnce(&Transaction) -> Result<T>) -> Result<T> {
        let tx = self.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.end(true)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(end_err) = tx.end(false) {
                    tracing::debug!(error = %end_err, "rollback after failed body also failed");
                }
                Err(err)
            }
        }
    }

    /// Placeholder syntax of the underlying connection.
    pub fn dialect(&self) -> Dialect {
        self.conn.dialect()
    }

    /// Close the connection.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        tracing::debug!("session closed");
        self.conn.close()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("dialect", &self.conn.dialect())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            tracing::debug!("session dropped without close; closing connection");
            let _ = self.conn.close();
        }
    }
}
