//! Deferred queries and the row iterator that runs them.

use crate::cursor::Cursor;
use crate::database::Database;
use crate::registry::SessionRegistry;
use crate::session::Session;
use crate::transaction::Transaction;
use sqlscope_core::{Params, Result, Row};

/// A query that has been described but not yet run.
///
/// Building a [`Select`] records the SQL and its parameters; nothing touches
/// the database until [`Select::rows`] is called and the resulting iterator
/// is advanced. The statement runs on the first row request, so an
/// unconsumed select costs nothing.
///
/// A scope-backed select can run more than once: each [`Select::rows`] call
/// opens fresh scopes and executes the statement again. Canned selects, as
/// served by [`QueryableMock`](crate::QueryableMock), are consumed once;
/// after their rows have been drained, further calls yield an empty
/// iterator.
pub struct Select<'a> {
    query: String,
    params: Params,
    source: Source<'a>,
}

/// Where a select gets its connection from.
///
/// Scope-backed variants borrow the scope they will query through; the
/// select opens the narrower scopes it needs on demand and the returned
/// [`Rows`] owns exactly those.
pub(crate) enum Source<'a> {
    Database(&'a Database),
    Session(&'a mut Session),
    Transaction(&'a Transaction),
    Registry(&'a SessionRegistry),
    Canned(std::vec::IntoIter<Row>),
}

impl<'a> Select<'a> {
    pub(crate) fn new(query: &str, params: Params, source: Source<'a>) -> Self {
        Self {
            query: query.to_string(),
            params,
            source,
        }
    }

    /// Open the scopes this select needs and return the row iterator.
    ///
    /// What gets opened depends on the source: a database-backed select
    /// opens a session, a transaction, and a cursor; a session-backed one
    /// opens a transaction and a cursor; a transaction-backed one only a
    /// cursor. The iterator releases everything it opened when it is
    /// closed or dropped. If opening fails partway, the scopes opened so
    /// far are rolled back and released before the error returns.
    pub fn rows(&mut self) -> Result<Rows<'_>> {
        let Select {
            query,
            params,
            source,
        } = self;
        let query = query.as_str();
        let params = &*params;

        let inner = match source {
            Source::Canned(rows) => RowsInner::Canned(rows),
            Source::Database(database) => {
                let session = database.session()?;
                let tx = match session.transaction() {
                    Ok(tx) => tx,
                    Err(err) => {
                        let _ = session.close();
                        return Err(err);
                    }
                };
                let cursor = match tx.cursor() {
                    Ok(cursor) => cursor,
                    Err(err) => {
                        let _ = tx.end(false);
                        let _ = session.close();
                        return Err(err);
                    }
                };
                RowsInner::Live(LiveRows::new(query, params, cursor, Some(tx), Some(session)))
            }
            Source::Session(session) => {
                let tx = session.transaction()?;
                let cursor = match tx.cursor() {
                    Ok(cursor) => cursor,
                    Err(err) => {
                        let _ = tx.end(false);
                        return Err(err);
                    }
                };
                RowsInner::Live(LiveRows::new(query, params, cursor, Some(tx), None))
            }
            Source::Transaction(tx) => {
                let cursor = tx.cursor()?;
                RowsInner::Live(LiveRows::new(query, params, cursor, None, None))
            }
            Source::Registry(registry) => {
                let handle = registry.get()?;
                let tx = handle.transaction()?;
                // The transaction holds the connection on its own, so the
                // registry lock can be released before any row is fetched.
                drop(handle);
                let cursor = match tx.cursor() {
                    Ok(cursor) => cursor,
                    Err(err) => {
                        let _ = tx.end(false);
                        return Err(err);
                    }
                };
                RowsInner::Live(LiveRows::new(query, params, cursor, Some(tx), None))
            }
        };
        Ok(Rows { inner })
    }

    /// Run the select and collect every row.
    ///
    /// Stops at the first error, rolls back whatever the select opened,
    /// and returns that error.
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let mut rows = self.rows()?;
        let mut collected = Vec::new();
        let mut failure = None;
        for row in &mut rows {
            match row {
                Ok(row) => collected.push(row),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        let closed = rows.close();
        match failure {
            Some(err) => Err(err),
            None => {
                closed?;
                Ok(collected)
            }
        }
    }
}

impl Select<'static> {
    pub(crate) fn canned(query: &str, params: Params, rows: Vec<Row>) -> Self {
        Self {
            query: query.to_string(),
            params,
            source: Source::Canned(rows.into_iter()),
        }
    }
}

impl std::fmt::Debug for Select<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Select")
            .field("query", &self.query)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Rows streaming out of a [`Select`], yielding `Result<Row>`.
///
/// The iterator owns the scopes the select opened and releases them in
/// reverse order when it is done. An explicit [`Rows::close`] commits
/// unless iteration hit an error; dropping the iterator commits only if
/// every row was consumed cleanly and rolls back otherwise, so abandoning
/// a result set midway never publishes a half-read transaction.
///
/// An error ends the stream: it is yielded once and the iterator is
/// exhausted afterwards.
pub struct Rows<'s> {
    inner: RowsInner<'s>,
}

enum RowsInner<'s> {
    Canned(&'s mut std::vec::IntoIter<Row>),
    Live(LiveRows<'s>),
}

struct LiveRows<'s> {
    query: &'s str,
    params: &'s Params,
    cursor: Option<Cursor>,
    opened_tx: Option<Transaction>,
    opened_session: Option<Session>,
    started: bool,
    done: bool,
    failed: bool,
}

impl<'s> LiveRows<'s> {
    fn new(
        query: &'s str,
        params: &'s Params,
        cursor: Cursor,
        opened_tx: Option<Transaction>,
        opened_session: Option<Session>,
    ) -> Self {
        Self {
            query,
            params,
            cursor: Some(cursor),
            opened_tx,
            opened_session,
            started: false,
            done: false,
            failed: false,
        }
    }

    fn next_row(&mut self) -> Option<Result<Row>> {
        if self.done {
            return None;
        }
        let cursor = self.cursor.as_mut()?;
        if !self.started {
            self.started = true;
            tracing::debug!(query = self.query, "running select");
            if let Err(err) = cursor.execute(self.query, self.params) {
                self.done = true;
                self.failed = true;
                return Some(Err(err));
            }
        }
        match cursor.fetch_next() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                self.failed = true;
                Some(Err(err))
            }
        }
    }

    /// Release everything this iterator opened, in reverse order.
    ///
    /// Every release runs even if an earlier one fails; the first error
    /// wins. Safe to call more than once.
    fn teardown(&mut self, commit: bool) -> Result<()> {
        let mut first_err = None;
        if let Some(cursor) = self.cursor.take() {
            if let Err(err) = cursor.close() {
                first_err.get_or_insert(err);
            }
        }
        if let Some(tx) = self.opened_tx.take() {
            if let Err(err) = tx.end(commit) {
                first_err.get_or_insert(err);
            }
        }
        if let Some(session) = self.opened_session.take() {
            if let Err(err) = session.close() {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for LiveRows<'_> {
    fn drop(&mut self) {
        let commit = self.done && !self.failed;
        let _ = self.teardown(commit);
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            RowsInner::Canned(rows) => rows.next().map(Ok),
            RowsInner::Live(live) => live.next_row(),
        }
    }
}

impl std::fmt::Debug for Rows<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows").finish_non_exhaustive()
    }
}

impl Rows<'_> {
    /// Close the iterator, committing unless iteration hit an error.
    ///
    /// Reports release errors that a plain drop would swallow.
    pub fn close(mut self) -> Result<()> {
        match &mut self.inner {
            RowsInner::Canned(_) => Ok(()),
            RowsInner::Live(live) => {
                let commit = !live.failed;
                live.teardown(commit)
            }
        }
    }
}
