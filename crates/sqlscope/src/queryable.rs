//! One query interface over every scope, plus a mock for tests.

use crate::database::Database;
use crate::insert::{Record, insert_rows};
use crate::registry::SessionRegistry;
use crate::select::{Select, Source};
use crate::session::Session;
use crate::transaction::Transaction;
use regex::Regex;
use sqlscope_core::{ConfigError, Error, Params, Result, Row, Value};

/// The common query surface shared by every scope.
///
/// [`Database`], [`Session`], [`Transaction`], and [`SessionRegistry`] all
/// implement it, each running the statement inside whatever scopes it has to
/// open first: a database opens a session and a transaction per call, a
/// session opens a transaction, a transaction runs the statement directly
/// and leaves the commit to its owner. Code written against
/// `&mut dyn Queryable` runs unchanged on any of them, including
/// [`QueryableMock`] in tests.
///
/// # Example
///
/// ```
/// use sqlscope::{Params, Queryable, QueryableMock, values};
///
/// fn adults(db: &mut dyn Queryable) -> sqlscope::Result<Vec<String>> {
///     let mut select = db.select("SELECT name FROM people WHERE age >= 18", Params::None);
///     let rows = select.fetch_all()?;
///     rows.into_iter().map(|row| row.get_as::<String>(0)).collect()
/// }
///
/// let mut mock = QueryableMock::new()
///     .on("SELECT name FROM people", vec![values!["ada"], values!["grace"]])?;
/// assert_eq!(adults(&mut mock)?, vec!["ada", "grace"]);
/// # Ok::<(), sqlscope::Error>(())
/// ```
pub trait Queryable {
    /// Describe a query against this scope. Nothing runs until the returned
    /// [`Select`] is iterated.
    fn select(&mut self, query: &str, params: Params) -> Select<'_>;

    /// Bulk-insert records with a single statement. An empty slice returns
    /// without touching the database.
    fn insert(&mut self, table: &str, rows: &[Record]) -> Result<()>;

    /// Run a statement and discard any rows it produces.
    fn execute(&mut self, sql: &str, params: Params) -> Result<()>;
}

impl Queryable for Database {
    fn select(&mut self, query: &str, params: Params) -> Select<'_> {
        Select::new(query, params, Source::Database(self))
    }

    fn insert(&mut self, table: &str, rows: &[Record]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.with_session(|session| {
            session.with_transaction(|tx| {
                tx.with_cursor(|cursor| insert_rows(cursor, table, rows))
            })
        })
    }

    fn execute(&mut self, sql: &str, params: Params) -> Result<()> {
        self.with_session(|session| {
            session.with_transaction(|tx| tx.with_cursor(|cursor| cursor.execute(sql, &params)))
        })
    }
}

impl Queryable for Session {
    fn select(&mut self, query: &str, params: Params) -> Select<'_> {
        Select::new(query, params, Source::Session(self))
    }

    fn insert(&mut self, table: &str, rows: &[Record]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.with_transaction(|tx| tx.with_cursor(|cursor| insert_rows(cursor, table, rows)))
    }

    fn execute(&mut self, sql: &str, params: Params) -> Result<()> {
        self.with_transaction(|tx| tx.with_cursor(|cursor| cursor.execute(sql, &params)))
    }
}

impl Queryable for Transaction {
    fn select(&mut self, query: &str, params: Params) -> Select<'_> {
        Select::new(query, params, Source::Transaction(self))
    }

    /// Runs inside this transaction; committing stays with the caller.
    fn insert(&mut self, table: &str, rows: &[Record]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.with_cursor(|cursor| insert_rows(cursor, table, rows))
    }

    fn execute(&mut self, sql: &str, params: Params) -> Result<()> {
        self.with_cursor(|cursor| cursor.execute(sql, &params))
    }
}

impl Queryable for SessionRegistry {
    fn select(&mut self, query: &str, params: Params) -> Select<'_> {
        Select::new(query, params, Source::Registry(self))
    }

    fn insert(&mut self, table: &str, rows: &[Record]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let handle = self.get()?;
        handle.with_transaction(|tx| tx.with_cursor(|cursor| insert_rows(cursor, table, rows)))
    }

    fn execute(&mut self, sql: &str, params: Params) -> Result<()> {
        let handle = self.get()?;
        handle.with_transaction(|tx| tx.with_cursor(|cursor| cursor.execute(sql, &params)))
    }
}

/// A [`Queryable`] that serves canned rows instead of talking to a database.
///
/// Each fake pairs a regex with the rows to serve. Patterns match from the
/// start of the query, so `"SELECT name"` matches `"SELECT name FROM t"` but
/// not `"EXPLAIN SELECT name"`. The first registered pattern that matches
/// wins. Unmatched queries yield no rows, and every new select replays the
/// full set. Inserts and executes are accepted and ignored.
#[derive(Debug, Default)]
pub struct QueryableMock {
    fakes: Vec<(Regex, Vec<Row>)>,
}

impl QueryableMock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register canned rows for queries matching `pattern`.
    ///
    /// Returns a configuration error when the pattern is not a valid regex.
    pub fn on(mut self, pattern: &str, rows: Vec<Vec<Value>>) -> Result<Self> {
        let anchored = Regex::new(&format!("^(?:{pattern})")).map_err(|err| {
            Error::Config(ConfigError {
                message: format!("invalid mock pattern {pattern:?}"),
                source: Some(Box::new(err)),
            })
        })?;
        let rows = rows.into_iter().map(Row::positional).collect();
        self.fakes.push((anchored, rows));
        Ok(self)
    }
}

impl Queryable for QueryableMock {
    fn select(&mut self, query: &str, params: Params) -> Select<'_> {
        let rows = self
            .fakes
            .iter()
            .find(|(pattern, _)| pattern.is_match(query))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        Select::canned(query, params, rows)
    }

    fn insert(&mut self, _table: &str, _rows: &[Record]) -> Result<()> {
        Ok(())
    }

    fn execute(&mut self, _sql: &str, _params: Params) -> Result<()> {
        Ok(())
    }
}
