//! A driver that records every call it sees, for asserting scope order.

#![allow(dead_code)]

use sqlscope::{
    ConnectionError, ConnectionErrorKind, Dialect, Driver, DriverConnection, DriverCursor, Error,
    Params, QueryError, QueryErrorKind, Result, Row,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Shared, ordered log of driver events.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    /// Drain the log, leaving it empty for the next assertion.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

/// Which driver call fails, for error-path assertions. Everything else
/// succeeds after logging.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub enum FailAt {
    #[default]
    Nothing,
    Begin,
    Execute,
    CursorClose,
}

/// Hands out [`RecordingConnection`]s that serve canned rows.
pub struct RecordingDriver {
    log: EventLog,
    rows: Vec<Row>,
    fail_at: FailAt,
}

impl RecordingDriver {
    pub fn new(log: &EventLog) -> Self {
        Self::with_rows(log, Vec::new())
    }

    /// Every cursor serves these rows for any executed statement.
    pub fn with_rows(log: &EventLog, rows: Vec<Row>) -> Self {
        Self {
            log: log.clone(),
            rows,
            fail_at: FailAt::Nothing,
        }
    }

    /// Fail at the given call, after logging it.
    pub fn failing_at(log: &EventLog, fail_at: FailAt) -> Self {
        Self {
            log: log.clone(),
            rows: Vec::new(),
            fail_at,
        }
    }

    /// Serve these rows but fail the given call.
    pub fn with_rows_failing_at(log: &EventLog, rows: Vec<Row>, fail_at: FailAt) -> Self {
        Self {
            log: log.clone(),
            rows,
            fail_at,
        }
    }
}

impl Driver for RecordingDriver {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn connect(&self, dsn: &str) -> Result<Box<dyn DriverConnection>> {
        self.log.push(format!("connect:{dsn}"));
        Ok(Box::new(RecordingConnection {
            log: self.log.clone(),
            rows: self.rows.clone(),
            fail_at: self.fail_at,
            closed: AtomicBool::new(false),
        }))
    }
}

pub struct RecordingConnection {
    log: EventLog,
    rows: Vec<Row>,
    fail_at: FailAt,
    closed: AtomicBool,
}

impl RecordingConnection {
    fn guard(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Closed,
                message: "connection is closed".to_string(),
                source: None,
            }));
        }
        Ok(())
    }
}

impl DriverConnection for RecordingConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn open_cursor(&self) -> Result<Box<dyn DriverCursor>> {
        self.guard()?;
        self.log.push("cursor");
        Ok(Box::new(RecordingCursor {
            log: self.log.clone(),
            canned: self.rows.clone(),
            pos: 0,
            fail_at: self.fail_at,
            executed: false,
            closed: false,
        }))
    }

    fn begin(&self) -> Result<()> {
        self.guard()?;
        if self.fail_at == FailAt::Begin {
            self.log.push("begin_failed");
            return Err(Error::Query(QueryError {
                kind: QueryErrorKind::Transaction,
                sql: Some("BEGIN".to_string()),
                message: "injected begin failure".to_string(),
                code: Some(2),
                source: None,
            }));
        }
        self.log.push("begin");
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.guard()?;
        self.log.push("commit");
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.guard()?;
        self.log.push("rollback");
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.log.push("close");
        }
        Ok(())
    }
}

pub struct RecordingCursor {
    log: EventLog,
    canned: Vec<Row>,
    pos: usize,
    fail_at: FailAt,
    executed: bool,
    closed: bool,
}

impl DriverCursor for RecordingCursor {
    fn execute(&mut self, sql: &str, params: &Params) -> Result<()> {
        self.log.push(format!("execute[{}]:{sql}", params.len()));
        if self.fail_at == FailAt::Execute {
            return Err(Error::Query(QueryError {
                kind: QueryErrorKind::Execute,
                sql: Some(sql.to_string()),
                message: "injected failure".to_string(),
                code: Some(1),
                source: None,
            }));
        }
        self.executed = true;
        self.pos = 0;
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
        self.log.push("fetch");
        let row = self.canned.get(self.pos).cloned();
        self.pos += 1;
        Ok(row)
    }

    fn execute_batch(&mut self, sql: &str, batches: &[Params]) -> Result<()> {
        self.log.push(format!("batch[{}]:{sql}", batches.len()));
        self.executed = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.fail_at == FailAt::CursorClose {
            self.log.push("cursor_close_failed");
            return Err(Error::Query(QueryError {
                kind: QueryErrorKind::Execute,
                sql: None,
                message: "injected close failure".to_string(),
                code: Some(3),
                source: None,
            }));
        }
        self.log.push("cursor_close");
        Ok(())
    }
}
