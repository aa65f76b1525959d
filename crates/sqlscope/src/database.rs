//! Databases: how to reach a server, and a factory for sessions.

use crate::session::Session;
use sqlscope_core::{Connect, Credentials, Driver, DriverConnection, Error, Result};
use std::fmt;
use std::sync::Arc;

type ConnectFactory = Box<dyn Fn() -> Result<Connect> + Send + Sync>;

enum ConnectSource {
    /// A connection string opened through a driver.
    Dsn {
        driver: Arc<dyn Driver>,
        dsn: String,
    },
    /// A user-supplied factory, with an optional driver for factories that
    /// hand back connection strings instead of live connections.
    Factory {
        factory: ConnectFactory,
        driver: Option<Arc<dyn Driver>>,
    },
}

/// A database something can connect to.
///
/// A `Database` holds no connection itself; every [`session`](Database::session)
/// call opens a fresh one. Construct it with [`Database::builder`] from
/// credentials, a raw connection string, or a connection factory.
///
/// # Example
///
/// ```rust,ignore
/// use sqlscope::{Credentials, Database};
///
/// let db = Database::builder()
///     .driver(PostgresDriver::new())
///     .credentials(Credentials::new("app", "secret", "inventory"))
///     .build()?;
/// let session = db.session()?;
/// ```
pub struct Database {
    source: ConnectSource,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    /// Open a new session, i.e. a dedicated connection.
    pub fn session(&self) -> Result<Session> {
        Ok(Session::new(self.open()?))
    }

    /// Run `f` with a session that is closed afterwards.
    ///
    /// The session is closed whether `f` succeeds or not; an error from `f`
    /// takes precedence over an error from the close.
    pub fn with_session<T>(&self, f: impl FnOnce(&Session) -> Result<T>) -> Result<T> {
        let session = self.session()?;
        let result = f(&session);
        let close_result = session.close();
        match result {
            Ok(value) => close_result.map(|()| value),
            Err(err) => Err(err),
        }
    }

    fn open(&self) -> Result<Box<dyn DriverConnection>> {
        match &self.source {
            ConnectSource::Dsn { driver, dsn } => {
                tracing::debug!(driver = driver.name(), "opening connection");
                driver.connect(dsn)
            }
            ConnectSource::Factory { factory, driver } => match factory()? {
                Connect::Ready(conn) => Ok(conn),
                Connect::Dsn(dsn) => match driver {
                    Some(driver) => {
                        tracing::debug!(driver = driver.name(), "opening connection");
                        driver.connect(&dsn)
                    }
                    None => Err(Error::config(
                        "connection factory returned a connection string but no driver is configured",
                    )),
                },
            },
        }
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            ConnectSource::Dsn { driver, .. } => f
                .debug_struct("Database")
                .field("driver", &driver.name())
                .finish_non_exhaustive(),
            ConnectSource::Factory { .. } => f
                .debug_struct("Database")
                .field("source", &"factory")
                .finish_non_exhaustive(),
        }
    }
}

/// Builder for [`Database`].
///
/// Exactly one connection source is required: credentials, a connection
/// string, or a factory. Credentials take precedence over a raw connection
/// string; both need a driver to open connections with.
#[derive(Default)]
pub struct DatabaseBuilder {
    driver: Option<Arc<dyn Driver>>,
    credentials: Option<Credentials>,
    dsn: Option<String>,
    factory: Option<ConnectFactory>,
}

impl DatabaseBuilder {
    /// The driver used to open connections.
    pub fn driver(mut self, driver: impl Driver + 'static) -> Self {
        self.driver = Some(Arc::new(driver));
        self
    }

    /// Connect with these credentials (rendered to a connection string).
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Connect with a raw connection string.
    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    /// Connect through a factory.
    ///
    /// The factory runs once per session. It may return an already-open
    /// connection, or a connection string for the configured driver.
    pub fn factory(mut self, factory: impl Fn() -> Result<Connect> + Send + Sync + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    pub fn build(self) -> Result<Database> {
        let dsn = self.credentials.map(|c| c.render()).or(self.dsn);
        if let Some(dsn) = dsn {
            let driver = self
                .driver
                .ok_or_else(|| Error::config("a connection string needs a driver to open it"))?;
            return Ok(Database {
                source: ConnectSource::Dsn { driver, dsn },
            });
        }
        if let Some(factory) = self.factory {
            return Ok(Database {
                source: ConnectSource::Factory {
                    factory,
                    driver: self.driver,
                },
            });
        }
        Err(Error::config(
            "no credentials, connection string, or connection factory given",
        ))
    }
}
