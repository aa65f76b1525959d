//! A process-wide home for one shared session.

use crate::database::Database;
use crate::session::Session;
use sqlscope_core::{Error, Result};
use std::ops::Deref;
use std::sync::{Mutex, MutexGuard};

/// A configurable slot holding one [`Database`] and the one [`Session`] it
/// lazily opens.
///
/// Applications that want a single shared connection configure a registry
/// once and call [`SessionRegistry::get`] everywhere else. The session is
/// opened on the first `get`, reused afterwards, and closed when the
/// registry is reconfigured or [`SessionRegistry::reset`].
///
/// [`SessionRegistry::new`] is const, so a registry can live in a `static`:
///
/// ```
/// use sqlscope::SessionRegistry;
///
/// static REGISTRY: SessionRegistry = SessionRegistry::new();
///
/// assert!(!REGISTRY.is_configured());
/// ```
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
}

struct RegistryInner {
    database: Option<Database>,
    session: Option<Session>,
}

impl SessionRegistry {
    /// An empty registry; [`SessionRegistry::configure`] makes it usable.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                database: None,
                session: None,
            }),
        }
    }

    /// Install the database the registry opens its session from.
    ///
    /// Any session opened under a previous configuration is closed first;
    /// if that close fails the error returns and the previous database
    /// stays configured.
    pub fn configure(&self, database: Database) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(session) = inner.session.take() {
            session.close()?;
        }
        inner.database = Some(database);
        tracing::debug!("session registry configured");
        Ok(())
    }

    /// Borrow the shared session, opening it on first use.
    ///
    /// The handle holds the registry lock, so keep it short-lived. Errors
    /// with a configuration error when [`SessionRegistry::configure`] has
    /// not been called.
    pub fn get(&self) -> Result<RegistryHandle<'_>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.session.is_none() {
            let Some(database) = inner.database.as_ref() else {
                return Err(Error::config("session registry is not configured"));
            };
            let session = database.session()?;
            inner.session = Some(session);
            tracing::debug!("session registry opened its session");
        }
        Ok(RegistryHandle { guard: inner })
    }

    /// Close the shared session and forget the configuration.
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.database = None;
        match inner.session.take() {
            Some(session) => session.close(),
            None => Ok(()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.lock().unwrap().database.is_some()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry").finish_non_exhaustive()
    }
}

/// Locked access to the registry's session.
///
/// Derefs to [`Session`]; dropping the handle releases the registry lock
/// and leaves the session open for the next caller.
pub struct RegistryHandle<'a> {
    guard: MutexGuard<'a, RegistryInner>,
}

impl Deref for RegistryHandle<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        // get() never hands out a handle without a live session
        self.guard
            .session
            .as_ref()
            .expect("registry session missing")
    }
}

impl std::fmt::Debug for RegistryHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryHandle").finish_non_exhaustive()
    }
}
