//! Shared persistence context handle.
//!
//! # Responsibility
//! - Own one SQLite connection on behalf of the code that opened it.
//! - Hand out cheap clones so a facade and its scheduled tasks can reach
//!   the same session.
//!
//! # Invariants
//! - At most one thread drives the connection at a time.
//! - Clones of a handle always refer to the same connection.

use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

/// Connection plus the unit-of-work bookkeeping that must change with it.
#[derive(Debug)]
struct Session {
    conn: Connection,
    // `total_changes()` observed when a unit of work opened the current
    // transaction; `None` outside such a transaction.
    tracked_since: Option<u64>,
}

/// Cloneable handle to a persistence session.
#[derive(Debug, Clone)]
pub struct DataContext {
    session: Arc<Mutex<Session>>,
}

impl DataContext {
    /// Wraps an already configured connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session {
                conn,
                tracked_since: None,
            })),
        }
    }

    /// Returns whether both handles point at the same connection.
    pub fn same_as(&self, other: &DataContext) -> bool {
        Arc::ptr_eq(&self.session, &other.session)
    }

    /// Runs `f` with exclusive access to the connection.
    ///
    /// A panic inside an earlier call poisons the mutex but leaves the
    /// connection usable, so poisoning is ignored.
    pub fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> R) -> R {
        self.with_tracking(|conn, _| f(conn))
    }

    /// Like `with_connection`, also exposing the transaction baseline.
    ///
    /// The baseline is cleared whenever `f` leaves the connection in
    /// autocommit mode, whichever statement ended the transaction.
    pub(crate) fn with_tracking<R>(
        &self,
        f: impl FnOnce(&Connection, &mut Option<u64>) -> R,
    ) -> R {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let session = &mut *guard;
        let result = f(&session.conn, &mut session.tracked_since);
        if session.conn.is_autocommit() {
            session.tracked_since = None;
        }
        result
    }

    /// Reclaims the connection once every other handle has been dropped.
    ///
    /// Returns the handle back unchanged while clones are still alive.
    pub fn into_connection(self) -> Result<Connection, DataContext> {
        match Arc::try_unwrap(self.session) {
            Ok(mutex) => Ok(mutex
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner)
                .conn),
            Err(session) => Err(Self { session }),
        }
    }
}

impl From<Connection> for DataContext {
    fn from(value: Connection) -> Self {
        Self::new(value)
    }
}
