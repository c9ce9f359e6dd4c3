//! Unit of work over a shared persistence context.
//!
//! # Responsibility
//! - Offer begin/commit/rollback over the connection a facade executes on.
//! - Report whether a transaction is open and how many rows it changed.
//!
//! # Invariants
//! - A unit of work never switches to a different context.
//! - `pending_changes()` is `0` whenever no transaction is open.
//! - Changes are only counted for transactions opened by `begin()`.

use crate::context::DataContext;
use crate::db::DbError;
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type UnitOfWorkResult<T> = Result<T, UnitOfWorkError>;

#[derive(Debug)]
pub enum UnitOfWorkError {
    AlreadyActive,
    NotActive,
    /// A transaction is open but was not started by `begin()`.
    Untracked,
    Db(DbError),
}

impl Display for UnitOfWorkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyActive => write!(f, "a transaction is already open on this context"),
            Self::NotActive => write!(f, "no transaction is open on this context"),
            Self::Untracked => write!(
                f,
                "the open transaction was not started by this unit of work"
            ),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UnitOfWorkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AlreadyActive | Self::NotActive | Self::Untracked => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for UnitOfWorkError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for UnitOfWorkError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Commit/rollback wrapper bound to one `DataContext`.
#[derive(Debug)]
pub struct UnitOfWork {
    id: Uuid,
    context: DataContext,
}

impl UnitOfWork {
    pub fn new(context: DataContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            context,
        }
    }

    /// Log correlation id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn data_context(&self) -> &DataContext {
        &self.context
    }

    /// Opens an immediate transaction.
    ///
    /// # Errors
    /// - `AlreadyActive` when the connection is already inside a transaction.
    pub fn begin(&self) -> UnitOfWorkResult<()> {
        self.context.with_tracking(|conn, tracked| {
            if !conn.is_autocommit() {
                return Err(UnitOfWorkError::AlreadyActive);
            }
            let baseline = total_changes(conn)?;
            conn.execute_batch("BEGIN IMMEDIATE;")?;
            *tracked = Some(baseline);
            Ok(())
        })?;

        info!("event=uow_begin module=uow status=ok uow_id={}", self.id);
        Ok(())
    }

    /// Commits the open transaction.
    pub fn commit(&self) -> UnitOfWorkResult<()> {
        let changes = self.finish("COMMIT;")?;
        info!(
            "event=uow_commit module=uow status=ok uow_id={} changes={}",
            self.id,
            describe_changes(changes)
        );
        Ok(())
    }

    /// Discards every change made since `begin`.
    pub fn rollback(&self) -> UnitOfWorkResult<()> {
        let changes = self.finish("ROLLBACK;")?;
        info!(
            "event=uow_rollback module=uow status=ok uow_id={} discarded={}",
            self.id,
            describe_changes(changes)
        );
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.context.with_connection(|conn| !conn.is_autocommit())
    }

    /// Rows inserted, updated or deleted since `begin`.
    ///
    /// # Errors
    /// - `Untracked` when the open transaction was started some other way,
    ///   for example by a `BEGIN` command dispatched through the facade.
    pub fn pending_changes(&self) -> UnitOfWorkResult<u64> {
        self.context.with_tracking(|conn, tracked| {
            if conn.is_autocommit() {
                return Ok(0);
            }
            changes_since(conn, *tracked)?.ok_or(UnitOfWorkError::Untracked)
        })
    }

    /// Runs `work` inside a transaction: commit on `Ok`, rollback on `Err`.
    ///
    /// A failed commit (a deferred constraint, for instance) is rolled back
    /// too, so the context is never left inside the transaction. The error
    /// from `work` or from the commit is returned even when the rollback
    /// itself fails.
    pub fn transact<T, E>(&self, work: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<UnitOfWorkError>,
    {
        self.begin()?;
        match work() {
            Ok(value) => match self.commit() {
                Ok(()) => Ok(value),
                Err(commit_err) => {
                    self.rollback_after_failure();
                    Err(commit_err.into())
                }
            },
            Err(err) => {
                self.rollback_after_failure();
                Err(err)
            }
        }
    }

    fn rollback_after_failure(&self) {
        if let Err(rollback_err) = self.rollback() {
            warn!(
                "event=uow_rollback module=uow status=error uow_id={} error={}",
                self.id, rollback_err
            );
        }
    }

    // Ends whatever transaction is open, tracked or not. The context clears
    // the baseline once the connection is back in autocommit mode.
    fn finish(&self, statement: &str) -> UnitOfWorkResult<Option<u64>> {
        self.context.with_tracking(|conn, tracked| {
            if conn.is_autocommit() {
                return Err(UnitOfWorkError::NotActive);
            }
            let changes = changes_since(conn, *tracked)?;
            conn.execute_batch(statement)?;
            Ok(changes)
        })
    }
}

fn changes_since(conn: &Connection, baseline: Option<u64>) -> rusqlite::Result<Option<u64>> {
    match baseline {
        Some(baseline) => Ok(Some(total_changes(conn)?.saturating_sub(baseline))),
        None => Ok(None),
    }
}

fn describe_changes(changes: Option<u64>) -> String {
    changes.map_or_else(|| "untracked".to_string(), |count| count.to_string())
}

fn total_changes(conn: &Connection) -> rusqlite::Result<u64> {
    conn.query_row("SELECT total_changes();", [], |row| row.get::<_, i64>(0))
        .map(|changes| changes.max(0) as u64)
}
