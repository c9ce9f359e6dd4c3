//! Repository contract and SQLite-backed facade.
//!
//! # Responsibility
//! - Execute caller-built operations against one `DataContext`.
//! - Expose the unit of work that wraps that same context.
//!
//! # Invariants
//! - The context handle is fixed at construction.
//! - Sync dispatch runs on the caller's thread and returns operation errors
//!   unchanged.
//! - Async dispatch returns an already scheduled `PendingOperation`.
//!
//! # Concurrency
//! The context serializes access to its connection, but two async
//! dispatches against one facade complete in no guaranteed order. Callers
//! must not issue operations concurrently when they depend on ordering.

use super::pending::{schedule, PendingOperation};
use crate::context::DataContext;
use crate::db::DbError;
use crate::operation::{Command, Projection, Query, Scalar};
use crate::uow::UnitOfWork;
use log::{debug, error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Construction-time failure of a repository facade.
#[derive(Debug)]
pub enum RepoError {
    /// The context cannot serve queries (closed, corrupt, not a database).
    ContextUnavailable(String),
    /// A table the caller declared as required does not exist.
    MissingTable(String),
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContextUnavailable(reason) => {
                write!(f, "persistence context is unavailable: {reason}")
            }
            Self::MissingTable(table) => write!(f, "required table `{table}` does not exist"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ContextUnavailable(_) | Self::MissingTable(_) => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Uniform entry points for prebuilt operations.
pub trait Repository {
    /// Runs a command for its side effects.
    fn execute<C: Command>(&self, command: &C) -> Result<(), C::Error>;

    /// Runs a query that yields exactly one value.
    fn find_scalar<S: Scalar>(&self, query: &S) -> Result<S::Output, S::Error>;

    /// Runs a collection query.
    fn find<Q: Query>(&self, query: &Q) -> Result<Vec<Q::Item>, Q::Error>;

    /// Runs a query that selects entities and reshapes them.
    fn find_projected<P: Projection>(&self, query: &P) -> Result<Vec<P::Output>, P::Error>;

    /// Schedules `command` and returns at once; failures arrive through `TaskError`.
    fn execute_async<C>(&self, command: C) -> PendingOperation<(), C::Error>
    where
        C: Command + Send + 'static,
        C::Error: Send + 'static;

    /// Schedules a scalar query; the value or a `TaskError` arrives on await.
    fn find_scalar_async<S>(&self, query: S) -> PendingOperation<S::Output, S::Error>
    where
        S: Scalar + Send + 'static,
        S::Output: Send + 'static,
        S::Error: Send + 'static;

    /// Schedules a collection query; the rows or a `TaskError` arrive on await.
    fn find_async<Q>(&self, query: Q) -> PendingOperation<Vec<Q::Item>, Q::Error>
    where
        Q: Query + Send + 'static,
        Q::Item: Send + 'static,
        Q::Error: Send + 'static;

    /// Schedules a projection query; the reshaped rows or a `TaskError` arrive on await.
    fn find_projected_async<P>(&self, query: P) -> PendingOperation<Vec<P::Output>, P::Error>
    where
        P: Projection + Send + 'static,
        P::Output: Send + 'static,
        P::Error: Send + 'static;

    /// Unit of work wrapping this repository's context.
    fn context(&self) -> &UnitOfWork;
}

/// SQLite-backed repository facade.
#[derive(Debug)]
pub struct SqliteRepository {
    context: DataContext,
    unit_of_work: UnitOfWork,
}

impl SqliteRepository {
    /// Builds a facade after probing that `context` can serve queries.
    ///
    /// # Errors
    /// - `ContextUnavailable` when the readiness query fails.
    pub fn try_new(context: DataContext) -> RepoResult<Self> {
        Self::try_new_requiring(context, &[])
    }

    /// Builds a facade and checks that every table in `tables` exists.
    ///
    /// # Errors
    /// - `ContextUnavailable` when the readiness query fails.
    /// - `MissingTable` for the first absent table.
    pub fn try_new_requiring(context: DataContext, tables: &[&str]) -> RepoResult<Self> {
        if let Err(err) = context.with_connection(|conn| ensure_context_ready(conn, tables)) {
            error!(
                "event=repo_open module=repo status=error error_code=context_not_ready error={}",
                err
            );
            return Err(err);
        }

        let unit_of_work = UnitOfWork::new(context.clone());
        info!(
            "event=repo_open module=repo status=ok uow_id={} required_tables={}",
            unit_of_work.id(),
            tables.len()
        );

        Ok(Self {
            context,
            unit_of_work,
        })
    }

    /// Raw persistence context handle.
    pub fn data_context(&self) -> &DataContext {
        &self.context
    }

    fn trace_dispatch(&self, kind: &'static str, mode: &'static str) {
        debug!(
            "event=repo_dispatch module=repo kind={} mode={} uow_id={}",
            kind,
            mode,
            self.unit_of_work.id()
        );
    }
}

impl Repository for SqliteRepository {
    fn execute<C: Command>(&self, command: &C) -> Result<(), C::Error> {
        self.trace_dispatch("command", "sync");
        self.context.with_connection(|conn| command.execute(conn))
    }

    fn find_scalar<S: Scalar>(&self, query: &S) -> Result<S::Output, S::Error> {
        self.trace_dispatch("scalar", "sync");
        self.context.with_connection(|conn| query.execute(conn))
    }

    fn find<Q: Query>(&self, query: &Q) -> Result<Vec<Q::Item>, Q::Error> {
        self.trace_dispatch("query", "sync");
        self.context.with_connection(|conn| query.execute(conn))
    }

    fn find_projected<P: Projection>(&self, query: &P) -> Result<Vec<P::Output>, P::Error> {
        self.trace_dispatch("projection", "sync");
        self.context.with_connection(|conn| query.execute(conn))
    }

    fn execute_async<C>(&self, command: C) -> PendingOperation<(), C::Error>
    where
        C: Command + Send + 'static,
        C::Error: Send + 'static,
    {
        self.trace_dispatch("command", "async");
        let context = self.context.clone();
        schedule(move || context.with_connection(|conn| command.execute(conn)))
    }

    fn find_scalar_async<S>(&self, query: S) -> PendingOperation<S::Output, S::Error>
    where
        S: Scalar + Send + 'static,
        S::Output: Send + 'static,
        S::Error: Send + 'static,
    {
        self.trace_dispatch("scalar", "async");
        let context = self.context.clone();
        schedule(move || context.with_connection(|conn| query.execute(conn)))
    }

    fn find_async<Q>(&self, query: Q) -> PendingOperation<Vec<Q::Item>, Q::Error>
    where
        Q: Query + Send + 'static,
        Q::Item: Send + 'static,
        Q::Error: Send + 'static,
    {
        self.trace_dispatch("query", "async");
        let context = self.context.clone();
        schedule(move || context.with_connection(|conn| query.execute(conn)))
    }

    fn find_projected_async<P>(&self, query: P) -> PendingOperation<Vec<P::Output>, P::Error>
    where
        P: Projection + Send + 'static,
        P::Output: Send + 'static,
        P::Error: Send + 'static,
    {
        self.trace_dispatch("projection", "async");
        let context = self.context.clone();
        schedule(move || context.with_connection(|conn| query.execute(conn)))
    }

    fn context(&self) -> &UnitOfWork {
        &self.unit_of_work
    }
}

fn ensure_context_ready(conn: &Connection, tables: &[&str]) -> RepoResult<()> {
    // Reading the catalog forces SQLite to parse the file header.
    conn.query_row("SELECT COUNT(*) FROM sqlite_master;", [], |row| {
        row.get::<_, i64>(0)
    })
    .map_err(|err| RepoError::ContextUnavailable(err.to_string()))?;

    for table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingTable((*table).to_string()));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type IN ('table', 'view') AND name = ?1
        );",
        [table],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(exists == 1)
}
