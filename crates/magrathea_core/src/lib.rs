//! Repository facade over a SQLite persistence context.
//!
//! Callers build command and query objects; a `SqliteRepository` runs them
//! against its `DataContext`, on the caller's thread or on tokio's blocking
//! pool.

pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod operation;
pub mod repo;
pub mod uow;

pub use context::DataContext;
pub use db::{open_db, open_db_in_memory, DbError, DbResult, Migration, OpenOptions};
pub use logging::{
    default_log_level, init_logging, logging_status, LoggingConfig, LoggingError,
};
pub use model::schema::SchemaObject;
pub use operation::{
    Command, Entity, EntityQuery, ProjectedQuery, Projection, Query, Scalar, SqlCommand,
    SqlScalar,
};
pub use repo::{
    PendingOperation, RepoError, RepoResult, Repository, SqliteRepository, TaskError,
};
pub use uow::{UnitOfWork, UnitOfWorkError, UnitOfWorkResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
