//! Repository facade over prebuilt operations.
//!
//! # Responsibility
//! - Dispatch commands and queries to the held persistence context.
//! - Offer blocking and non-blocking forms of every dispatch.
//!
//! # Invariants
//! - The facade never validates, retries, wraps or logs operation errors.
//! - Each facade owns exactly one unit of work over its own context.

mod pending;
pub mod repository;

pub use pending::{PendingOperation, TaskError};
pub use repository::{RepoError, RepoResult, Repository, SqliteRepository};
