//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas from `OpenOptions`.
//! - Trigger schema migrations before returning a usable context.
//!
//! # Invariants
//! - Returned contexts have `foreign_keys` set as requested.
//! - Returned contexts have migrations fully applied.

use super::migrations::{apply_migrations, Migration};
use super::DbResult;
use crate::context::DataContext;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection-level settings applied before a context is handed out.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Enables `PRAGMA foreign_keys`.
    pub foreign_keys: bool,
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// Schema steps owned by the application; may be empty.
    pub migrations: &'static [Migration],
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            foreign_keys: true,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            migrations: &[],
        }
    }
}

impl OpenOptions {
    pub fn with_migrations(migrations: &'static [Migration]) -> Self {
        Self {
            migrations,
            ..Self::default()
        }
    }
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, options: &OpenOptions) -> DbResult<DataContext> {
    open_with("file", options, || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory(options: &OpenOptions) -> DbResult<DataContext> {
    open_with("memory", options, Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    options: &OpenOptions,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<DataContext> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, options) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(DataContext::new(conn))
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, options: &OpenOptions) -> DbResult<()> {
    let foreign_keys = if options.foreign_keys { "ON" } else { "OFF" };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
    conn.busy_timeout(options.busy_timeout)?;
    apply_migrations(conn, options.migrations)?;
    Ok(())
}
