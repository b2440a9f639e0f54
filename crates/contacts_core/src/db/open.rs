//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open one file-backed SQLite connection per logical operation.
//! - Configure connection pragmas required by core behavior.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout, so a
//!   concurrent writer lock is waited on instead of failing immediately.
//! - Schema shape is not checked here; callers run `ensure_schema` at startup.

use super::DbResult;
use log::{debug, error};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the contacts database file, creating it when missing.
///
/// # Side effects
/// - Emits `db_open` logging events; failures are logged at error level.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let path = path.as_ref();

    let conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error path={} duration_ms={} error_code=db_open_failed error={}",
                path.display(),
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    if let Err(err) = configure_connection(&conn) {
        error!(
            "event=db_open module=db status=error path={} duration_ms={} error_code=db_configure_failed error={}",
            path.display(),
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err.into());
    }

    debug!(
        "event=db_open module=db status=ok path={} duration_ms={}",
        path.display(),
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}
