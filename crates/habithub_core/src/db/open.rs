//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::{apply_migrations, current_user_version, latest_version, reset_schema};
use super::{DbError, DbResult};
use log::{error, info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// What to do when the stored schema is newer than this binary supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaPolicy {
    /// Refuse to open with `DbError::UnsupportedSchemaVersion`.
    #[default]
    Strict,
    /// Drop all HabitHub tables and rebuild the schema from scratch.
    DestructiveFallback,
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, policy: SchemaPolicy) -> DbResult<Connection> {
    open_with("file", policy, || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory(policy: SchemaPolicy) -> DbResult<Connection> {
    open_with("memory", policy, Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    policy: SchemaPolicy,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match connect() {
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

    match bootstrap_connection(&mut conn, policy) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
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

fn bootstrap_connection(conn: &mut Connection, policy: SchemaPolicy) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;

    match apply_migrations(conn) {
        Err(DbError::UnsupportedSchemaVersion { db_version, .. })
            if policy == SchemaPolicy::DestructiveFallback =>
        {
            warn!(
                "event=db_reset module=db status=start db_version={} latest_supported={}",
                db_version,
                latest_version()
            );
            reset_schema(conn)?;
            apply_migrations(conn)?;
            info!(
                "event=db_reset module=db status=ok user_version={}",
                current_user_version(conn)?
            );
            Ok(())
        }
        other => other,
    }
}
