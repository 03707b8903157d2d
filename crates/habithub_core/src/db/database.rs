//! The HabitHub persistence handle.
//!
//! # Responsibility
//! - Open the application database described by an `AppContext`.
//! - Hand out the record accessor bound to this handle.
//!
//! # Invariants
//! - Exactly one SQLite connection per handle, guarded by a mutex.
//! - A poisoned lock is recovered; the interrupted transaction was already
//!   rolled back when its guard dropped.

use super::open::{open_db, open_db_in_memory, SchemaPolicy};
use super::{DbError, DbResult};
use crate::context::{AppContext, StorageLocation};
use crate::dao::HabitHubDao;
use log::warn;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// File name of the on-disk database inside the data directory.
pub const DATABASE_FILE_NAME: &str = "habithub_database.sqlite3";

/// Opened, migrated storage engine shared by the whole process.
#[derive(Debug)]
pub struct HabitHubDatabase {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl HabitHubDatabase {
    /// Opens the database described by `context`, creating the data
    /// directory when needed.
    ///
    /// # Side effects
    /// - Creates `data_dir` on disk for file storage.
    /// - Applies migrations, resetting the schema when the context allows a
    ///   destructive fallback and the stored schema is too new.
    pub fn open(context: &AppContext) -> DbResult<Self> {
        let policy = if context.allows_destructive_migration() {
            SchemaPolicy::DestructiveFallback
        } else {
            SchemaPolicy::Strict
        };

        match context.storage() {
            StorageLocation::File { data_dir } => {
                std::fs::create_dir_all(data_dir).map_err(|source| DbError::CreateDataDir {
                    path: data_dir.clone(),
                    source,
                })?;
                let path = data_dir.join(DATABASE_FILE_NAME);
                let conn = open_db(&path, policy)?;
                Ok(Self::from_connection(conn, Some(path)))
            }
            StorageLocation::InMemory => {
                let conn = open_db_in_memory(policy)?;
                Ok(Self::from_connection(conn, None))
            }
        }
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection, path: Option<PathBuf>) -> Self {
        Self {
            conn: Mutex::new(conn),
            path,
        }
    }

    /// Database file path; `None` for in-memory storage.
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Returns the record accessor bound to this handle.
    pub fn habit_hub_dao(self: &Arc<Self>) -> HabitHubDao {
        HabitHubDao::new(Arc::clone(self))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("event=db_lock module=db status=recovered reason=poisoned");
            poisoned.into_inner()
        })
    }
}
