//! SQLite storage bootstrap, schema migration, and the persistence handle.
//!
//! # Responsibility
//! - Open and configure SQLite connections for HabitHub core.
//! - Apply schema migrations in deterministic order.
//! - Own the single shared connection behind `HabitHubDatabase`.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod database;
pub mod migrations;
mod open;

pub use database::{HabitHubDatabase, DATABASE_FILE_NAME};
pub use open::{open_db, open_db_in_memory, SchemaPolicy};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    CreateDataDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::CreateDataDir { path, source } => write!(
                f,
                "failed to create data directory `{}`: {source}",
                path.display()
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::CreateDataDir { source, .. } => Some(source),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
