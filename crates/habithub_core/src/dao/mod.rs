//! Record accessor over the HabitHub database.
//!
//! # Responsibility
//! - Serialize access to the shared connection owned by `HabitHubDatabase`.
//! - Run grouped writes inside one immediate transaction.
//!
//! # Invariants
//! - `write` commits only when the closure returns `Ok`; any error rolls
//!   back every statement issued inside it.
//! - The accessor never validates key formats; repositories do.

mod queries;

pub use queries::DaoQueries;

use crate::db::{DbError, HabitHubDatabase};
use crate::model::records::ObjectiveId;
use rusqlite::TransactionBehavior;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type DaoResult<T> = Result<T, DaoError>;

#[derive(Debug)]
pub enum DaoError {
    Db(DbError),
    ObjectiveNotFound(ObjectiveId),
    InvalidData(String),
}

impl Display for DaoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ObjectiveNotFound(id) => write!(f, "objective not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted habit data: {message}"),
        }
    }
}

impl Error for DaoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ObjectiveNotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for DaoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DaoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query/command surface shared by every repository.
#[derive(Debug)]
pub struct HabitHubDao {
    database: Arc<HabitHubDatabase>,
}

impl HabitHubDao {
    pub(crate) fn new(database: Arc<HabitHubDatabase>) -> Self {
        Self { database }
    }

    /// The persistence handle this accessor was obtained from.
    pub fn database(&self) -> &Arc<HabitHubDatabase> {
        &self.database
    }

    /// Runs read queries while holding the connection lock.
    pub fn read<T, E>(&self, f: impl FnOnce(&DaoQueries<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DaoError>,
    {
        let conn = self.database.lock();
        f(&DaoQueries::new(&conn))
    }

    /// Runs statements in one immediate transaction.
    ///
    /// Commits when `f` succeeds; rolls back otherwise.
    pub fn write<T, E>(&self, f: impl FnOnce(&DaoQueries<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DaoError>,
    {
        let mut conn = self.database.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| E::from(DaoError::from(err)))?;
        let value = f(&DaoQueries::new(&tx))?;
        tx.commit().map_err(|err| E::from(DaoError::from(err)))?;
        Ok(value)
    }
}
