//! Feature repositories over the shared record accessor.
//!
//! # Responsibility
//! - Narrow `HabitHubDao` to the operations of one feature area each.
//! - Validate date and year-month keys before they reach SQL.
//!
//! # Invariants
//! - Every repository holds the process-wide `Arc<HabitHubDao>`; none owns a
//!   connection of its own.
//! - Multi-step mutations run inside a single DAO transaction.

pub mod calendar_repo;
pub mod objectives_repo;
pub mod progress_repo;

use crate::dao::DaoError;
use crate::model::keys::KeyError;
use crate::model::records::ObjectiveId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    InvalidKey(KeyError),
    InvalidInput(String),
    NotFound(ObjectiveId),
    Dao(DaoError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(err) => write!(f, "{err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotFound(id) => write!(f, "objective not found: {id}"),
            Self::Dao(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidKey(err) => Some(err),
            Self::Dao(err) => Some(err),
            Self::InvalidInput(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<KeyError> for RepoError {
    fn from(value: KeyError) -> Self {
        Self::InvalidKey(value)
    }
}

impl From<DaoError> for RepoError {
    fn from(value: DaoError) -> Self {
        match value {
            DaoError::ObjectiveNotFound(id) => Self::NotFound(id),
            other => Self::Dao(other),
        }
    }
}
