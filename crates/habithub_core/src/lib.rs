//! Core services for HabitHub.
//! Owns storage, the feature repositories, and the provisioning graph that
//! builds each of them once per process.

pub mod context;
pub mod dao;
pub mod db;
pub mod di;
pub mod logging;
pub mod model;
pub mod repo;

pub use context::{AppContext, ContextError, StorageLocation};
pub use dao::{DaoError, DaoQueries, DaoResult, HabitHubDao};
pub use db::{DbError, DbResult, HabitHubDatabase};
pub use di::app_module::AppComponent;
pub use di::graph::{
    FactoryError, ProvisionError, ProvisionResult, ProvisionState, ProvisioningGraph, TypeKey,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::keys::{date_key, year_month_key, KeyError};
pub use model::records::{
    DailyCompletionCount, DailyNote, MonthlyObjective, ObjectiveCompletion, ObjectiveId,
};
pub use repo::calendar_repo::MonthlyCalendarRepository;
pub use repo::objectives_repo::ObjectivesRepository;
pub use repo::progress_repo::ProgressRepository;
pub use repo::{RepoError, RepoResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
