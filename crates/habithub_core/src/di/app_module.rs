//! Application wiring: which factory builds which shared service.
//!
//! # Responsibility
//! - Register the application context, database, record accessor and the
//!   three feature repositories in dependency order.
//! - Expose the resulting graph through a typed, cloneable handle.
//!
//! # Invariants
//! - Context -> database -> DAO -> {calendar, objectives, progress}.
//! - Every repository shares the same DAO, which shares the same database.
//! - Wiring is validated before the component is handed out.

use super::graph::{ProvisionResult, ProvisioningGraph};
use crate::context::AppContext;
use crate::dao::HabitHubDao;
use crate::db::HabitHubDatabase;
use crate::repo::calendar_repo::MonthlyCalendarRepository;
use crate::repo::objectives_repo::ObjectivesRepository;
use crate::repo::progress_repo::ProgressRepository;
use log::{error, info};
use std::convert::Infallible;
use std::sync::Arc;

/// Registers every HabitHub provider on `graph`.
pub fn install(graph: &mut ProvisioningGraph, context: AppContext) -> ProvisionResult<()> {
    graph.register_instance(context)?;
    graph.register(|context: Arc<AppContext>| HabitHubDatabase::open(&context))?;
    graph.register(|database: Arc<HabitHubDatabase>| {
        Ok::<_, Infallible>(database.habit_hub_dao())
    })?;
    graph.register(|dao: Arc<HabitHubDao>| {
        Ok::<_, Infallible>(MonthlyCalendarRepository::new(dao))
    })?;
    graph.register(|dao: Arc<HabitHubDao>| Ok::<_, Infallible>(ObjectivesRepository::new(dao)))?;
    graph.register(|dao: Arc<HabitHubDao>| Ok::<_, Infallible>(ProgressRepository::new(dao)))?;
    Ok(())
}

/// Process-wide service handle owned by the startup routine.
///
/// Cloning is cheap; every clone resolves from the same graph.
#[derive(Debug, Clone)]
pub struct AppComponent {
    graph: Arc<ProvisioningGraph>,
}

impl AppComponent {
    /// Installs the application providers and validates the wiring.
    ///
    /// Nothing is constructed yet; the database opens on first use.
    ///
    /// # Errors
    /// - Returns a configuration error when wiring is incomplete or cyclic.
    pub fn new(context: AppContext) -> ProvisionResult<Self> {
        let mut graph = ProvisioningGraph::new();
        install(&mut graph, context)?;
        Self::from_graph(graph)
    }

    /// Wraps a caller-assembled graph after validating it.
    pub fn from_graph(graph: ProvisioningGraph) -> ProvisionResult<Self> {
        if let Err(err) = graph.validate() {
            error!(
                "event=app_component_init module=di status=error error_code=invalid_wiring error={}",
                err
            );
            return Err(err);
        }
        info!(
            "event=app_component_init module=di status=ok provided_types={}",
            graph.provided_types().len()
        );
        Ok(Self {
            graph: Arc::new(graph),
        })
    }

    pub fn graph(&self) -> &Arc<ProvisioningGraph> {
        &self.graph
    }

    pub fn context(&self) -> ProvisionResult<Arc<AppContext>> {
        self.graph.resolve()
    }

    pub fn database(&self) -> ProvisionResult<Arc<HabitHubDatabase>> {
        self.graph.resolve()
    }

    pub fn dao(&self) -> ProvisionResult<Arc<HabitHubDao>> {
        self.graph.resolve()
    }

    pub fn monthly_calendar_repository(&self) -> ProvisionResult<Arc<MonthlyCalendarRepository>> {
        self.graph.resolve()
    }

    pub fn objectives_repository(&self) -> ProvisionResult<Arc<ObjectivesRepository>> {
        self.graph.resolve()
    }

    pub fn progress_repository(&self) -> ProvisionResult<Arc<ProgressRepository>> {
        self.graph.resolve()
    }

    /// Constructs every provided service now instead of on first use.
    pub fn warm_up(&self) -> ProvisionResult<()> {
        self.monthly_calendar_repository()?;
        self.objectives_repository()?;
        self.progress_repository()?;
        Ok(())
    }
}
