//! Monthly statistics for progress charts.

use super::RepoResult;
use crate::dao::HabitHubDao;
use crate::model::keys::validate_year_month_key;
use crate::model::records::{
    DailyCompletionCount, MonthlyObjective, ObjectiveCompletion, ObjectiveId,
};
use std::sync::Arc;

pub struct ProgressRepository {
    dao: Arc<HabitHubDao>,
}

impl ProgressRepository {
    pub fn new(dao: Arc<HabitHubDao>) -> Self {
        Self { dao }
    }

    pub fn dao(&self) -> &Arc<HabitHubDao> {
        &self.dao
    }

    pub fn monthly_objectives(&self, year_month: &str) -> RepoResult<Vec<MonthlyObjective>> {
        validate_year_month_key(year_month)?;
        self.dao.read(|q| Ok(q.monthly_objectives(year_month)?))
    }

    /// Completed objectives per day of the month, ordered by date.
    ///
    /// Only completions of this month's objectives count; a month without
    /// objectives yields an empty list.
    pub fn monthly_completion_counts(
        &self,
        year_month: &str,
    ) -> RepoResult<Vec<DailyCompletionCount>> {
        validate_year_month_key(year_month)?;
        self.dao.read(|q| {
            let ids = objective_ids(&q.monthly_objectives(year_month)?);
            Ok(q.monthly_completion_counts(&ids, year_month)?)
        })
    }

    /// Every completion row of this month's objectives, ordered by date.
    pub fn monthly_completions(&self, year_month: &str) -> RepoResult<Vec<ObjectiveCompletion>> {
        validate_year_month_key(year_month)?;
        self.dao.read(|q| {
            let ids = objective_ids(&q.monthly_objectives(year_month)?);
            Ok(q.monthly_completions(&ids, year_month)?)
        })
    }
}

fn objective_ids(objectives: &[MonthlyObjective]) -> Vec<ObjectiveId> {
    objectives.iter().map(|objective| objective.id).collect()
}
