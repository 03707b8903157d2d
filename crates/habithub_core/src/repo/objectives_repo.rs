//! Monthly objectives and their daily completion marks.
//!
//! # Invariants
//! - New objectives are appended: `order_index = max(order_index) + 1`, or 0
//!   for a month without objectives. A month whose maximum is `i32::MAX`
//!   rejects further appends instead of wrapping.
//! - `toggle_completion` reads and writes inside one transaction.

use super::{RepoError, RepoResult};
use crate::dao::HabitHubDao;
use crate::model::keys::{validate_date_key, validate_year_month_key};
use crate::model::records::{MonthlyObjective, ObjectiveCompletion, ObjectiveId};
use log::debug;
use std::sync::Arc;

pub struct ObjectivesRepository {
    dao: Arc<HabitHubDao>,
}

impl ObjectivesRepository {
    pub fn new(dao: Arc<HabitHubDao>) -> Self {
        Self { dao }
    }

    pub fn dao(&self) -> &Arc<HabitHubDao> {
        &self.dao
    }

    /// Objectives of one month (`YYYY-MM`) in display order.
    pub fn monthly_objectives(&self, year_month: &str) -> RepoResult<Vec<MonthlyObjective>> {
        validate_year_month_key(year_month)?;
        self.dao.read(|q| Ok(q.monthly_objectives(year_month)?))
    }

    pub fn daily_completions(&self, date: &str) -> RepoResult<Vec<ObjectiveCompletion>> {
        validate_date_key(date)?;
        self.dao.read(|q| Ok(q.daily_completions(date)?))
    }

    pub fn completion(
        &self,
        objective_id: ObjectiveId,
        date: &str,
    ) -> RepoResult<Option<ObjectiveCompletion>> {
        validate_date_key(date)?;
        self.dao.read(|q| Ok(q.completion(objective_id, date)?))
    }

    /// Appends a new objective to the month and returns it with its id.
    pub fn add_objective(&self, name: &str, year_month: &str) -> RepoResult<MonthlyObjective> {
        let name = normalize_name(name)?;
        validate_year_month_key(year_month)?;

        self.dao.write(|q| {
            let next_order = match q.max_order_index(year_month)? {
                Some(max_order) => max_order.checked_add(1).ok_or_else(|| {
                    RepoError::InvalidInput(format!(
                        "month {year_month} has no order index left after {max_order}"
                    ))
                })?,
                None => 0,
            };
            let mut objective = MonthlyObjective::new(name, year_month);
            objective.order_index = next_order;
            objective.id = q.insert_objective(&objective)?;
            Ok(objective)
        })
    }

    pub fn update_objective(&self, objective: &MonthlyObjective) -> RepoResult<()> {
        if !objective.is_persisted() {
            return Err(RepoError::InvalidInput(
                "objective must be persisted before update".to_string(),
            ));
        }
        let name = normalize_name(&objective.name)?;
        validate_year_month_key(&objective.year_month)?;
        let normalized = MonthlyObjective {
            name,
            ..objective.clone()
        };
        self.dao.write(|q| Ok(q.update_objective(&normalized)?))
    }

    /// Deletes the objective together with its completions.
    pub fn delete_objective(&self, objective: &MonthlyObjective) -> RepoResult<bool> {
        self.dao.write(|q| Ok(q.delete_objective(objective)?))
    }

    /// Flips the completion mark of one objective on one day.
    ///
    /// - no mark: stores a completed mark
    /// - completed mark: removes it
    /// - non-completed mark: marks it completed
    ///
    /// Returns whether the objective is completed afterwards.
    pub fn toggle_completion(&self, objective_id: ObjectiveId, date: &str) -> RepoResult<bool> {
        validate_date_key(date)?;

        let completed = self.dao.write(|q| {
            if q.objective(objective_id)?.is_none() {
                return Err(RepoError::NotFound(objective_id));
            }

            match q.completion(objective_id, date)? {
                Some(existing) if existing.is_completed => {
                    q.delete_completion_by_key(objective_id, date)?;
                    Ok(false)
                }
                Some(existing) => {
                    q.upsert_completion(&ObjectiveCompletion {
                        is_completed: true,
                        ..existing
                    })?;
                    Ok(true)
                }
                None => {
                    q.upsert_completion(&ObjectiveCompletion::completed(objective_id, date))?;
                    Ok(true)
                }
            }
        })?;

        debug!(
            "event=completion_toggle module=repo status=ok objective_id={} completed={}",
            objective_id, completed
        );
        Ok(completed)
    }
}

fn normalize_name(name: &str) -> RepoResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidInput(
            "objective name cannot be blank".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
