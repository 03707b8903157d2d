//! Daily notes shown on the monthly calendar.

use super::RepoResult;
use crate::dao::HabitHubDao;
use crate::model::keys::{validate_date_key, validate_year_month_key};
use crate::model::records::DailyNote;
use std::sync::Arc;

pub struct MonthlyCalendarRepository {
    dao: Arc<HabitHubDao>,
}

impl MonthlyCalendarRepository {
    pub fn new(dao: Arc<HabitHubDao>) -> Self {
        Self { dao }
    }

    pub fn dao(&self) -> &Arc<HabitHubDao> {
        &self.dao
    }

    pub fn daily_note(&self, date: &str) -> RepoResult<Option<DailyNote>> {
        validate_date_key(date)?;
        self.dao.read(|q| Ok(q.daily_note(date)?))
    }

    /// Notes of one month, ordered by date.
    pub fn monthly_notes(&self, year_month: &str) -> RepoResult<Vec<DailyNote>> {
        validate_year_month_key(year_month)?;
        self.dao.read(|q| Ok(q.monthly_notes(year_month)?))
    }

    /// Stores the note, replacing the one already saved for that day.
    pub fn save_daily_note(&self, note: &DailyNote) -> RepoResult<()> {
        validate_date_key(&note.date)?;
        self.dao.write(|q| Ok(q.upsert_daily_note(note)?))
    }

    /// Returns whether a note existed for that day.
    pub fn delete_daily_note(&self, note: &DailyNote) -> RepoResult<bool> {
        validate_date_key(&note.date)?;
        self.dao.write(|q| Ok(q.delete_daily_note(note)?))
    }
}
