//! SQL statements behind `HabitHubDao`.

use super::{DaoError, DaoResult};
use crate::model::records::{
    DailyCompletionCount, DailyNote, MonthlyObjective, ObjectiveCompletion, ObjectiveId,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const OBJECTIVE_SELECT_SQL: &str = "SELECT id, name, year_month, order_index FROM monthly_objectives";
const COMPLETION_SELECT_SQL: &str =
    "SELECT objective_id, date, is_completed FROM objective_completions";

/// Statements bound to a locked connection or an open transaction.
pub struct DaoQueries<'conn> {
    conn: &'conn Connection,
}

impl<'conn> DaoQueries<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    // Daily notes

    pub fn daily_note(&self, date: &str) -> DaoResult<Option<DailyNote>> {
        let note = self
            .conn
            .query_row(
                "SELECT date, note, mood FROM daily_notes WHERE date = ?1;",
                [date],
                parse_daily_note_row,
            )
            .optional()?;
        Ok(note)
    }

    /// Notes whose date starts with `year_month`, ordered by date.
    pub fn monthly_notes(&self, year_month: &str) -> DaoResult<Vec<DailyNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, note, mood
             FROM daily_notes
             WHERE date LIKE ?1 || '%'
             ORDER BY date ASC;",
        )?;
        let rows = stmt.query_map([year_month], parse_daily_note_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Inserts the note, replacing any note stored for the same date.
    pub fn upsert_daily_note(&self, note: &DailyNote) -> DaoResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO daily_notes (date, note, mood) VALUES (?1, ?2, ?3);",
            params![note.date, note.note, note.mood],
        )?;
        Ok(())
    }

    /// Returns whether a row was removed.
    pub fn delete_daily_note(&self, note: &DailyNote) -> DaoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM daily_notes WHERE date = ?1;", [&note.date])?;
        Ok(changed > 0)
    }

    // Monthly objectives

    /// Objectives of one month ordered by `order_index`.
    pub fn monthly_objectives(&self, year_month: &str) -> DaoResult<Vec<MonthlyObjective>> {
        let mut stmt = self.conn.prepare(&format!(
            "{OBJECTIVE_SELECT_SQL}
             WHERE year_month = ?1
             ORDER BY order_index ASC, id ASC;"
        ))?;
        let rows = stmt.query_map([year_month], parse_objective_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn objective(&self, id: ObjectiveId) -> DaoResult<Option<MonthlyObjective>> {
        let objective = self
            .conn
            .query_row(
                &format!("{OBJECTIVE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_objective_row,
            )
            .optional()?;
        Ok(objective)
    }

    /// Inserts or replaces an objective and returns its row id.
    ///
    /// An id of `0` lets storage assign a fresh id.
    pub fn insert_objective(&self, objective: &MonthlyObjective) -> DaoResult<ObjectiveId> {
        let id = objective.is_persisted().then_some(objective.id);
        self.conn.execute(
            "INSERT OR REPLACE INTO monthly_objectives (id, name, year_month, order_index)
             VALUES (?1, ?2, ?3, ?4);",
            params![id, objective.name, objective.year_month, objective.order_index],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_objective(&self, objective: &MonthlyObjective) -> DaoResult<()> {
        let changed = self.conn.execute(
            "UPDATE monthly_objectives
             SET name = ?2, year_month = ?3, order_index = ?4
             WHERE id = ?1;",
            params![
                objective.id,
                objective.name,
                objective.year_month,
                objective.order_index
            ],
        )?;
        if changed == 0 {
            return Err(DaoError::ObjectiveNotFound(objective.id));
        }
        Ok(())
    }

    /// Deletes the objective and, through the foreign key, its completions.
    pub fn delete_objective(&self, objective: &MonthlyObjective) -> DaoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM monthly_objectives WHERE id = ?1;",
            [objective.id],
        )?;
        Ok(changed > 0)
    }

    /// Highest `order_index` in the month; `None` for an empty month.
    pub fn max_order_index(&self, year_month: &str) -> DaoResult<Option<i32>> {
        let max = self.conn.query_row(
            "SELECT MAX(order_index) FROM monthly_objectives WHERE year_month = ?1;",
            [year_month],
            |row| row.get::<_, Option<i32>>(0),
        )?;
        Ok(max)
    }

    // Objective completions

    pub fn completion(
        &self,
        objective_id: ObjectiveId,
        date: &str,
    ) -> DaoResult<Option<ObjectiveCompletion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLETION_SELECT_SQL} WHERE objective_id = ?1 AND date = ?2;"
        ))?;
        let mut rows = stmt.query(params![objective_id, date])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_completion_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn daily_completions(&self, date: &str) -> DaoResult<Vec<ObjectiveCompletion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLETION_SELECT_SQL} WHERE date = ?1 ORDER BY objective_id ASC;"
        ))?;
        let mut rows = stmt.query([date])?;
        let mut completions = Vec::new();
        while let Some(row) = rows.next()? {
            completions.push(parse_completion_row(row)?);
        }
        Ok(completions)
    }

    /// Completions of the given objectives within one month, ordered by date.
    pub fn monthly_completions(
        &self,
        objective_ids: &[ObjectiveId],
        year_month: &str,
    ) -> DaoResult<Vec<ObjectiveCompletion>> {
        if objective_ids.is_empty() {
            return Ok(Vec::new());
        }

        let (placeholders, mut bind_values) = id_bindings(objective_ids);
        bind_values.push(Value::Text(year_month.to_string()));
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLETION_SELECT_SQL}
             WHERE objective_id IN ({placeholders})
               AND date LIKE ? || '%'
             ORDER BY date ASC, objective_id ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut completions = Vec::new();
        while let Some(row) = rows.next()? {
            completions.push(parse_completion_row(row)?);
        }
        Ok(completions)
    }

    /// Inserts the completion, replacing any row with the same key.
    pub fn upsert_completion(&self, completion: &ObjectiveCompletion) -> DaoResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO objective_completions (objective_id, date, is_completed)
             VALUES (?1, ?2, ?3);",
            params![
                completion.objective_id,
                completion.date,
                bool_to_int(completion.is_completed)
            ],
        )?;
        Ok(())
    }

    pub fn delete_completion_by_key(
        &self,
        objective_id: ObjectiveId,
        date: &str,
    ) -> DaoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM objective_completions WHERE objective_id = ?1 AND date = ?2;",
            params![objective_id, date],
        )?;
        Ok(changed > 0)
    }

    // Statistics

    /// Completed-row count per day for the given objectives within a month.
    pub fn monthly_completion_counts(
        &self,
        objective_ids: &[ObjectiveId],
        year_month: &str,
    ) -> DaoResult<Vec<DailyCompletionCount>> {
        if objective_ids.is_empty() {
            return Ok(Vec::new());
        }

        let (placeholders, mut bind_values) = id_bindings(objective_ids);
        bind_values.push(Value::Text(year_month.to_string()));
        let mut stmt = self.conn.prepare(&format!(
            "SELECT date, COUNT(*) AS count
             FROM objective_completions
             WHERE objective_id IN ({placeholders})
               AND date LIKE ? || '%'
               AND is_completed = 1
             GROUP BY date
             ORDER BY date ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next()? {
            let raw: i64 = row.get("count")?;
            let count = u32::try_from(raw).map_err(|_| {
                DaoError::InvalidData(format!("invalid completion count `{raw}`"))
            })?;
            counts.push(DailyCompletionCount {
                date: row.get("date")?,
                count,
            });
        }
        Ok(counts)
    }
}

fn parse_daily_note_row(row: &Row<'_>) -> rusqlite::Result<DailyNote> {
    Ok(DailyNote {
        date: row.get("date")?,
        note: row.get("note")?,
        mood: row.get("mood")?,
    })
}

fn parse_objective_row(row: &Row<'_>) -> rusqlite::Result<MonthlyObjective> {
    Ok(MonthlyObjective {
        id: row.get("id")?,
        name: row.get("name")?,
        year_month: row.get("year_month")?,
        order_index: row.get("order_index")?,
    })
}

fn parse_completion_row(row: &Row<'_>) -> DaoResult<ObjectiveCompletion> {
    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(DaoError::InvalidData(format!(
                "invalid is_completed value `{other}` in objective_completions.is_completed"
            )));
        }
    };
    Ok(ObjectiveCompletion {
        objective_id: row.get("objective_id")?,
        date: row.get("date")?,
        is_completed,
    })
}

fn id_bindings(ids: &[ObjectiveId]) -> (String, Vec<Value>) {
    let placeholders = vec!["?"; ids.len()].join(", ");
    let values = ids.iter().map(|id| Value::Integer(*id)).collect();
    (placeholders, values)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
