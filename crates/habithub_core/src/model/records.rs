//! Persisted habit records.

use serde::{Deserialize, Serialize};

/// Row id of a monthly objective.
pub type ObjectiveId = i64;

/// Free-form note attached to one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyNote {
    /// Day key, `YYYY-MM-DD`. Primary key.
    pub date: String,
    pub note: String,
    /// Optional mood label; empty when unset.
    #[serde(default)]
    pub mood: String,
}

impl DailyNote {
    pub fn new(date: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            note: note.into(),
            mood: String::new(),
        }
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = mood.into();
        self
    }
}

/// Habit the user tracks during one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyObjective {
    /// `0` until persisted; storage assigns the real id.
    pub id: ObjectiveId,
    pub name: String,
    /// Month key, `YYYY-MM`.
    pub year_month: String,
    /// User-defined display order inside the month.
    pub order_index: i32,
}

impl MonthlyObjective {
    /// Unsaved objective at order position 0.
    pub fn new(name: impl Into<String>, year_month: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            year_month: year_month.into(),
            order_index: 0,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

/// Completion mark of one objective on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveCompletion {
    pub objective_id: ObjectiveId,
    /// Day key, `YYYY-MM-DD`.
    pub date: String,
    pub is_completed: bool,
}

impl ObjectiveCompletion {
    pub fn completed(objective_id: ObjectiveId, date: impl Into<String>) -> Self {
        Self {
            objective_id,
            date: date.into(),
            is_completed: true,
        }
    }
}

/// Number of completed objectives on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCompletionCount {
    pub date: String,
    pub count: u32,
}
