//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose HabitHub repository operations to Dart via FRB.
//! - Own the process-wide `AppComponent` created by `init_app`.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - `init_app` binds one data directory per process; every later call
//!   resolves services from that same component.
//! - Failures are reported through response envelopes, never by unwinding.

use habithub_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppComponent, AppContext, DailyCompletionCount, DailyNote, MonthlyCalendarRepository,
    MonthlyObjective, ObjectiveCompletion, ObjectivesRepository, ProgressRepository,
    ProvisionResult,
};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

static APP: OnceLock<AppHandle> = OnceLock::new();

struct AppHandle {
    data_dir: PathBuf,
    component: AppComponent,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Binds the application data directory and builds the service component.
///
/// Nothing is opened yet; the database is created on the first repository
/// call.
///
/// # FFI contract
/// - Idempotent for the same `data_dir`.
/// - A different `data_dir` after the first success is rejected.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_app(data_dir: String) -> String {
    let requested = PathBuf::from(data_dir.trim());
    if let Some(active) = APP.get() {
        return same_data_dir(active, &requested);
    }

    let context = match AppContext::with_data_dir(&requested) {
        Ok(context) => context,
        Err(err) => return format!("init_app failed: {err}"),
    };
    let component = match AppComponent::new(context) {
        Ok(component) => component,
        Err(err) => {
            error!(
                "event=ffi_init_app module=ffi status=error error={}",
                err
            );
            return format!("init_app failed: {err}");
        }
    };

    let active = APP.get_or_init(|| {
        info!(
            "event=ffi_init_app module=ffi status=ok data_dir={}",
            requested.display()
        );
        AppHandle {
            data_dir: requested.clone(),
            component,
        }
    });
    same_data_dir(active, &requested)
}

/// Daily note projection for Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyNoteItem {
    /// Day key, `YYYY-MM-DD`.
    pub date: String,
    pub note: String,
    /// Empty when unset.
    pub mood: String,
}

/// Monthly objective projection for Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectiveItem {
    pub id: i64,
    pub name: String,
    /// Month key, `YYYY-MM`.
    pub year_month: String,
    pub order_index: i32,
}

/// Completion mark of one objective on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub objective_id: i64,
    pub date: String,
    pub is_completed: bool,
}

/// Completed-objective count for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCountItem {
    pub date: String,
    pub count: u32,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Delete envelope; `deleted` is false when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResponse {
    pub ok: bool,
    pub deleted: bool,
    pub message: String,
}

impl DeleteResponse {
    fn from_result(result: Result<bool, String>, operation: &str) -> Self {
        match result {
            Ok(true) => Self {
                ok: true,
                deleted: true,
                message: "Deleted.".to_string(),
            },
            Ok(false) => Self {
                ok: true,
                deleted: false,
                message: "Nothing to delete.".to_string(),
            },
            Err(err) => Self {
                ok: false,
                deleted: false,
                message: format!("{operation} failed: {err}"),
            },
        }
    }
}

/// Month of notes, ordered by date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesResponse {
    pub ok: bool,
    pub items: Vec<DailyNoteItem>,
    pub message: String,
}

/// Completion rows for a day or a month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionsResponse {
    pub ok: bool,
    pub items: Vec<CompletionItem>,
    pub message: String,
}

/// Single-note lookup envelope. `note` is `None` when the day has no note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteResponse {
    pub ok: bool,
    pub note: Option<DailyNoteItem>,
    pub message: String,
}

/// Objective list or creation envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectivesResponse {
    pub ok: bool,
    pub items: Vec<ObjectiveItem>,
    pub message: String,
}

/// Completion toggle envelope; `completed` is the state after the toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleResponse {
    pub ok: bool,
    pub completed: bool,
    pub message: String,
}

/// Monthly statistics envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCountsResponse {
    pub ok: bool,
    pub items: Vec<CompletionCountItem>,
    pub message: String,
}

/// Saves the note for one day, replacing any previous note.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_save_note(date: String, note: String, mood: Option<String>) -> ActionResponse {
    let note = DailyNote::new(date.trim(), note).with_mood(mood.unwrap_or_default());
    match with_repo(|component| component.monthly_calendar_repository()).and_then(
        |repo: Arc<MonthlyCalendarRepository>| {
            repo.save_daily_note(&note).map_err(|err| err.to_string())
        },
    ) {
        Ok(()) => ActionResponse::success("Note saved."),
        Err(err) => ActionResponse::failure(format!("calendar_save_note failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn calendar_get_note(date: String) -> NoteResponse {
    match with_repo(|component| component.monthly_calendar_repository()).and_then(
        |repo: Arc<MonthlyCalendarRepository>| {
            repo.daily_note(date.trim()).map_err(|err| err.to_string())
        },
    ) {
        Ok(Some(note)) => NoteResponse {
            ok: true,
            note: Some(to_note_item(note)),
            message: "Note found.".to_string(),
        },
        Ok(None) => NoteResponse {
            ok: true,
            note: None,
            message: "No note for this day.".to_string(),
        },
        Err(err) => NoteResponse {
            ok: false,
            note: None,
            message: format!("calendar_get_note failed: {err}"),
        },
    }
}

/// Appends an objective to the month; `items` holds the created objective.
#[flutter_rust_bridge::frb(sync)]
pub fn objectives_add(name: String, year_month: String) -> ObjectivesResponse {
    let result = with_repo(|component| component.objectives_repository()).and_then(
        |repo: Arc<ObjectivesRepository>| {
            repo.add_objective(&name, year_month.trim())
                .map(|objective| vec![objective])
                .map_err(|err| err.to_string())
        },
    );
    to_objectives_response(result, "Objective created.", "objectives_add")
}

#[flutter_rust_bridge::frb(sync)]
pub fn objectives_list(year_month: String) -> ObjectivesResponse {
    let result = with_repo(|component| component.objectives_repository()).and_then(
        |repo: Arc<ObjectivesRepository>| {
            repo.monthly_objectives(year_month.trim())
                .map_err(|err| err.to_string())
        },
    );
    to_objectives_response(result, "Objectives loaded.", "objectives_list")
}

#[flutter_rust_bridge::frb(sync)]
pub fn objectives_toggle_completion(objective_id: i64, date: String) -> ToggleResponse {
    match with_repo(|component| component.objectives_repository()).and_then(
        |repo: Arc<ObjectivesRepository>| {
            repo.toggle_completion(objective_id, date.trim())
                .map_err(|err| err.to_string())
        },
    ) {
        Ok(completed) => ToggleResponse {
            ok: true,
            completed,
            message: if completed {
                "Marked completed.".to_string()
            } else {
                "Mark removed.".to_string()
            },
        },
        Err(err) => ToggleResponse {
            ok: false,
            completed: false,
            message: format!("objectives_toggle_completion failed: {err}"),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn progress_monthly_counts(year_month: String) -> CompletionCountsResponse {
    match with_repo(|component| component.progress_repository()).and_then(
        |repo: Arc<ProgressRepository>| {
            repo.monthly_completion_counts(year_month.trim())
                .map_err(|err| err.to_string())
        },
    ) {
        Ok(counts) => CompletionCountsResponse {
            ok: true,
            message: format!("{} day(s) with completions.", counts.len()),
            items: counts.into_iter().map(to_count_item).collect(),
        },
        Err(err) => CompletionCountsResponse {
            ok: false,
            items: Vec::new(),
            message: format!("progress_monthly_counts failed: {err}"),
        },
    }
}

/// Notes of one month (`YYYY-MM`), ordered by date.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_monthly_notes(year_month: String) -> NotesResponse {
    match with_repo(|component| component.monthly_calendar_repository()).and_then(
        |repo: Arc<MonthlyCalendarRepository>| {
            repo.monthly_notes(year_month.trim())
                .map_err(|err| err.to_string())
        },
    ) {
        Ok(notes) => NotesResponse {
            ok: true,
            message: format!("{} note(s) loaded.", notes.len()),
            items: notes.into_iter().map(to_note_item).collect(),
        },
        Err(err) => NotesResponse {
            ok: false,
            items: Vec::new(),
            message: format!("calendar_monthly_notes failed: {err}"),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn calendar_delete_note(date: String) -> DeleteResponse {
    let note = DailyNote::new(date.trim(), String::new());
    let result = with_repo(|component| component.monthly_calendar_repository()).and_then(
        |repo: Arc<MonthlyCalendarRepository>| {
            repo.delete_daily_note(&note).map_err(|err| err.to_string())
        },
    );
    DeleteResponse::from_result(result, "calendar_delete_note")
}

/// Renames, moves or reorders a stored objective.
#[flutter_rust_bridge::frb(sync)]
pub fn objectives_update(
    objective_id: i64,
    name: String,
    year_month: String,
    order_index: i32,
) -> ActionResponse {
    let objective = MonthlyObjective {
        id: objective_id,
        name,
        year_month: year_month.trim().to_string(),
        order_index,
    };
    match with_repo(|component| component.objectives_repository()).and_then(
        |repo: Arc<ObjectivesRepository>| {
            repo.update_objective(&objective)
                .map_err(|err| err.to_string())
        },
    ) {
        Ok(()) => ActionResponse::success("Objective updated."),
        Err(err) => ActionResponse::failure(format!("objectives_update failed: {err}")),
    }
}

/// Deletes an objective together with its completion marks.
#[flutter_rust_bridge::frb(sync)]
pub fn objectives_delete(objective_id: i64) -> DeleteResponse {
    let objective = MonthlyObjective {
        id: objective_id,
        ..MonthlyObjective::new(String::new(), String::new())
    };
    let result = with_repo(|component| component.objectives_repository()).and_then(
        |repo: Arc<ObjectivesRepository>| {
            repo.delete_objective(&objective)
                .map_err(|err| err.to_string())
        },
    );
    DeleteResponse::from_result(result, "objectives_delete")
}

#[flutter_rust_bridge::frb(sync)]
pub fn objectives_daily_completions(date: String) -> CompletionsResponse {
    let result = with_repo(|component| component.objectives_repository()).and_then(
        |repo: Arc<ObjectivesRepository>| {
            repo.daily_completions(date.trim())
                .map_err(|err| err.to_string())
        },
    );
    to_completions_response(result, "objectives_daily_completions")
}

#[flutter_rust_bridge::frb(sync)]
pub fn progress_monthly_objectives(year_month: String) -> ObjectivesResponse {
    let result = with_repo(|component| component.progress_repository()).and_then(
        |repo: Arc<ProgressRepository>| {
            repo.monthly_objectives(year_month.trim())
                .map_err(|err| err.to_string())
        },
    );
    to_objectives_response(result, "Objectives loaded.", "progress_monthly_objectives")
}

/// Completion rows of the month's objectives, ordered by date.
#[flutter_rust_bridge::frb(sync)]
pub fn progress_monthly_completions(year_month: String) -> CompletionsResponse {
    let result = with_repo(|component| component.progress_repository()).and_then(
        |repo: Arc<ProgressRepository>| {
            repo.monthly_completions(year_month.trim())
                .map_err(|err| err.to_string())
        },
    );
    to_completions_response(result, "progress_monthly_completions")
}

fn same_data_dir(active: &AppHandle, requested: &Path) -> String {
    if active.data_dir == requested {
        String::new()
    } else {
        format!(
            "app already initialized with data_dir `{}`; refusing to switch to `{}`",
            active.data_dir.display(),
            requested.display()
        )
    }
}

fn with_repo<T>(
    resolve: impl FnOnce(&AppComponent) -> ProvisionResult<Arc<T>>,
) -> Result<Arc<T>, String> {
    let handle = APP
        .get()
        .ok_or_else(|| "app not initialized; call init_app first".to_string())?;
    resolve(&handle.component).map_err(|err| err.to_string())
}

fn to_objectives_response(
    result: Result<Vec<MonthlyObjective>, String>,
    success_message: &str,
    operation: &str,
) -> ObjectivesResponse {
    match result {
        Ok(objectives) => ObjectivesResponse {
            ok: true,
            items: objectives.into_iter().map(to_objective_item).collect(),
            message: success_message.to_string(),
        },
        Err(err) => ObjectivesResponse {
            ok: false,
            items: Vec::new(),
            message: format!("{operation} failed: {err}"),
        },
    }
}

fn to_completions_response(
    result: Result<Vec<ObjectiveCompletion>, String>,
    operation: &str,
) -> CompletionsResponse {
    match result {
        Ok(completions) => CompletionsResponse {
            ok: true,
            message: format!("{} completion(s) loaded.", completions.len()),
            items: completions.into_iter().map(to_completion_item).collect(),
        },
        Err(err) => CompletionsResponse {
            ok: false,
            items: Vec::new(),
            message: format!("{operation} failed: {err}"),
        },
    }
}

fn to_note_item(note: DailyNote) -> DailyNoteItem {
    DailyNoteItem {
        date: note.date,
        note: note.note,
        mood: note.mood,
    }
}

fn to_objective_item(objective: MonthlyObjective) -> ObjectiveItem {
    ObjectiveItem {
        id: objective.id,
        name: objective.name,
        year_month: objective.year_month,
        order_index: objective.order_index,
    }
}

fn to_completion_item(completion: ObjectiveCompletion) -> CompletionItem {
    CompletionItem {
        objective_id: completion.objective_id,
        date: completion.date,
        is_completed: completion.is_completed,
    }
}

fn to_count_item(count: DailyCompletionCount) -> CompletionCountItem {
    CompletionCountItem {
        date: count.date,
        count: count.count,
    }
}
