use habithub_core::{
    AppComponent, AppContext, DailyCompletionCount, DailyNote, DaoError, KeyError,
    MonthlyCalendarRepository, MonthlyObjective, ObjectiveCompletion, ObjectivesRepository,
    ProgressRepository, RepoError,
};
use std::sync::Arc;

struct Fixture {
    calendar: Arc<MonthlyCalendarRepository>,
    objectives: Arc<ObjectivesRepository>,
    progress: Arc<ProgressRepository>,
}

fn fixture() -> Fixture {
    let component = AppComponent::new(AppContext::in_memory()).unwrap();
    Fixture {
        calendar: component.monthly_calendar_repository().unwrap(),
        objectives: component.objectives_repository().unwrap(),
        progress: component.progress_repository().unwrap(),
    }
}

// Calendar

#[test]
fn saving_a_note_replaces_the_previous_note_for_that_day() {
    let fx = fixture();

    fx.calendar
        .save_daily_note(&DailyNote::new("2025-07-15", "draft"))
        .unwrap();
    fx.calendar
        .save_daily_note(&DailyNote::new("2025-07-15", "final").with_mood("calm"))
        .unwrap();

    let stored = fx.calendar.daily_note("2025-07-15").unwrap().unwrap();
    assert_eq!(stored.note, "final");
    assert_eq!(stored.mood, "calm");
    assert_eq!(fx.calendar.monthly_notes("2025-07").unwrap().len(), 1);
}

#[test]
fn monthly_notes_are_ordered_and_scoped_to_the_month() {
    let fx = fixture();
    for (date, note) in [
        ("2025-07-20", "late"),
        ("2025-06-30", "previous month"),
        ("2025-07-02", "early"),
    ] {
        fx.calendar
            .save_daily_note(&DailyNote::new(date, note))
            .unwrap();
    }

    let dates = fx
        .calendar
        .monthly_notes("2025-07")
        .unwrap()
        .into_iter()
        .map(|note| note.date)
        .collect::<Vec<_>>();
    assert_eq!(dates, vec!["2025-07-02", "2025-07-20"]);
}

#[test]
fn deleting_a_note_reports_whether_it_existed() {
    let fx = fixture();
    let note = DailyNote::new("2025-07-15", "walked");
    fx.calendar.save_daily_note(&note).unwrap();

    assert!(fx.calendar.delete_daily_note(&note).unwrap());
    assert!(!fx.calendar.delete_daily_note(&note).unwrap());
    assert_eq!(fx.calendar.daily_note("2025-07-15").unwrap(), None);
}

#[test]
fn calendar_rejects_malformed_keys() {
    let fx = fixture();

    let err = fx
        .calendar
        .save_daily_note(&DailyNote::new("2025-02-30", "nope"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidKey(KeyError::InvalidDate(_))
    ));

    let err = fx.calendar.monthly_notes("2025-13").unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidKey(KeyError::InvalidYearMonth(_))
    ));
}

// Objectives

#[test]
fn new_objectives_are_appended_in_order() {
    let fx = fixture();

    let read = fx.objectives.add_objective("Read", "2025-07").unwrap();
    let run = fx.objectives.add_objective("  Run ", "2025-07").unwrap();
    let other_month = fx.objectives.add_objective("Plan", "2025-08").unwrap();
    let write = fx.objectives.add_objective("Write", "2025-07").unwrap();

    assert!(read.is_persisted());
    assert_eq!(run.name, "Run");
    assert_eq!(read.order_index, 0);
    assert_eq!(run.order_index, 1);
    assert_eq!(write.order_index, 2);
    assert_eq!(other_month.order_index, 0);

    let names = fx
        .objectives
        .monthly_objectives("2025-07")
        .unwrap()
        .into_iter()
        .map(|objective| objective.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Read", "Run", "Write"]);
}

#[test]
fn blank_objective_name_is_rejected() {
    let fx = fixture();
    let err = fx.objectives.add_objective("   ", "2025-07").unwrap_err();
    assert!(matches!(err, RepoError::InvalidInput(_)));
    assert!(fx.objectives.monthly_objectives("2025-07").unwrap().is_empty());
}

#[test]
fn toggle_cycles_through_completion_states() {
    let fx = fixture();
    let objective = fx.objectives.add_objective("Read", "2025-07").unwrap();

    assert!(fx.objectives.toggle_completion(objective.id, "2025-07-15").unwrap());
    assert_eq!(
        fx.objectives.completion(objective.id, "2025-07-15").unwrap(),
        Some(ObjectiveCompletion::completed(objective.id, "2025-07-15"))
    );

    assert!(!fx.objectives.toggle_completion(objective.id, "2025-07-15").unwrap());
    assert_eq!(
        fx.objectives.completion(objective.id, "2025-07-15").unwrap(),
        None
    );

    assert!(fx.objectives.toggle_completion(objective.id, "2025-07-15").unwrap());
    assert_eq!(
        fx.objectives.daily_completions("2025-07-15").unwrap().len(),
        1
    );
}

#[test]
fn toggle_marks_an_uncompleted_row_as_completed() {
    let fx = fixture();
    let objective = fx.objectives.add_objective("Read", "2025-07").unwrap();
    fx.objectives
        .dao()
        .write(|q| {
            q.upsert_completion(&ObjectiveCompletion {
                objective_id: objective.id,
                date: "2025-07-15".to_string(),
                is_completed: false,
            })
        })
        .unwrap();

    assert!(fx.objectives.toggle_completion(objective.id, "2025-07-15").unwrap());
    let stored = fx
        .objectives
        .completion(objective.id, "2025-07-15")
        .unwrap()
        .unwrap();
    assert!(stored.is_completed);
}

#[test]
fn toggling_an_unknown_objective_is_not_found() {
    let fx = fixture();
    let err = fx.objectives.toggle_completion(404, "2025-07-15").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(404)));
    assert!(fx.objectives.daily_completions("2025-07-15").unwrap().is_empty());
}

#[test]
fn updating_objectives_requires_an_existing_row() {
    let fx = fixture();
    let mut objective = fx.objectives.add_objective("Read", "2025-07").unwrap();

    objective.name = "Read 20 pages".to_string();
    fx.objectives.update_objective(&objective).unwrap();
    assert_eq!(
        fx.objectives.monthly_objectives("2025-07").unwrap()[0].name,
        "Read 20 pages"
    );

    let unsaved = MonthlyObjective::new("Ghost", "2025-07");
    assert!(matches!(
        fx.objectives.update_objective(&unsaved).unwrap_err(),
        RepoError::InvalidInput(_)
    ));

    let missing = MonthlyObjective {
        id: 999,
        ..objective
    };
    assert!(matches!(
        fx.objectives.update_objective(&missing).unwrap_err(),
        RepoError::NotFound(999)
    ));
}

#[test]
fn appending_after_the_last_order_index_is_rejected() {
    let fx = fixture();
    let mut last = fx.objectives.add_objective("Read", "2025-07").unwrap();
    last.order_index = i32::MAX;
    fx.objectives.update_objective(&last).unwrap();

    let err = fx.objectives.add_objective("Run", "2025-07").unwrap_err();
    assert!(matches!(err, RepoError::InvalidInput(_)));
    assert_eq!(fx.objectives.monthly_objectives("2025-07").unwrap(), vec![last]);

    let next_month = fx.objectives.add_objective("Run", "2025-08").unwrap();
    assert_eq!(next_month.order_index, 0);
}

#[test]
fn failed_write_rolls_back_every_statement() {
    let fx = fixture();
    let dao = fx.calendar.dao();

    let result: Result<(), DaoError> = dao.write(|q| {
        q.upsert_daily_note(&DailyNote::new("2025-07-15", "discarded"))?;
        Err(DaoError::InvalidData("abort".to_string()))
    });
    assert!(matches!(result, Err(DaoError::InvalidData(_))));

    let stored = dao.read(|q| q.daily_note("2025-07-15")).unwrap();
    assert_eq!(stored, None);

    dao.write(|q| q.upsert_daily_note(&DailyNote::new("2025-07-15", "kept")))
        .unwrap();
    assert_eq!(
        dao.read(|q| q.daily_note("2025-07-15")).unwrap().unwrap().note,
        "kept"
    );
}

#[test]
fn deleting_an_objective_removes_its_completions() {
    let fx = fixture();
    let objective = fx.objectives.add_objective("Read", "2025-07").unwrap();
    fx.objectives
        .toggle_completion(objective.id, "2025-07-15")
        .unwrap();

    assert!(fx.objectives.delete_objective(&objective).unwrap());
    assert!(!fx.objectives.delete_objective(&objective).unwrap());
    assert!(fx.objectives.daily_completions("2025-07-15").unwrap().is_empty());
}

// Progress

#[test]
fn completion_counts_include_only_completed_marks_of_the_month() {
    let fx = fixture();
    let read = fx.objectives.add_objective("Read", "2025-07").unwrap();
    let run = fx.objectives.add_objective("Run", "2025-07").unwrap();
    let plan = fx.objectives.add_objective("Plan", "2025-08").unwrap();

    fx.objectives.toggle_completion(read.id, "2025-07-01").unwrap();
    fx.objectives.toggle_completion(run.id, "2025-07-01").unwrap();
    fx.objectives.toggle_completion(read.id, "2025-07-03").unwrap();
    fx.objectives.toggle_completion(run.id, "2025-07-03").unwrap();
    fx.objectives.toggle_completion(run.id, "2025-07-03").unwrap();
    fx.objectives.toggle_completion(plan.id, "2025-08-01").unwrap();
    fx.objectives
        .dao()
        .write(|q| {
            q.upsert_completion(&ObjectiveCompletion {
                objective_id: read.id,
                date: "2025-07-05".to_string(),
                is_completed: false,
            })
        })
        .unwrap();

    let counts = fx.progress.monthly_completion_counts("2025-07").unwrap();
    assert_eq!(
        counts,
        vec![
            DailyCompletionCount {
                date: "2025-07-01".to_string(),
                count: 2,
            },
            DailyCompletionCount {
                date: "2025-07-03".to_string(),
                count: 1,
            },
        ]
    );

    let completions = fx.progress.monthly_completions("2025-07").unwrap();
    assert_eq!(completions.len(), 4);
    assert!(completions
        .iter()
        .all(|completion| completion.objective_id != plan.id));
}

#[test]
fn month_without_objectives_has_no_statistics() {
    let fx = fixture();
    assert!(fx.progress.monthly_objectives("2025-07").unwrap().is_empty());
    assert!(fx
        .progress
        .monthly_completion_counts("2025-07")
        .unwrap()
        .is_empty());
    assert!(fx.progress.monthly_completions("2025-07").unwrap().is_empty());
}

#[test]
fn progress_sees_writes_made_through_objectives() {
    let fx = fixture();
    let read = fx.objectives.add_objective("Read", "2025-07").unwrap();
    assert_eq!(fx.progress.monthly_objectives("2025-07").unwrap(), vec![read]);
}

#[test]
fn records_serialize_with_snake_case_fields() {
    let note = DailyNote::new("2025-07-15", "walked");
    let json = serde_json::to_value(&note).unwrap();
    assert_eq!(json["date"], "2025-07-15");
    assert_eq!(json["mood"], "");

    let parsed: DailyNote =
        serde_json::from_str(r#"{"date":"2025-07-16","note":"rested"}"#).unwrap();
    assert_eq!(parsed, DailyNote::new("2025-07-16", "rested"));

    let count = DailyCompletionCount {
        date: "2025-07-01".to_string(),
        count: 3,
    };
    assert_eq!(
        serde_json::to_string(&count).unwrap(),
        r#"{"date":"2025-07-01","count":3}"#
    );
}
