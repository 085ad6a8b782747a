use chrono::NaiveDate;
use habit_core::db::open_db_in_memory;
use habit_core::{
    EntryDate, EntryOutcome, EntryRepository, EntryService, Habit, HabitInput, HabitService,
    ServiceError, SetEntryInput, SqliteEntryRepository, SqliteHabitRepository,
};
use rusqlite::Connection;

type SqliteEntryService<'conn> =
    EntryService<SqliteHabitRepository<'conn>, SqliteEntryRepository<'conn>>;

fn entry_service(conn: &Connection) -> SqliteEntryService<'_> {
    EntryService::new(
        SqliteHabitRepository::try_new(conn).unwrap(),
        SqliteEntryRepository::try_new(conn).unwrap(),
    )
}

fn create_habit(conn: &Connection, name: &str) -> Habit {
    HabitService::new(SqliteHabitRepository::try_new(conn).unwrap())
        .create_habit(&HabitInput {
            name: name.to_string(),
            ..HabitInput::default()
        })
        .unwrap()
}

fn set_input(date: &str, completed: bool, notes: &str) -> SetEntryInput {
    SetEntryInput {
        date: date.to_string(),
        completed,
        notes: notes.to_string(),
    }
}

fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

fn live_entry_rows(conn: &Connection, habit_id: i64) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM habit_entries WHERE habit_id = ?1 AND deleted_at IS NULL;",
        [habit_id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn toggle_on_fresh_day_creates_one_completed_entry() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);

    let entry = service.toggle_entry(habit.id, Some("2024-03-05")).unwrap();
    assert!(entry.completed);
    assert_eq!(entry.habit_id, habit.id);
    assert_eq!(entry.day(), day("2024-03-05"));
    assert!(entry.notes.is_empty());

    let entries = service.list_entries(habit.id).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, entry.id);
}

#[test]
fn double_toggle_returns_to_not_completed_on_same_row() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);

    let first = service.toggle_entry(habit.id, Some("2024-03-05")).unwrap();
    let second = service.toggle_entry(habit.id, Some("2024-03-05")).unwrap();

    assert!(first.completed);
    assert!(!second.completed);
    assert_eq!(first.id, second.id);
    assert_eq!(live_entry_rows(&conn, habit.id), 1);

    let third = service.toggle_entry(habit.id, Some("2024-03-05")).unwrap();
    assert!(third.completed);
}

#[test]
fn toggle_keeps_notes_untouched() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);

    service
        .set_entry(habit.id, &set_input("2024-03-05", true, "ran 5k"))
        .unwrap();
    let toggled = service.toggle_entry(habit.id, Some("2024-03-05")).unwrap();

    assert!(!toggled.completed);
    assert_eq!(toggled.notes, "ran 5k");
}

#[test]
fn toggle_without_date_targets_today() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);

    let entry = service.toggle_entry(habit.id, None).unwrap();
    assert_eq!(entry.day(), EntryDate::today().day());

    let entry = service.toggle_entry(habit.id, Some("")).unwrap();
    assert_eq!(entry.day(), EntryDate::today().day());
    assert!(!entry.completed);
}

#[test]
fn toggle_with_invalid_date_fails_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);

    let err = service.toggle_entry(habit.id, Some("03/05/2024")).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidDate(_)));
    assert_eq!(live_entry_rows(&conn, habit.id), 0);
}

#[test]
fn set_entry_creates_then_updates_single_entry() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);

    let created = service
        .set_entry(habit.id, &set_input("2024-03-05", true, "ran 5k"))
        .unwrap();
    assert!(created.is_created());
    assert!(created.entry().completed);
    assert_eq!(created.entry().notes, "ran 5k");

    let updated = service
        .set_entry(habit.id, &set_input("2024-03-05", false, ""))
        .unwrap();
    assert!(matches!(updated, EntryOutcome::Updated(_)));
    assert_eq!(updated.entry().id, created.entry().id);

    let entries = service.list_entries(habit.id).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].completed);
    assert_eq!(entries[0].notes, "");
}

#[test]
fn set_entry_on_fresh_day_uses_supplied_completed_value() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);

    let outcome = service
        .set_entry(habit.id, &set_input("2024-03-07", false, "rest day"))
        .unwrap();
    let entry = outcome.into_entry();
    assert!(!entry.completed);
    assert_eq!(entry.notes, "rest day");
}

#[test]
fn set_entry_with_invalid_date_fails_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);
    service
        .set_entry(habit.id, &set_input("2024-03-05", true, "keep"))
        .unwrap();

    for bad in ["not-a-date", "", "2024-02-30"] {
        let err = service
            .set_entry(habit.id, &set_input(bad, false, "overwrite"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidDate(_)), "input `{bad}`");
        assert_eq!(err.kind(), "invalid_date");
    }

    let entries = service.list_entries(habit.id).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].completed);
    assert_eq!(entries[0].notes, "keep");
}

#[test]
fn same_calendar_day_with_different_times_resolves_to_one_entry() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);
    let morning = day("2024-03-05").and_hms_opt(8, 0, 0).unwrap();
    let night = day("2024-03-05").and_hms_opt(23, 0, 0).unwrap();

    let first = service
        .set_entry_at(habit.id, EntryDate::from(morning), true, "morning")
        .unwrap();
    let second = service
        .set_entry_at(habit.id, EntryDate::from(night), false, "night")
        .unwrap();

    assert!(first.is_created());
    assert!(!second.is_created());
    assert_eq!(first.entry().id, second.entry().id);
    // The stored timestamp keeps the first write's precision.
    assert_eq!(second.entry().date, morning);

    let entries = service.list_entries(habit.id).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].date, morning);
    assert_eq!(entries[0].notes, "night");
}

#[test]
fn toggle_at_time_of_day_matches_date_only_entry() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);

    service.toggle_entry(habit.id, Some("2024-03-05")).unwrap();
    let late = day("2024-03-05").and_hms_opt(23, 59, 59).unwrap();
    let entry = service.toggle_entry_at(habit.id, late.into()).unwrap();

    assert!(!entry.completed);
    assert_eq!(live_entry_rows(&conn, habit.id), 1);
}

#[test]
fn entries_are_scoped_per_habit_and_day() {
    let conn = open_db_in_memory().unwrap();
    let run = create_habit(&conn, "Run");
    let read = create_habit(&conn, "Read");
    let service = entry_service(&conn);

    service.toggle_entry(run.id, Some("2024-03-05")).unwrap();
    service.toggle_entry(run.id, Some("2024-03-06")).unwrap();
    service.toggle_entry(read.id, Some("2024-03-05")).unwrap();

    let run_entries = service.list_entries(run.id).unwrap();
    assert_eq!(run_entries.len(), 2);
    assert_eq!(run_entries[0].day(), day("2024-03-05"));
    assert_eq!(run_entries[1].day(), day("2024-03-06"));
    assert_eq!(service.list_entries(read.id).unwrap().len(), 1);
}

#[test]
fn entry_writes_require_live_habit() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);

    assert!(matches!(
        service.toggle_entry(77, Some("2024-03-05")),
        Err(ServiceError::NotFound { entity: "habit", id: 77 })
    ));
    assert!(matches!(
        service.set_entry(77, &set_input("2024-03-05", true, "")),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        service.list_entries(77),
        Err(ServiceError::NotFound { .. })
    ));

    HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap())
        .delete_habit(habit.id)
        .unwrap();
    assert!(matches!(
        service.toggle_entry(habit.id, Some("2024-03-05")),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn deleting_habit_keeps_entry_rows() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);
    service.toggle_entry(habit.id, Some("2024-03-05")).unwrap();

    HabitService::new(SqliteHabitRepository::try_new(&conn).unwrap())
        .delete_habit(habit.id)
        .unwrap();

    assert_eq!(live_entry_rows(&conn, habit.id), 1);
}

#[test]
fn repository_reports_duplicate_day_and_missing_habit() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();
    let date = EntryDate::parse("2024-03-05").unwrap();

    let created = repo
        .create_entry(&habit_core::NewHabitEntry {
            habit_id: habit.id,
            date,
            completed: true,
            notes: String::new(),
        })
        .unwrap();
    assert_eq!(repo.get_entry(created.id).unwrap(), Some(created.clone()));

    let later = EntryDate::from(day("2024-03-05").and_hms_opt(12, 0, 0).unwrap());
    let duplicate = repo
        .create_entry(&habit_core::NewHabitEntry {
            habit_id: habit.id,
            date: later,
            completed: false,
            notes: String::new(),
        })
        .unwrap_err();
    assert!(matches!(
        duplicate,
        habit_core::RepoError::DuplicateDay { habit_id, .. } if habit_id == habit.id
    ));

    let orphan = repo
        .create_entry(&habit_core::NewHabitEntry {
            habit_id: 999,
            date,
            completed: true,
            notes: String::new(),
        })
        .unwrap_err();
    assert!(matches!(
        orphan,
        habit_core::RepoError::NotFound { entity: "habit", id: 999 }
    ));
}

#[test]
fn set_entry_outcome_serializes_with_kind_tag() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let service = entry_service(&conn);

    let outcome = service
        .set_entry(habit.id, &set_input("2024-03-05", true, "ran"))
        .unwrap();
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["outcome"], "created");
    assert_eq!(value["entry"]["habit_id"], habit.id);
    assert_eq!(value["entry"]["completed"], true);
    assert_eq!(value["entry"]["notes"], "ran");
    assert_eq!(value["entry"]["date"], "2024-03-05T00:00:00Z");
}

#[test]
fn failed_write_scope_discards_its_writes() {
    let conn = open_db_in_memory().unwrap();
    let habit = create_habit(&conn, "Run");
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();

    let result: Result<(), habit_core::RepoError> = repo.write_scope(|| {
        repo.create_entry(&habit_core::NewHabitEntry {
            habit_id: habit.id,
            date: EntryDate::parse("2024-03-05").unwrap(),
            completed: true,
            notes: "draft".to_string(),
        })?;
        Err(habit_core::RepoError::InvalidData("abort".to_string()))
    });
    assert!(matches!(result, Err(habit_core::RepoError::InvalidData(_))));
    assert!(repo.list_entries(habit.id).unwrap().is_empty());

    let entry = entry_service(&conn)
        .toggle_entry(habit.id, Some("2024-03-05"))
        .unwrap();
    assert!(entry.completed);
    assert_eq!(entry.notes, "");
}
