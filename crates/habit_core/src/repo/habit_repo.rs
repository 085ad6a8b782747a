//! Habit repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/get/list/update/soft-delete over the `habits` table.
//! - Attach live entries to every habit it returns.
//!
//! # Invariants
//! - `get_habit`/`list_habits` never return tombstoned habits.
//! - `update_habit` and `soft_delete_habit` only touch live rows.

use crate::model::habit::{Habit, HabitId, NewHabit};
use crate::repo::entry_repo::{load_live_entries_by_habit, EntryRepository, SqliteEntryRepository};
use crate::repo::{
    ensure_table_shape, millis_to_utc, now_millis, optional_millis_to_utc, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const HABIT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    color,
    created_at,
    updated_at,
    deleted_at
FROM habits";

const HABIT_COLUMNS: &[&str] = &[
    "id",
    "name",
    "description",
    "color",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// Repository interface for habit CRUD operations.
pub trait HabitRepository {
    /// Inserts a validated habit and returns the stored record.
    fn create_habit(&self, habit: &NewHabit) -> RepoResult<Habit>;
    /// Gets one live habit with its live entries.
    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>>;
    /// Lists all live habits with their live entries, by ascending id.
    fn list_habits(&self) -> RepoResult<Vec<Habit>>;
    /// Overwrites `name`, `description` and `color` of a live habit.
    fn update_habit(&self, habit: &Habit) -> RepoResult<Habit>;
    /// Tombstones a live habit. Entries are left untouched.
    fn soft_delete_habit(&self, id: HabitId) -> RepoResult<()>;
}

/// SQLite-backed habit repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
    entries: SqliteEntryRepository<'conn>,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_shape(conn, "habits", HABIT_COLUMNS)?;
        let entries = SqliteEntryRepository::try_new(conn)?;
        Ok(Self { conn, entries })
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn create_habit(&self, habit: &NewHabit) -> RepoResult<Habit> {
        let now = now_millis();
        self.conn.execute(
            "INSERT INTO habits (
                name,
                description,
                color,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?4);",
            params![
                habit.name.as_str(),
                habit.description.as_str(),
                habit.color.as_str(),
                now,
            ],
        )?;

        let created_at = millis_to_utc(now, "habits.created_at")?;
        Ok(Habit {
            id: self.conn.last_insert_rowid(),
            created_at,
            updated_at: created_at,
            deleted_at: None,
            name: habit.name.clone(),
            description: habit.description.clone(),
            color: habit.color.clone(),
            entries: Vec::new(),
        })
    }

    fn get_habit(&self, id: HabitId) -> RepoResult<Option<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            let mut habit = parse_habit_row(row)?;
            habit.entries = self.entries.list_entries(habit.id)?;
            return Ok(Some(habit));
        }

        Ok(None)
    }

    fn list_habits(&self) -> RepoResult<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE deleted_at IS NULL
             ORDER BY id ASC;"
        ))?;

        let mut entries_by_habit = load_live_entries_by_habit(self.conn)?;
        let mut rows = stmt.query([])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            let mut habit = parse_habit_row(row)?;
            habit.entries = entries_by_habit.remove(&habit.id).unwrap_or_default();
            habits.push(habit);
        }

        Ok(habits)
    }

    fn update_habit(&self, habit: &Habit) -> RepoResult<Habit> {
        let now = now_millis();
        let changed = self.conn.execute(
            "UPDATE habits
             SET
                name = ?1,
                description = ?2,
                color = ?3,
                updated_at = ?4
             WHERE id = ?5
               AND deleted_at IS NULL;",
            params![
                habit.name.as_str(),
                habit.description.as_str(),
                habit.color.as_str(),
                now,
                habit.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "habit",
                id: habit.id,
            });
        }

        let mut updated = habit.clone();
        updated.updated_at = millis_to_utc(now, "habits.updated_at")?;
        Ok(updated)
    }

    fn soft_delete_habit(&self, id: HabitId) -> RepoResult<()> {
        let now = now_millis();
        let changed = self.conn.execute(
            "UPDATE habits
             SET
                deleted_at = ?1,
                updated_at = ?1
             WHERE id = ?2
               AND deleted_at IS NULL;",
            params![now, id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: "habit", id });
        }

        Ok(())
    }
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<Habit> {
    Ok(Habit {
        id: row.get("id")?,
        created_at: millis_to_utc(row.get("created_at")?, "habits.created_at")?,
        updated_at: millis_to_utc(row.get("updated_at")?, "habits.updated_at")?,
        deleted_at: optional_millis_to_utc(row.get("deleted_at")?, "habits.deleted_at")?,
        name: row.get("name")?,
        description: row.get("description")?,
        color: row.get("color")?,
        entries: Vec::new(),
    })
}
