//! Habit entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store per-day entries and look them up by habit and calendar day.
//! - Surface unique-day conflicts as `RepoError::DuplicateDay`.
//!
//! # Invariants
//! - The `day` column always equals the calendar day of `date`.
//! - At most one live row exists per `(habit_id, day)`; enforced by the
//!   `idx_habit_entries_habit_day` partial unique index.
//! - Updates never move an entry to another habit or day.
//! - `write_scope` holds SQLite's write lock for its whole duration.

use crate::model::entry::{EntryId, HabitEntry, NewHabitEntry};
use crate::model::habit::HabitId;
use crate::repo::{
    constraint_kind, ensure_table_shape, millis_to_utc, now_millis, optional_millis_to_utc,
    ConstraintKind, RepoError, RepoResult,
};
use chrono::NaiveDate;
use log::warn;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeMap;

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    habit_id,
    date,
    completed,
    notes,
    created_at,
    updated_at,
    deleted_at
FROM habit_entries";

const ENTRY_COLUMNS: &[&str] = &[
    "id",
    "habit_id",
    "date",
    "day",
    "completed",
    "notes",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// Repository interface for habit entries.
pub trait EntryRepository {
    /// Inserts a new entry and returns the stored record.
    ///
    /// Fails with `DuplicateDay` when a live entry already holds the day and
    /// with `NotFound` when the habit row does not exist.
    fn create_entry(&self, entry: &NewHabitEntry) -> RepoResult<HabitEntry>;
    /// Gets one live entry by id.
    fn get_entry(&self, id: EntryId) -> RepoResult<Option<HabitEntry>>;
    /// Finds the live entry of `habit_id` on `day`, if any.
    fn find_entry_for_day(&self, habit_id: HabitId, day: NaiveDate)
        -> RepoResult<Option<HabitEntry>>;
    /// Lists live entries of one habit ordered by date.
    fn list_entries(&self, habit_id: HabitId) -> RepoResult<Vec<HabitEntry>>;
    /// Overwrites `completed` and `notes` of a live entry.
    fn update_entry(&self, entry: &HabitEntry) -> RepoResult<HabitEntry>;
    /// Runs `work` under the store's exclusive write scope.
    ///
    /// Commits when `work` returns `Ok`; otherwise every write made inside
    /// the scope is discarded.
    fn write_scope<T, E>(&self, work: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_shape(conn, "habit_entries", ENTRY_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn create_entry(&self, entry: &NewHabitEntry) -> RepoResult<HabitEntry> {
        let now = now_millis();
        let day = entry.date.day();

        let inserted = self.conn.execute(
            "INSERT INTO habit_entries (
                habit_id,
                date,
                day,
                completed,
                notes,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
            params![
                entry.habit_id,
                entry.date.timestamp(),
                day,
                entry.completed,
                entry.notes.as_str(),
                now,
            ],
        );

        if let Err(err) = inserted {
            return Err(match constraint_kind(&err) {
                Some(ConstraintKind::Unique) => RepoError::DuplicateDay {
                    habit_id: entry.habit_id,
                    day,
                },
                Some(ConstraintKind::ForeignKey) => RepoError::NotFound {
                    entity: "habit",
                    id: entry.habit_id,
                },
                None => err.into(),
            });
        }

        let created_at = millis_to_utc(now, "habit_entries.created_at")?;
        Ok(HabitEntry {
            id: self.conn.last_insert_rowid(),
            created_at,
            updated_at: created_at,
            deleted_at: None,
            habit_id: entry.habit_id,
            date: entry.date.timestamp(),
            completed: entry.completed,
            notes: entry.notes.clone(),
        })
    }

    fn get_entry(&self, id: EntryId) -> RepoResult<Option<HabitEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }

        Ok(None)
    }

    fn find_entry_for_day(
        &self,
        habit_id: HabitId,
        day: NaiveDate,
    ) -> RepoResult<Option<HabitEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE habit_id = ?1
               AND day = ?2
               AND deleted_at IS NULL
             ORDER BY id ASC
             LIMIT 1;"
        ))?;

        let mut rows = stmt.query(params![habit_id, day])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }

        Ok(None)
    }

    fn list_entries(&self, habit_id: HabitId) -> RepoResult<Vec<HabitEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE habit_id = ?1
               AND deleted_at IS NULL
             ORDER BY date ASC, id ASC;"
        ))?;

        let mut rows = stmt.query([habit_id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }

    fn update_entry(&self, entry: &HabitEntry) -> RepoResult<HabitEntry> {
        let now = now_millis();
        let changed = self.conn.execute(
            "UPDATE habit_entries
             SET
                completed = ?1,
                notes = ?2,
                updated_at = ?3
             WHERE id = ?4
               AND deleted_at IS NULL;",
            params![entry.completed, entry.notes.as_str(), now, entry.id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "habit entry",
                id: entry.id,
            });
        }

        let mut updated = entry.clone();
        updated.updated_at = millis_to_utc(now, "habit_entries.updated_at")?;
        Ok(updated)
    }

    fn write_scope<T, E>(&self, work: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>,
    {
        // IMMEDIATE takes the database write lock up front, so a concurrent
        // locate-then-write on another connection waits instead of interleaving.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        match work() {
            Ok(value) => {
                tx.commit().map_err(RepoError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=entry_write_scope module=repo status=error error_code=rollback_failed error={}",
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}

/// Loads live entries for every habit in one query, grouped by habit id.
pub(crate) fn load_live_entries_by_habit(
    conn: &Connection,
) -> RepoResult<BTreeMap<HabitId, Vec<HabitEntry>>> {
    let mut stmt = conn.prepare(&format!(
        "{ENTRY_SELECT_SQL}
         WHERE deleted_at IS NULL
         ORDER BY habit_id ASC, date ASC, id ASC;"
    ))?;

    let mut rows = stmt.query([])?;
    let mut grouped: BTreeMap<HabitId, Vec<HabitEntry>> = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let entry = parse_entry_row(row)?;
        grouped.entry(entry.habit_id).or_default().push(entry);
    }

    Ok(grouped)
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<HabitEntry> {
    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in habit_entries.completed"
            )));
        }
    };

    Ok(HabitEntry {
        id: row.get("id")?,
        created_at: millis_to_utc(row.get("created_at")?, "habit_entries.created_at")?,
        updated_at: millis_to_utc(row.get("updated_at")?, "habit_entries.updated_at")?,
        deleted_at: optional_millis_to_utc(row.get("deleted_at")?, "habit_entries.deleted_at")?,
        habit_id: row.get("habit_id")?,
        date: row.get("date")?,
        completed,
        notes: row.get("notes")?,
    })
}
