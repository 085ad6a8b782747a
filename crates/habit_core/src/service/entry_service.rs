//! Entry toggle/upsert use-case service.
//!
//! # Responsibility
//! - Resolve the day's entry for a habit and create or mutate it.
//! - Own date normalization for entry writes.
//!
//! # Invariants
//! - Lookup is keyed by `(habit_id, calendar day)`; time of day is ignored.
//! - Habit check, locate and write run inside the store's write scope, so
//!   concurrent callers on one day are serialized and a failed write leaves
//!   nothing behind.
//! - A create that still loses to another writer (`DuplicateDay`) is retried
//!   once as an update of the winning row; a day never has two live entries.
//! - Writes require a live habit; a soft-deleted habit is `NotFound`.

use crate::model::entry::{EntryDate, HabitEntry, NewHabitEntry, SetEntryInput};
use crate::model::habit::HabitId;
use crate::repo::entry_repo::EntryRepository;
use crate::repo::habit_repo::HabitRepository;
use crate::repo::RepoError;
use crate::service::{ServiceError, ServiceResult};
use log::{debug, warn};
use serde::Serialize;

/// Result of an explicit set-entry write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "entry", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// No entry existed for the day; a new one was stored.
    Created(HabitEntry),
    /// The day's existing entry was overwritten.
    Updated(HabitEntry),
}

impl EntryOutcome {
    pub fn entry(&self) -> &HabitEntry {
        match self {
            Self::Created(entry) | Self::Updated(entry) => entry,
        }
    }

    pub fn into_entry(self) -> HabitEntry {
        match self {
            Self::Created(entry) | Self::Updated(entry) => entry,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// What an upsert writes on each branch.
#[derive(Debug, Clone, Copy)]
enum EntryWrite<'a> {
    /// Create as completed; flip `completed` on an existing entry.
    Toggle,
    /// Write both fields verbatim on either branch.
    Set { completed: bool, notes: &'a str },
}

impl EntryWrite<'_> {
    fn as_str(self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Set { .. } => "set",
        }
    }

    fn new_entry(self, habit_id: HabitId, date: EntryDate) -> NewHabitEntry {
        let (completed, notes) = match self {
            Self::Toggle => (true, String::new()),
            Self::Set { completed, notes } => (completed, notes.to_string()),
        };
        NewHabitEntry {
            habit_id,
            date,
            completed,
            notes,
        }
    }

    fn apply(self, entry: &mut HabitEntry) {
        match self {
            Self::Toggle => entry.completed = !entry.completed,
            Self::Set { completed, notes } => {
                entry.completed = completed;
                entry.notes = notes.to_string();
            }
        }
    }
}

/// Use-case service for per-day habit entries.
pub struct EntryService<H: HabitRepository, E: EntryRepository> {
    habits: H,
    entries: E,
}

impl<H: HabitRepository, E: EntryRepository> EntryService<H, E> {
    /// Creates a service over habit and entry repositories.
    pub fn new(habits: H, entries: E) -> Self {
        Self { habits, entries }
    }

    /// Lists live entries of a live habit, ordered by date.
    pub fn list_entries(&self, habit_id: HabitId) -> ServiceResult<Vec<HabitEntry>> {
        self.ensure_habit(habit_id)?;
        Ok(self.entries.list_entries(habit_id)?)
    }

    /// Toggles the entry for `date` (`YYYY-MM-DD`, default today).
    ///
    /// A missing entry is created as completed; an existing one has
    /// `completed` flipped and keeps its notes.
    pub fn toggle_entry(&self, habit_id: HabitId, date: Option<&str>) -> ServiceResult<HabitEntry> {
        let date = EntryDate::resolve(date)?;
        self.toggle_entry_at(habit_id, date)
    }

    /// Typed variant of [`Self::toggle_entry`].
    pub fn toggle_entry_at(&self, habit_id: HabitId, date: EntryDate) -> ServiceResult<HabitEntry> {
        self.locked_upsert(habit_id, date, EntryWrite::Toggle)
            .map(EntryOutcome::into_entry)
    }

    /// Creates or overwrites the entry for `input.date`.
    pub fn set_entry(&self, habit_id: HabitId, input: &SetEntryInput) -> ServiceResult<EntryOutcome> {
        let date = EntryDate::parse(&input.date)?;
        self.set_entry_at(habit_id, date, input.completed, &input.notes)
    }

    /// Typed variant of [`Self::set_entry`].
    pub fn set_entry_at(
        &self,
        habit_id: HabitId,
        date: EntryDate,
        completed: bool,
        notes: &str,
    ) -> ServiceResult<EntryOutcome> {
        self.locked_upsert(habit_id, date, EntryWrite::Set { completed, notes })
    }

    fn ensure_habit(&self, habit_id: HabitId) -> ServiceResult<()> {
        match self.habits.get_habit(habit_id)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::habit_not_found(habit_id)),
        }
    }

    /// Runs habit check, locate and write inside one store write scope.
    fn locked_upsert(
        &self,
        habit_id: HabitId,
        date: EntryDate,
        write: EntryWrite<'_>,
    ) -> ServiceResult<EntryOutcome> {
        self.entries.write_scope(|| {
            self.ensure_habit(habit_id)?;
            self.upsert(habit_id, date, write)
        })
    }

    fn upsert(
        &self,
        habit_id: HabitId,
        date: EntryDate,
        write: EntryWrite<'_>,
    ) -> ServiceResult<EntryOutcome> {
        let day = date.day();
        if let Some(existing) = self.entries.find_entry_for_day(habit_id, day)? {
            return self.update_existing(existing, write);
        }

        match self.entries.create_entry(&write.new_entry(habit_id, date)) {
            Ok(entry) => {
                debug!(
                    "event=entry_upsert module=service status=ok op={} branch=create habit_id={} entry_id={} day={}",
                    write.as_str(),
                    habit_id,
                    entry.id,
                    day
                );
                Ok(EntryOutcome::Created(entry))
            }
            Err(conflict @ RepoError::DuplicateDay { .. }) => {
                warn!(
                    "event=entry_upsert module=service status=conflict op={} habit_id={} day={}",
                    write.as_str(),
                    habit_id,
                    day
                );
                match self.entries.find_entry_for_day(habit_id, day)? {
                    Some(existing) => self.update_existing(existing, write),
                    None => Err(ServiceError::Storage(conflict)),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_existing(
        &self,
        mut entry: HabitEntry,
        write: EntryWrite<'_>,
    ) -> ServiceResult<EntryOutcome> {
        write.apply(&mut entry);
        let entry = self.entries.update_entry(&entry)?;
        debug!(
            "event=entry_upsert module=service status=ok op={} branch=update habit_id={} entry_id={} completed={}",
            write.as_str(),
            entry.habit_id,
            entry.id,
            entry.completed
        );
        Ok(EntryOutcome::Updated(entry))
    }
}
