//! Core domain logic for the habit tracker.
//! This crate owns the habit/entry invariants; transports call into it.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entry::{
    EntryDate, EntryId, HabitEntry, InvalidDateError, NewHabitEntry, SetEntryInput,
    ENTRY_DATE_FORMAT,
};
pub use model::habit::{
    parse_habit_id, Habit, HabitId, HabitInput, NewHabit, ValidationError, DEFAULT_HABIT_COLOR,
};
pub use repo::entry_repo::{EntryRepository, SqliteEntryRepository};
pub use repo::habit_repo::{HabitRepository, SqliteHabitRepository};
pub use repo::{RepoError, RepoResult};
pub use service::entry_service::{EntryOutcome, EntryService};
pub use service::habit_service::HabitService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
