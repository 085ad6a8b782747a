//! Habit and per-day entry domain model.
//!
//! # Responsibility
//! - Define the records shared by repositories and services.
//! - Own input validation and calendar-day normalization rules.
//!
//! # Invariants
//! - Identities are assigned by storage and never reused.
//! - Deletion is represented by a `deleted_at` tombstone, not hard delete.
//! - Entry identity is `(habit_id, calendar day)`; time of day never matters.

pub mod entry;
pub mod habit;
