//! Habit domain model.
//!
//! # Responsibility
//! - Define the persisted `Habit` record and its write-side input shapes.
//! - Validate caller input before it reaches storage.
//! - Parse untyped habit identifiers into `HabitId`.
//!
//! # Invariants
//! - A created habit always has a non-blank `name`.
//! - A created habit always has a non-empty `color`.
//! - `deleted_at` is the source of truth for tombstone state.

use crate::model::entry::HabitEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned numeric habit identity.
pub type HabitId = i64;

/// Accent color applied when a habit is created without one.
pub const DEFAULT_HABIT_COLOR: &str = "#10b981";

/// Validation failures raised before any write is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `name` is empty or whitespace-only.
    EmptyName,
    /// Habit identifier token is not a positive integer.
    InvalidHabitId(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "habit name must not be empty"),
            Self::InvalidHabitId(token) => {
                write!(f, "invalid habit id `{token}`; expected a positive integer")
            }
        }
    }
}

impl Error for ValidationError {}

/// A tracked habit with its live entries attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Habit {
    pub id: HabitId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete tombstone. Never serialized.
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub description: String,
    pub color: String,
    /// Non-deleted entries owned by this habit.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<HabitEntry>,
}

impl Habit {
    /// Returns whether this habit should be visible to normal reads.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Applies an update payload using overwrite rules.
    ///
    /// - `name` and `description` are always overwritten, empty values included.
    /// - `color` is only overwritten by a non-empty value.
    pub fn apply_update(&mut self, input: &HabitInput) {
        self.name = input.name.clone();
        self.description = input.description.clone();
        if !input.color.is_empty() {
            self.color = input.color.clone();
        }
    }
}

/// Caller payload for create and update.
///
/// Fields missing from a JSON body deserialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HabitInput {
    pub name: String,
    pub description: String,
    pub color: String,
}

/// Validated, not-yet-persisted habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub description: String,
    pub color: String,
}

impl NewHabit {
    /// Validates create input and applies the default color.
    ///
    /// # Errors
    /// - `ValidationError::EmptyName` when `name` is blank.
    pub fn from_input(input: &HabitInput) -> Result<Self, ValidationError> {
        if input.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let color = if input.color.trim().is_empty() {
            DEFAULT_HABIT_COLOR.to_string()
        } else {
            input.color.clone()
        };

        Ok(Self {
            name: input.name.clone(),
            description: input.description.clone(),
            color,
        })
    }
}

/// Parses an untyped habit identifier (path segment, CLI argument).
///
/// Only positive decimal integers are accepted. Surrounding whitespace is
/// ignored; anything else is rejected instead of coerced.
pub fn parse_habit_id(token: &str) -> Result<HabitId, ValidationError> {
    let trimmed = token.trim();
    let is_digits = !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit());
    match trimmed.parse::<HabitId>() {
        Ok(id) if is_digits && id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidHabitId(token.to_string())),
    }
}
