//! Per-day habit entry model and date normalization.
//!
//! # Responsibility
//! - Define the persisted `HabitEntry` record and its set-entry payload.
//! - Parse external date strings and reduce timestamps to calendar days.
//!
//! # Invariants
//! - External date strings are accepted only in `YYYY-MM-DD` form.
//! - `EntryDate` keeps the caller's original precision; `day()` is the
//!   only value used for identity and lookup.
//! - `HabitEntry::date` serializes as RFC 3339 with a `Z` suffix.

use crate::model::habit::HabitId;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned numeric entry identity.
pub type EntryId = i64;

/// Accepted external date layout.
pub const ENTRY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Date input that is not a valid `YYYY-MM-DD` calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDateError {
    pub input: String,
}

impl Display for InvalidDateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid date `{}`; expected format YYYY-MM-DD",
            self.input
        )
    }
}

impl Error for InvalidDateError {}

/// Target date of an entry write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryDate(NaiveDateTime);

impl EntryDate {
    /// Parses a strict `YYYY-MM-DD` string to midnight of that day.
    pub fn parse(input: &str) -> Result<Self, InvalidDateError> {
        let invalid = || InvalidDateError {
            input: input.to_string(),
        };

        let bytes = input.as_bytes();
        let shaped = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(idx, b)| idx == 4 || idx == 7 || b.is_ascii_digit());
        if !shaped {
            return Err(invalid());
        }

        NaiveDate::parse_from_str(input, ENTRY_DATE_FORMAT)
            .map(Self::from)
            .map_err(|_| invalid())
    }

    /// Resolves an optional date token; missing or empty means today.
    pub fn resolve(input: Option<&str>) -> Result<Self, InvalidDateError> {
        match input {
            Some(value) if !value.is_empty() => Self::parse(value),
            _ => Ok(Self::today()),
        }
    }

    /// Midnight of the current local calendar day.
    pub fn today() -> Self {
        Self::from(Local::now().date_naive())
    }

    /// Calendar day used for identity and lookup.
    pub fn day(&self) -> NaiveDate {
        self.0.date()
    }

    /// Original-precision timestamp stored on create.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDate> for EntryDate {
    fn from(value: NaiveDate) -> Self {
        Self(value.and_time(NaiveTime::MIN))
    }
}

impl From<NaiveDateTime> for EntryDate {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

/// One habit's record for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitEntry {
    pub id: EntryId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub habit_id: HabitId,
    #[serde(serialize_with = "serialize_utc_marker")]
    pub date: NaiveDateTime,
    pub completed: bool,
    pub notes: String,
}

impl HabitEntry {
    /// Calendar day this entry represents.
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }
}

fn serialize_utc_marker<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Not-yet-persisted entry built by the upsert create branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabitEntry {
    pub habit_id: HabitId,
    pub date: EntryDate,
    pub completed: bool,
    pub notes: String,
}

/// Caller payload for an explicit set-entry write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SetEntryInput {
    /// `YYYY-MM-DD`; required.
    pub date: String,
    pub completed: bool,
    pub notes: String,
}
