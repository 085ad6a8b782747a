//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into habit and entry use-cases.
//! - Map repository failures into the caller-facing error taxonomy.
//!
//! # Invariants
//! - Validation runs before any write.
//! - Persistence errors are surfaced as `ServiceError::Storage`, never
//!   swallowed.

use crate::model::entry::InvalidDateError;
use crate::model::habit::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod entry_service;
pub mod habit_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors returned by habit and entry services.
#[derive(Debug)]
pub enum ServiceError {
    /// Bad input shape or value (blank name, malformed id).
    Validation(ValidationError),
    /// Date string is not `YYYY-MM-DD`.
    InvalidDate(InvalidDateError),
    /// Referenced habit or entry is absent or soft-deleted.
    NotFound { entity: &'static str, id: i64 },
    /// Persistence-layer failure.
    Storage(RepoError),
}

impl ServiceError {
    pub(crate) fn habit_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "habit",
            id,
        }
    }

    /// Stable machine-readable kind, used in log lines and caller mappings.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidDate(_) => "invalid_date",
            Self::NotFound { .. } => "not_found",
            Self::Storage(_) => "storage",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidDate(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidDate(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<InvalidDateError> for ServiceError {
    fn from(value: InvalidDateError) -> Self {
        Self::InvalidDate(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Storage(other),
        }
    }
}
