//! Habit use-case service.
//!
//! # Responsibility
//! - Provide list/get/create/update/delete entry points for habits.
//! - Apply create defaults and update overwrite rules.
//!
//! # Invariants
//! - Create rejects blank names before touching storage.
//! - Update overwrites `name`/`description` always, `color` only when set.
//! - Delete is a soft delete and does not cascade to entries.

use crate::model::habit::{Habit, HabitId, HabitInput, NewHabit};
use crate::repo::habit_repo::HabitRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;

/// Use-case service wrapper for habit operations.
pub struct HabitService<R: HabitRepository> {
    repo: R,
}

impl<R: HabitRepository> HabitService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists all live habits with their entries attached.
    pub fn list_habits(&self) -> ServiceResult<Vec<Habit>> {
        Ok(self.repo.list_habits()?)
    }

    /// Gets one live habit with its entries.
    pub fn get_habit(&self, id: HabitId) -> ServiceResult<Habit> {
        self.repo
            .get_habit(id)?
            .ok_or_else(|| ServiceError::habit_not_found(id))
    }

    /// Validates input, applies the default color and persists a new habit.
    pub fn create_habit(&self, input: &HabitInput) -> ServiceResult<Habit> {
        let new_habit = NewHabit::from_input(input)?;
        let habit = self.repo.create_habit(&new_habit)?;
        info!(
            "event=habit_create module=service status=ok habit_id={}",
            habit.id
        );
        Ok(habit)
    }

    /// Updates an existing live habit.
    pub fn update_habit(&self, id: HabitId, input: &HabitInput) -> ServiceResult<Habit> {
        let mut habit = self.get_habit(id)?;
        habit.apply_update(input);
        let habit = self.repo.update_habit(&habit)?;
        info!(
            "event=habit_update module=service status=ok habit_id={}",
            habit.id
        );
        Ok(habit)
    }

    /// Soft-deletes a live habit; a second delete fails with `NotFound`.
    pub fn delete_habit(&self, id: HabitId) -> ServiceResult<()> {
        self.repo.soft_delete_habit(id)?;
        info!("event=habit_delete module=service status=ok habit_id={id}");
        Ok(())
    }
}
