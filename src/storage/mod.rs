//! Persistence for habits, completions and achievements.
//!
//! The recurrence engine and aggregators only talk to [`Storage`], so the
//! in-memory and JSON file backends are interchangeable.

mod json_store;
mod memory;

pub use json_store::{db_path, JsonStore};
pub use memory::MemoryStore;

use std::borrow::Cow;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Achievement, Completion, MilestoneKind, Task, TaskInput};

pub trait Storage {
    /// Every record as one consistent view.
    ///
    /// Aggregators read through this so a single computation never sees a
    /// write that lands halfway through it.
    fn snapshot(&self) -> Result<Cow<'_, MemoryStore>>;

    /// Runs `f` against one copy of the data and commits it only if `f` succeeds.
    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut MemoryStore) -> Result<T>,
        Self: Sized;

    /// Active habits only.
    fn tasks(&self) -> Result<Vec<Task>>;
    /// Active and paused habits.
    fn all_tasks(&self) -> Result<Vec<Task>>;
    fn task(&self, id: Uuid) -> Result<Option<Task>>;
    fn create_task(&mut self, input: TaskInput) -> Result<Task>;
    /// Replaces every field but the id and creation time. `None` if unknown.
    fn update_task(&mut self, id: Uuid, input: TaskInput) -> Result<Option<Task>>;
    /// Removes the habit along with its completions and achievements.
    fn delete_task(&mut self, id: Uuid) -> Result<bool>;

    fn completions(&self) -> Result<Vec<Completion>>;
    fn completion(&self, id: Uuid) -> Result<Option<Completion>>;
    fn completions_for_task(&self, task_id: Uuid) -> Result<Vec<Completion>>;
    fn completions_on(&self, date: NaiveDate) -> Result<Vec<Completion>>;
    /// Returns the existing record when `(task_id, date)` is already completed.
    fn create_completion(&mut self, task_id: Uuid, date: NaiveDate) -> Result<Completion>;
    fn delete_completion(&mut self, id: Uuid) -> Result<bool>;
    fn delete_completion_for(&mut self, task_id: Uuid, date: NaiveDate) -> Result<bool>;

    fn achievements(&self) -> Result<Vec<Achievement>>;
    fn achievements_for_task(&self, task_id: Uuid) -> Result<Vec<Achievement>>;
    fn create_achievement(
        &mut self,
        task_id: Uuid,
        kind: MilestoneKind,
        streak_count: u32,
    ) -> Result<Achievement>;
    fn delete_achievement(&mut self, id: Uuid) -> Result<bool>;
}

/// Resolves a full id or a unique id prefix against every stored habit.
pub fn resolve_task<S: Storage + ?Sized>(store: &S, id_or_prefix: &str) -> Result<Task> {
    let needle = id_or_prefix.trim().to_lowercase();
    if needle.is_empty() {
        return Err(Error::invalid_input("habit id is required"));
    }
    let mut matches: Vec<Task> = store
        .all_tasks()?
        .into_iter()
        .filter(|t| t.id.to_string().starts_with(&needle))
        .collect();
    match matches.len() {
        0 => Err(Error::not_found(format!("habit '{}'", id_or_prefix))),
        1 => Ok(matches.remove(0)),
        n => Err(Error::invalid_input(format!(
            "id prefix '{}' is ambiguous ({} habits match)",
            id_or_prefix, n
        ))),
    }
}
