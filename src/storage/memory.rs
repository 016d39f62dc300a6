use std::borrow::Cow;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::Storage;
use crate::error::Result;
use crate::models::{Achievement, Completion, MilestoneKind, Task, TaskInput};

/// Every record the tracker keeps, held in plain vectors.
///
/// Used directly as the in-memory store, and as the on-disk document of
/// [`JsonStore`](super::JsonStore).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub completions: Vec<Completion>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    fn snapshot(&self) -> Result<Cow<'_, MemoryStore>> {
        Ok(Cow::Borrowed(self))
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut MemoryStore) -> Result<T>,
    {
        let mut draft = self.clone();
        let out = f(&mut draft)?;
        *self = draft;
        Ok(out)
    }

    fn tasks(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.iter().filter(|t| t.is_active).cloned().collect())
    }

    fn all_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }

    fn task(&self, id: Uuid) -> Result<Option<Task>> {
        Ok(self.tasks.iter().find(|t| t.id == id).cloned())
    }

    fn create_task(&mut self, input: TaskInput) -> Result<Task> {
        input.validate()?;
        let task = Task::from_input(input);
        info!(task = %task.id, title = %task.title, "habit created");
        self.tasks.push(task.clone());
        Ok(task)
    }

    fn update_task(&mut self, id: Uuid, input: TaskInput) -> Result<Option<Task>> {
        input.validate()?;
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.apply(input);
        info!(task = %id, "habit updated");
        Ok(Some(task.clone()))
    }

    fn delete_task(&mut self, id: Uuid) -> Result<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Ok(false);
        }
        self.completions.retain(|c| c.task_id != id);
        self.achievements.retain(|a| a.task_id != id);
        info!(task = %id, "habit deleted");
        Ok(true)
    }

    fn completions(&self) -> Result<Vec<Completion>> {
        Ok(self.completions.clone())
    }

    fn completion(&self, id: Uuid) -> Result<Option<Completion>> {
        Ok(self.completions.iter().find(|c| c.id == id).cloned())
    }

    fn completions_for_task(&self, task_id: Uuid) -> Result<Vec<Completion>> {
        Ok(self
            .completions
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }

    fn completions_on(&self, date: NaiveDate) -> Result<Vec<Completion>> {
        Ok(self
            .completions
            .iter()
            .filter(|c| c.date == date)
            .cloned()
            .collect())
    }

    fn create_completion(&mut self, task_id: Uuid, date: NaiveDate) -> Result<Completion> {
        if let Some(existing) = self
            .completions
            .iter()
            .find(|c| c.task_id == task_id && c.date == date)
        {
            return Ok(existing.clone());
        }
        let completion = Completion {
            id: Uuid::new_v4(),
            task_id,
            date,
            completed_at: Utc::now(),
        };
        info!(task = %task_id, %date, "completion recorded");
        self.completions.push(completion.clone());
        Ok(completion)
    }

    fn delete_completion(&mut self, id: Uuid) -> Result<bool> {
        let before = self.completions.len();
        self.completions.retain(|c| c.id != id);
        Ok(self.completions.len() != before)
    }

    fn delete_completion_for(&mut self, task_id: Uuid, date: NaiveDate) -> Result<bool> {
        let before = self.completions.len();
        self.completions
            .retain(|c| !(c.task_id == task_id && c.date == date));
        Ok(self.completions.len() != before)
    }

    fn achievements(&self) -> Result<Vec<Achievement>> {
        Ok(self.achievements.clone())
    }

    fn achievements_for_task(&self, task_id: Uuid) -> Result<Vec<Achievement>> {
        Ok(self
            .achievements
            .iter()
            .filter(|a| a.task_id == task_id)
            .cloned()
            .collect())
    }

    fn create_achievement(
        &mut self,
        task_id: Uuid,
        kind: MilestoneKind,
        streak_count: u32,
    ) -> Result<Achievement> {
        let achievement = Achievement {
            id: Uuid::new_v4(),
            task_id,
            kind,
            streak_count,
            earned_at: Utc::now(),
        };
        info!(task = %task_id, milestone = kind.label(), streak_count, "achievement awarded");
        self.achievements.push(achievement.clone());
        Ok(achievement)
    }

    fn delete_achievement(&mut self, id: Uuid) -> Result<bool> {
        let before = self.achievements.len();
        self.achievements.retain(|a| a.id != id);
        Ok(self.achievements.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn completion_is_idempotent_per_day() {
        let mut store = MemoryStore::new();
        let task = store.create_task(TaskInput::daily("Floss")).unwrap();
        let first = store.create_completion(task.id, date(2024, 5, 1)).unwrap();
        let second = store.create_completion(task.id, date(2024, 5, 1)).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.completions().unwrap().len(), 1);

        store.create_completion(task.id, date(2024, 5, 2)).unwrap();
        assert_eq!(store.completions_for_task(task.id).unwrap().len(), 2);
    }

    #[test]
    fn snapshot_borrows_without_copying() {
        let store = MemoryStore::new();
        assert!(matches!(store.snapshot().unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn failed_transaction_leaves_store_untouched() {
        let mut store = MemoryStore::new();
        let task = store.create_task(TaskInput::daily("Floss")).unwrap();
        let result: Result<()> = store.transaction(|db| {
            db.create_completion(task.id, date(2024, 5, 1))?;
            Err(crate::error::Error::invalid_input("abort"))
        });
        assert!(result.is_err());
        assert!(store.completions().unwrap().is_empty());
    }

    #[test]
    fn paused_tasks_are_not_listed_as_active() {
        let mut store = MemoryStore::new();
        let mut input = TaskInput::daily("Journal");
        input.is_active = false;
        store.create_task(input).unwrap();
        store.create_task(TaskInput::daily("Walk")).unwrap();
        assert_eq!(store.tasks().unwrap().len(), 1);
        assert_eq!(store.all_tasks().unwrap().len(), 2);
    }

    #[test]
    fn update_replaces_fields_but_keeps_identity() {
        let mut store = MemoryStore::new();
        let task = store.create_task(TaskInput::daily("Read")).unwrap();
        let updated = store
            .update_task(task.id, TaskInput::monthly("Read a book", 3))
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(updated.title, "Read a book");
        assert_eq!(updated.day_of_month, Some(3));
        assert!(store.update_task(Uuid::new_v4(), TaskInput::daily("x")).unwrap().is_none());
    }

    #[test]
    fn invalid_input_is_rejected() {
        let mut store = MemoryStore::new();
        let mut input = TaskInput::monthly("Rent", 1);
        input.day_of_month = None;
        assert!(store.create_task(input).is_err());
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn delete_task_cascades() {
        let mut store = MemoryStore::new();
        let task = store.create_task(TaskInput::daily("Run")).unwrap();
        let keep = store.create_task(TaskInput::daily("Swim")).unwrap();
        store.create_completion(task.id, date(2024, 1, 1)).unwrap();
        store.create_completion(keep.id, date(2024, 1, 1)).unwrap();
        store.create_achievement(task.id, MilestoneKind::SevenDay, 7).unwrap();

        assert!(store.delete_task(task.id).unwrap());
        assert!(!store.delete_task(task.id).unwrap());
        assert_eq!(store.completions().unwrap().len(), 1);
        assert!(store.achievements().unwrap().is_empty());
    }

    #[test]
    fn completions_can_be_deleted_by_id_or_day() {
        let mut store = MemoryStore::new();
        let task = store.create_task(TaskInput::daily("Run")).unwrap();
        let c = store.create_completion(task.id, date(2024, 1, 1)).unwrap();
        store.create_completion(task.id, date(2024, 1, 2)).unwrap();

        assert!(store.delete_completion(c.id).unwrap());
        assert!(!store.delete_completion(c.id).unwrap());
        assert!(store.delete_completion_for(task.id, date(2024, 1, 2)).unwrap());
        assert!(!store.delete_completion_for(task.id, date(2024, 1, 2)).unwrap());
        assert!(store.completions_on(date(2024, 1, 2)).unwrap().is_empty());
    }
}
