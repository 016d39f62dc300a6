use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use super::{MemoryStore, Storage};
use crate::error::Result;
use crate::models::{Achievement, Completion, MilestoneKind, Task, TaskInput};

/// Returns the path to the habit database file (`habits.json`).
///
/// The path is determined in the following order:
/// 1. `HABITUST_DB` environment variable.
/// 2. `~/.local/share/habitust/habits.json` (on Linux).
/// 3. `./habits.json` (fallback).
pub fn db_path() -> PathBuf {
    resolve_db_path(std::env::var("HABITUST_DB").ok(), dirs::data_local_dir())
}

fn resolve_db_path(env: Option<String>, data_dir: Option<PathBuf>) -> PathBuf {
    if let Some(p) = env.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(p);
    }
    match data_dir {
        Some(mut p) => {
            p.push("habitust");
            p.push("habits.json");
            p
        }
        None => PathBuf::from("habits.json"),
    }
}

/// Habit database kept as one pretty-printed JSON document.
///
/// Each call reads the file, and each write rewrites it whole. Use
/// [`Storage::snapshot`] or [`Storage::transaction`] to batch several calls
/// over one read.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        JsonStore { path: path.into() }
    }

    /// Store at [`db_path`].
    pub fn open_default() -> Self {
        JsonStore::new(db_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the whole database. A missing file is an empty database.
    pub fn load(&self) -> Result<MemoryStore> {
        if !self.path.exists() {
            return Ok(MemoryStore::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(MemoryStore::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Overwrites the file with `db`.
    pub fn save(&self, db: &MemoryStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(db)?;
        fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "habit database saved");
        Ok(())
    }

    /// Deletes the database file.
    pub fn reset(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryStore) -> Result<T>) -> Result<T> {
        f(&self.load()?)
    }

    fn write<T>(&mut self, f: impl FnOnce(&mut MemoryStore) -> Result<T>) -> Result<T> {
        let mut db = self.load()?;
        let before = db.clone();
        let out = f(&mut db)?;
        if db != before {
            self.save(&db)?;
        }
        Ok(out)
    }
}

impl Storage for JsonStore {
    fn snapshot(&self) -> Result<Cow<'_, MemoryStore>> {
        Ok(Cow::Owned(self.load()?))
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut MemoryStore) -> Result<T>,
    {
        self.write(f)
    }

    fn tasks(&self) -> Result<Vec<Task>> {
        self.read(|db| db.tasks())
    }

    fn all_tasks(&self) -> Result<Vec<Task>> {
        self.read(|db| db.all_tasks())
    }

    fn task(&self, id: Uuid) -> Result<Option<Task>> {
        self.read(|db| db.task(id))
    }

    fn create_task(&mut self, input: TaskInput) -> Result<Task> {
        self.write(|db| db.create_task(input))
    }

    fn update_task(&mut self, id: Uuid, input: TaskInput) -> Result<Option<Task>> {
        self.write(|db| db.update_task(id, input))
    }

    fn delete_task(&mut self, id: Uuid) -> Result<bool> {
        self.write(|db| db.delete_task(id))
    }

    fn completions(&self) -> Result<Vec<Completion>> {
        self.read(|db| db.completions())
    }

    fn completion(&self, id: Uuid) -> Result<Option<Completion>> {
        self.read(|db| db.completion(id))
    }

    fn completions_for_task(&self, task_id: Uuid) -> Result<Vec<Completion>> {
        self.read(|db| db.completions_for_task(task_id))
    }

    fn completions_on(&self, date: NaiveDate) -> Result<Vec<Completion>> {
        self.read(|db| db.completions_on(date))
    }

    fn create_completion(&mut self, task_id: Uuid, date: NaiveDate) -> Result<Completion> {
        self.write(|db| db.create_completion(task_id, date))
    }

    fn delete_completion(&mut self, id: Uuid) -> Result<bool> {
        self.write(|db| db.delete_completion(id))
    }

    fn delete_completion_for(&mut self, task_id: Uuid, date: NaiveDate) -> Result<bool> {
        self.write(|db| db.delete_completion_for(task_id, date))
    }

    fn achievements(&self) -> Result<Vec<Achievement>> {
        self.read(|db| db.achievements())
    }

    fn achievements_for_task(&self, task_id: Uuid) -> Result<Vec<Achievement>> {
        self.read(|db| db.achievements_for_task(task_id))
    }

    fn create_achievement(
        &mut self,
        task_id: Uuid,
        kind: MilestoneKind,
        streak_count: u32,
    ) -> Result<Achievement> {
        self.write(|db| db.create_achievement(task_id, kind, streak_count))
    }

    fn delete_achievement(&mut self, id: Uuid) -> Result<bool> {
        self.write(|db| db.delete_achievement(id))
    }
}
