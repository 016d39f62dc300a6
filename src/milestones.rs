use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Achievement, Completion, MilestoneKind};
use crate::recurrence::{is_due, streak};
use crate::storage::Storage;

/// What recording a completion produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub completion: Completion,
    /// Streak as of the completion date, including it.
    pub streak: u32,
    /// Milestones crossed for the first time by this completion.
    pub awarded: Vec<Achievement>,
}

/// Awards every milestone `current_streak` reaches that the habit doesn't hold yet.
///
/// Each milestone is awarded at most once per habit; a later streak reset
/// does not make it available again.
pub fn check_and_award<S: Storage + ?Sized>(
    store: &mut S,
    task_id: Uuid,
    current_streak: u32,
) -> Result<Vec<Achievement>> {
    let existing = store.achievements_for_task(task_id)?;
    let mut awarded = Vec::new();
    for kind in MilestoneKind::ALL {
        if current_streak < kind.threshold() || existing.iter().any(|a| a.kind == kind) {
            continue;
        }
        awarded.push(store.create_achievement(task_id, kind, current_streak)?);
    }
    Ok(awarded)
}

/// Marks `task_id` done on `date`, then recomputes its streak and awards milestones.
///
/// Runs as one transaction, so the completion, the streak and any awards
/// come from the same data. Completing the same habit twice on one date
/// keeps the first record.
pub fn record_completion<S: Storage>(
    store: &mut S,
    task_id: Uuid,
    date: NaiveDate,
) -> Result<CompletionOutcome> {
    store.transaction(|db| {
        let task = db
            .task(task_id)?
            .ok_or_else(|| Error::not_found(format!("habit {}", task_id)))?;
        if !is_due(&task, date) {
            debug!(task = %task.id, %date, "completion recorded on a day the habit is not due");
        }
        let completion = db.create_completion(task.id, date)?;
        let history = db.completions_for_task(task.id)?;
        let streak = streak(&task, &history, date);
        let awarded = check_and_award(db, task.id, streak)?;
        Ok(CompletionOutcome {
            completion,
            streak,
            awarded,
        })
    })
}
