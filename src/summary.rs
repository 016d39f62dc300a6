use chrono::{Datelike, Month, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Completion, DailySummary, DayCompletion, MonthlyStats, Task, TaskWithCompletion};
use crate::recurrence::{is_due, next_occurrence, streak};
use crate::storage::{MemoryStore, Storage};

/// `completed / total` as a percentage, zero when nothing was due.
pub fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

/// Longest run of consecutive perfect days in a date-ordered series.
///
/// Days with nothing due break the run just like missed days.
pub fn perfect_day_streak(days: &[DayCompletion]) -> u32 {
    let mut current = 0;
    let mut best = 0;
    for day in days {
        if day.is_perfect() {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Streak of the stored habit `task_id` as of `reference`; 0 if the habit is gone.
pub fn task_streak<S: Storage + ?Sized>(store: &S, task_id: Uuid, reference: NaiveDate) -> Result<u32> {
    let db = store.snapshot()?;
    let Some(task) = db.task(task_id)? else {
        return Ok(0);
    };
    let history = db.completions_for_task(task_id)?;
    Ok(streak(&task, &history, reference))
}

/// Enriches one habit with its completion state, streak, next date and achievements.
///
/// `on_date` holds the completions recorded on `date`.
pub fn task_with_completion<S: Storage + ?Sized>(
    store: &S,
    task: Task,
    date: NaiveDate,
    on_date: &[Completion],
) -> Result<TaskWithCompletion> {
    let completion = on_date.iter().find(|c| c.task_id == task.id);
    let history = store.completions_for_task(task.id)?;
    let mut achievements = store.achievements_for_task(task.id)?;
    achievements.sort_by(|a, b| b.streak_count.cmp(&a.streak_count));

    Ok(TaskWithCompletion {
        is_completed: completion.is_some(),
        completion_id: completion.map(|c| c.id),
        streak: streak(&task, &history, date),
        next_occurrence: next_occurrence(&task, date),
        latest_milestone: achievements.first().cloned(),
        achievements,
        task,
    })
}

/// Active habits due on `date`, each with its state on that date.
pub fn daily_summary<S: Storage + ?Sized>(store: &S, date: NaiveDate) -> Result<DailySummary> {
    let db = store.snapshot()?;
    let db: &MemoryStore = &db;
    let on_date = db.completions_on(date)?;
    let tasks = db
        .tasks()?
        .into_iter()
        .filter(|t| is_due(t, date))
        .map(|t| task_with_completion(db, t, date, &on_date))
        .collect::<Result<Vec<_>>>()?;

    let total_tasks = tasks.len();
    let completed_tasks = tasks.iter().filter(|t| t.is_completed).count();
    debug!(%date, total_tasks, completed_tasks, "daily summary built");

    Ok(DailySummary {
        date,
        total_tasks,
        completed_tasks,
        completion_rate: completion_rate(completed_tasks, total_tasks),
        tasks,
    })
}

/// Per-day completion series and totals for one calendar month.
pub fn monthly_stats<S: Storage + ?Sized>(store: &S, year: i32, month: u32) -> Result<MonthlyStats> {
    let month_name = u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or(Error::InvalidMonth(month))?
        .name()
        .to_string();
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::invalid_input(format!("year {} is out of range", year)))?;

    let db = store.snapshot()?;
    let tasks = db.tasks()?;
    let mut daily_completions = Vec::new();
    for date in first.iter_days().take_while(|d| d.month() == month) {
        let due: Vec<&Task> = tasks.iter().filter(|t| is_due(t, date)).collect();
        let count = db
            .completions_on(date)?
            .iter()
            .filter(|c| due.iter().any(|t| t.id == c.task_id))
            .count();
        daily_completions.push(DayCompletion {
            date,
            count,
            total: due.len(),
        });
    }

    let completed_count = daily_completions.iter().map(|d| d.count).sum();
    let total_due = daily_completions.iter().map(|d| d.total).sum();
    debug!(year, month, completed_count, total_due, "monthly stats built");

    Ok(MonthlyStats {
        year,
        month,
        month_name,
        total_tasks: tasks.len(),
        completed_count,
        total_due,
        completion_rate: completion_rate(completed_count, total_due),
        streak_days: perfect_day_streak(&daily_completions),
        daily_completions,
    })
}
