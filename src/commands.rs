use std::io::{self, Write};

use chrono::{Datelike, Local, NaiveDate};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::milestones::record_completion;
use crate::models::{DayCompletion, Frequency, Task, TaskInput, TimeOfDay};
use crate::recurrence::{next_occurrence, streak};
use crate::storage::{resolve_task, JsonStore, Storage};
use crate::summary::{daily_summary, monthly_stats};

/// Today's date in the local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.len() != 10 {
        return Err(Error::invalid_input(format!("invalid date '{}'. Use YYYY-MM-DD", s)));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::invalid_input(format!("invalid date '{}': {}. Use YYYY-MM-DD", s, e)))
}

fn date_or_today(date: Option<String>) -> Result<NaiveDate> {
    date.as_deref().map(parse_date).unwrap_or_else(|| Ok(today()))
}

/// First eight characters of an id, enough to address a habit from the CLI.
pub fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Builds a validated [`TaskInput`] from command line values.
///
/// `day` is the day of the month for both monthly and yearly habits;
/// `month` only applies to yearly ones.
pub fn build_input(
    title: String,
    description: Option<String>,
    time: Option<String>,
    frequency: Frequency,
    day: Option<u32>,
    month: Option<u32>,
) -> Result<TaskInput> {
    let time = match time {
        Some(t) => t.parse::<TimeOfDay>()?,
        None => TimeOfDay::default(),
    };
    let input = TaskInput {
        title,
        description: description.filter(|d| !d.trim().is_empty()),
        time,
        frequency,
        day_of_month: if frequency == Frequency::Monthly { day } else { None },
        month_of_year: if frequency == Frequency::Yearly { month } else { None },
        day_of_year: if frequency == Frequency::Yearly { day } else { None },
        is_active: true,
    };
    input.validate()?;
    Ok(input)
}

/// Adds a new habit to the database.
pub fn cmd_add<S: Storage>(store: &mut S, input: TaskInput, silent: bool) {
    match store.create_task(input) {
        Ok(task) => {
            if !silent {
                println!("Habit '{}' added (id = {}), {}.", task.title, short_id(&task.id), task.schedule_label());
            }
        }
        Err(e) => {
            if !silent { eprintln!("Failed to add habit: {}", e); }
        }
    }
}

/// Changes to apply to an existing habit. `None` leaves a field as is.
#[derive(Debug, Default, Clone)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time: Option<String>,
    pub frequency: Option<Frequency>,
    pub day: Option<u32>,
    pub month: Option<u32>,
}

fn edited_input(task: &Task, edit: TaskEdit) -> Result<TaskInput> {
    let mut input = task.to_input();
    if let Some(title) = edit.title { input.title = title; }
    if let Some(d) = edit.description {
        input.description = Some(d).filter(|d| !d.trim().is_empty());
    }
    if let Some(t) = edit.time { input.time = t.parse()?; }
    if let Some(f) = edit.frequency {
        if f != input.frequency {
            input.day_of_month = None;
            input.month_of_year = None;
            input.day_of_year = None;
        }
        input.frequency = f;
    }
    match input.frequency {
        Frequency::Daily => {}
        Frequency::Monthly => {
            if edit.day.is_some() { input.day_of_month = edit.day; }
        }
        Frequency::Yearly => {
            if edit.day.is_some() { input.day_of_year = edit.day; }
            if edit.month.is_some() { input.month_of_year = edit.month; }
        }
    }
    input.validate()?;
    Ok(input)
}

/// Edits an existing habit's details.
pub fn cmd_edit<S: Storage>(store: &mut S, id: &str, edit: TaskEdit, silent: bool) {
    let result = resolve_task(store, id).and_then(|task| {
        let input = edited_input(&task, edit)?;
        store.update_task(task.id, input)
    });
    match result {
        Ok(Some(task)) => {
            if !silent { println!("Habit {} updated.", short_id(&task.id)); }
        }
        Ok(None) => {
            if !silent { eprintln!("Habit {} not found.", id); }
        }
        Err(e) => {
            if !silent { eprintln!("Failed to update habit: {}", e); }
        }
    }
}

/// Pauses or resumes a habit. Paused habits keep their history.
pub fn cmd_set_active<S: Storage>(store: &mut S, id: &str, active: bool, silent: bool) {
    let result = resolve_task(store, id).and_then(|task| {
        let mut input = task.to_input();
        input.is_active = active;
        store.update_task(task.id, input)
    });
    match result {
        Ok(Some(task)) => {
            if !silent {
                let state = if active { "resumed" } else { "paused" };
                println!("Habit '{}' {}.", task.title, state);
            }
        }
        Ok(None) => {
            if !silent { eprintln!("Habit {} not found.", id); }
        }
        Err(e) => {
            if !silent { eprintln!("Failed to update habit: {}", e); }
        }
    }
}

/// Removes a habit along with its completions and achievements.
pub fn cmd_remove<S: Storage>(store: &mut S, id: &str, silent: bool) {
    let result = resolve_task(store, id).and_then(|task| {
        store.delete_task(task.id).map(|deleted| (task, deleted))
    });
    match result {
        Ok((task, true)) => {
            if !silent { println!("Habit '{}' removed.", task.title); }
        }
        Ok((_, false)) => {
            if !silent { eprintln!("Habit {} not found.", id); }
        }
        Err(e) => {
            if !silent { eprintln!("Failed to remove habit: {}", e); }
        }
    }
}

/// Marks a habit as done on `date` (default today) and announces new milestones.
pub fn cmd_done<S: Storage>(store: &mut S, id: &str, date: Option<String>, silent: bool) {
    let result = date_or_today(date).and_then(|date| {
        let task = resolve_task(store, id)?;
        let outcome = record_completion(store, task.id, date)?;
        Ok((task, outcome))
    });
    match result {
        Ok((task, outcome)) => {
            if !silent {
                println!(
                    "Habit '{}' done for {}. Streak: {}",
                    task.title, outcome.completion.date, outcome.streak
                );
                for achievement in &outcome.awarded {
                    println!("Achievement unlocked: {}!", achievement.kind.label().trim_end_matches('!'));
                }
            }
        }
        Err(e) => {
            if !silent { eprintln!("Failed to record completion: {}", e); }
        }
    }
}

/// Removes the completion of a habit on `date` (default today).
pub fn cmd_undo<S: Storage>(store: &mut S, id: &str, date: Option<String>, silent: bool) {
    let result = date_or_today(date).and_then(|date| {
        let task = resolve_task(store, id)?;
        let removed = store.delete_completion_for(task.id, date)?;
        Ok((task, date, removed))
    });
    match result {
        Ok((task, date, true)) => {
            if !silent { println!("Habit '{}' no longer done for {}.", task.title, date); }
        }
        Ok((task, date, false)) => {
            if !silent { eprintln!("Habit '{}' was not done on {}.", task.title, date); }
        }
        Err(e) => {
            if !silent { eprintln!("Failed to undo completion: {}", e); }
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to encode JSON: {}", e),
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

/// One row of the habit listing.
struct ListedHabit {
    task: Task,
    streak: u32,
    next: Option<NaiveDate>,
    badges: Vec<u32>,
}

fn listed_habits<S: Storage>(store: &S, all: bool, on: NaiveDate) -> Result<Vec<ListedHabit>> {
    let db = store.snapshot()?;
    let tasks = if all { db.all_tasks()? } else { db.tasks()? };
    let mut rows = Vec::with_capacity(tasks.len());
    for task in tasks {
        let history = db.completions_for_task(task.id)?;
        let badges = db
            .achievements_for_task(task.id)?
            .iter()
            .map(|a| a.kind.threshold())
            .collect();
        rows.push(ListedHabit {
            streak: streak(&task, &history, on),
            next: next_occurrence(&task, on),
            badges,
            task,
        });
    }
    rows.sort_by(|a, b| a.task.time.cmp(&b.task.time).then_with(|| a.task.title.cmp(&b.task.title)));
    Ok(rows)
}

/// Lists habits in a formatted table, ordered by scheduled time.
///
/// By default, hides paused habits unless `all` is true.
pub fn cmd_list<S: Storage>(store: &S, all: bool) {
    let rows = match listed_habits(store, all, today()) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Failed to load habits: {}", e);
            return;
        }
    };
    if rows.is_empty() {
        println!("No habits found.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["ID", "Habit", "Time", "Schedule", "Next", "Streak", "Badges", "Status"]));

    for row in rows {
        let t = &row.task;
        let badges = row.badges.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(", ");
        let next = row.next.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        let (status, status_color) = if t.is_active {
            ("Active", Color::Green)
        } else {
            ("Paused", Color::Grey)
        };
        let title = match &t.description {
            Some(d) => format!("{}\n{}", t.title, d),
            None => t.title.clone(),
        };

        table.add_row(vec![
            Cell::new(short_id(&t.id)),
            Cell::new(title),
            Cell::new(t.time),
            Cell::new(t.schedule_label()),
            Cell::new(next),
            Cell::new(row.streak).fg(if row.streak > 0 { Color::Yellow } else { Color::Reset }),
            Cell::new(badges),
            Cell::new(status).fg(status_color),
        ]);
    }

    println!("{table}");
}

/// Shows the habits due on `date` (default today) with streaks and totals.
pub fn cmd_today<S: Storage>(store: &S, date: Option<String>, json: bool) {
    let summary = match date_or_today(date).and_then(|d| daily_summary(store, d)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to build daily summary: {}", e);
            return;
        }
    };
    if json {
        print_json(&summary);
        return;
    }
    if summary.tasks.is_empty() {
        println!("Nothing due on {}.", summary.date);
        return;
    }

    let mut rows = summary.tasks;
    rows.sort_by(|a, b| a.task.time.cmp(&b.task.time).then_with(|| a.task.title.cmp(&b.task.title)));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["ID", "Time", "Habit", "Schedule", "Streak", "Next", "Milestone", "Status"]));

    for row in rows {
        let (status, color) = if row.is_completed {
            ("Done", Color::Green)
        } else {
            ("Pending", Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(short_id(&row.task.id)),
            Cell::new(row.task.time),
            Cell::new(&row.task.title),
            Cell::new(row.task.schedule_label()),
            Cell::new(row.streak),
            Cell::new(row.next_occurrence.map(|d| d.to_string()).unwrap_or_else(|| "-".into())),
            Cell::new(row.latest_milestone.map(|a| a.kind.label()).unwrap_or("-")),
            Cell::new(status).fg(color),
        ]);
    }

    println!("{table}");
    println!(
        "{}: {}/{} done ({:.0}%)",
        summary.date, summary.completed_tasks, summary.total_tasks, summary.completion_rate
    );
}

fn day_color(day: &DayCompletion) -> Color {
    if day.total == 0 {
        Color::DarkGrey
    } else if day.is_perfect() {
        Color::Green
    } else if day.count > 0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Prints a calendar of the month with `done/due` per day.
pub fn cmd_month<S: Storage>(store: &S, year: Option<i32>, month: Option<u32>, json: bool) {
    let now = today();
    let year = year.unwrap_or(now.year());
    let month = month.unwrap_or(now.month());
    if !(1..=12).contains(&month) {
        eprintln!("Invalid month {}. Use 1-12.", month);
        return;
    }
    let stats = match monthly_stats(store, year, month) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to build monthly stats: {}", e);
            return;
        }
    };
    if json {
        print_json(&stats);
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(header(&["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]));

    let mut row: Vec<Cell> = Vec::new();
    if let Some(first) = stats.daily_completions.first() {
        for _ in 0..first.date.weekday().num_days_from_monday() {
            row.push(Cell::new(""));
        }
    }
    for day in &stats.daily_completions {
        let text = if day.total == 0 {
            format!("{:>2}\n  -", day.date.day())
        } else {
            format!("{:>2}\n{}/{}", day.date.day(), day.count, day.total)
        };
        row.push(Cell::new(text).fg(day_color(day)));
        if row.len() == 7 {
            table.add_row(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        while row.len() < 7 {
            row.push(Cell::new(""));
        }
        table.add_row(row);
    }

    println!("{} {}", stats.month_name, stats.year);
    println!("{table}");
    println!(
        "Active habits: {} | Completed: {}/{} ({:.0}%) | Best perfect-day streak: {}",
        stats.total_tasks, stats.completed_count, stats.total_due, stats.completion_rate, stats.streak_days
    );
}

/// Lists earned achievements, for one habit or all of them.
pub fn cmd_achievements<S: Storage>(store: &S, id: Option<String>) {
    let loaded = store.snapshot().and_then(|db| match id.as_deref() {
        Some(id) => resolve_task(&*db, id).and_then(|t| {
            let list = db.achievements_for_task(t.id)?;
            Ok((vec![t], list))
        }),
        None => Ok((db.all_tasks()?, db.achievements()?)),
    });
    let (tasks, mut achievements) = match loaded {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Failed to load achievements: {}", e);
            return;
        }
    };
    if achievements.is_empty() {
        println!("No achievements yet.");
        return;
    }
    achievements.sort_by(|a, b| a.earned_at.cmp(&b.earned_at));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(header(&["Habit", "Milestone", "Streak", "Earned"]));
    for a in achievements {
        let title = tasks
            .iter()
            .find(|t| t.id == a.task_id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| short_id(&a.task_id));
        table.add_row(vec![
            Cell::new(title),
            Cell::new(a.kind.label()).fg(Color::Magenta),
            Cell::new(a.streak_count),
            Cell::new(a.earned_at.with_timezone(&Local).format("%Y-%m-%d")),
        ]);
    }
    println!("{table}");
}

/// Resets the database by deleting the habit file.
pub fn cmd_reset(store: &JsonStore, force: bool) {
    if !force {
        print!("Are you sure you want to delete all habits and their history? This cannot be undone. [y/N] ");
        let mut input = String::new();
        if io::stdout().flush().is_err() || io::stdin().read_line(&mut input).is_err() {
            eprintln!("Failed to read confirmation.");
            return;
        }
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return;
        }
    }

    if let Err(e) = store.reset() {
        eprintln!("Failed to reset database: {}", e);
    } else {
        println!("Database reset successfully.");
    }
}
