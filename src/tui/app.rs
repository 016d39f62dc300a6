use chrono::{Datelike, Days, Months, NaiveDate};
use ratatui::widgets::TableState;

use crate::commands::{build_input, today};
use crate::milestones::record_completion;
use crate::models::{DailySummary, Frequency, MonthlyStats, Task};
use crate::storage::{JsonStore, Storage};
use crate::summary::{daily_summary, monthly_stats};

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Adding,
}

#[derive(PartialEq)]
pub enum ViewMode {
    Today,
    Habits,
    Month,
}

/// State for the multi-step "Add Habit" wizard.
#[derive(Default)]
pub struct AddState {
    pub title: String,
    pub time: Option<String>,
    pub frequency: Option<Frequency>,
    pub day: Option<u32>,
    pub step: usize, // 0: Title, 1: Time, 2: Frequency, 3: Day, 4: Month
}

pub struct App {
    pub store: JsonStore,
    /// Date shown by the Today view; the Month view shows its month.
    pub date: NaiveDate,
    pub summary: Option<DailySummary>,
    pub tasks: Vec<Task>,
    pub stats: Option<MonthlyStats>,
    pub state: TableState,
    pub habit_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub add_state: AddState,
    /// Last status or error line.
    pub message: Option<String>,
}

fn select_within(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}

fn step(state: &mut TableState, len: usize, forward: bool) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some(i) if forward => if i >= len - 1 { 0 } else { i + 1 },
        Some(i) => if i == 0 { len - 1 } else { i - 1 },
        None => 0,
    };
    state.select(Some(i));
}

impl App {
    /// Creates a new App instance and loads initial data.
    pub fn new(store: JsonStore) -> App {
        let mut app = App {
            store,
            date: today(),
            summary: None,
            tasks: Vec::new(),
            stats: None,
            state: TableState::default(),
            habit_state: TableState::default(),
            view_mode: ViewMode::Today,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            add_state: AddState::default(),
            message: None,
        };
        app.reload();
        app
    }

    /// Recomputes the summary, habit list and month stats from storage.
    pub fn reload(&mut self) {
        let loaded = self.store.snapshot().and_then(|db| {
            let mut summary = daily_summary(&*db, self.date)?;
            summary
                .tasks
                .sort_by(|a, b| a.task.time.cmp(&b.task.time).then_with(|| a.task.title.cmp(&b.task.title)));
            let mut tasks = db.all_tasks()?;
            tasks.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.title.cmp(&b.title)));
            let stats = monthly_stats(&*db, self.date.year(), self.date.month())?;
            Ok((summary, tasks, stats))
        });
        match loaded {
            Ok((summary, tasks, stats)) => {
                select_within(&mut self.state, summary.tasks.len());
                select_within(&mut self.habit_state, tasks.len());
                self.summary = Some(summary);
                self.tasks = tasks;
                self.stats = Some(stats);
            }
            Err(e) => self.message = Some(format!("Failed to load habits: {}", e)),
        }
    }

    fn today_len(&self) -> usize {
        self.summary.as_ref().map_or(0, |s| s.tasks.len())
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        match self.view_mode {
            ViewMode::Today => {
                let len = self.today_len();
                step(&mut self.state, len, true)
            }
            ViewMode::Habits => step(&mut self.habit_state, self.tasks.len(), true),
            ViewMode::Month => {}
        }
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        match self.view_mode {
            ViewMode::Today => {
                let len = self.today_len();
                step(&mut self.state, len, false)
            }
            ViewMode::Habits => step(&mut self.habit_state, self.tasks.len(), false),
            ViewMode::Month => {}
        }
    }

    /// Cycles Today -> Habits -> Month.
    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Today => ViewMode::Habits,
            ViewMode::Habits => ViewMode::Month,
            ViewMode::Month => ViewMode::Today,
        };
    }

    /// Moves one day (Today view) or one month (Month view) back or forward.
    pub fn shift(&mut self, forward: bool) {
        let moved = match (&self.view_mode, forward) {
            (ViewMode::Today, true) => self.date.checked_add_days(Days::new(1)),
            (ViewMode::Today, false) => self.date.checked_sub_days(Days::new(1)),
            (ViewMode::Month, true) => self.date.checked_add_months(Months::new(1)),
            (ViewMode::Month, false) => self.date.checked_sub_months(Months::new(1)),
            (ViewMode::Habits, _) => None,
        };
        if let Some(date) = moved {
            self.date = date;
            self.reload();
        }
    }

    pub fn go_today(&mut self) {
        self.date = today();
        self.reload();
    }

    /// Marks the selected habit done on the shown date, or undoes it.
    pub fn toggle_selected(&mut self) {
        if self.view_mode != ViewMode::Today {
            return;
        }
        let Some(row) = self
            .state
            .selected()
            .and_then(|i| self.summary.as_ref().and_then(|s| s.tasks.get(i)))
        else {
            return;
        };
        let (task_id, title, completion_id) = (row.task.id, row.task.title.clone(), row.completion_id);

        self.message = Some(match completion_id {
            Some(id) => match self.store.delete_completion(id) {
                Ok(_) => format!("'{}' marked as not done.", title),
                Err(e) => format!("Failed to undo completion: {}", e),
            },
            None => match record_completion(&mut self.store, task_id, self.date) {
                Ok(outcome) => {
                    let mut msg = format!("'{}' done! Streak: {}", title, outcome.streak);
                    for a in &outcome.awarded {
                        msg.push_str(&format!(" | Achievement unlocked: {}", a.kind.label()));
                    }
                    msg
                }
                Err(e) => format!("Failed to record completion: {}", e),
            },
        });
        self.reload();
    }

    fn selected_habit(&self) -> Option<&Task> {
        self.habit_state.selected().and_then(|i| self.tasks.get(i))
    }

    /// Deletes the selected habit (Habits view).
    pub fn delete_selected(&mut self) {
        if self.view_mode != ViewMode::Habits {
            return;
        }
        let Some((id, title)) = self.selected_habit().map(|t| (t.id, t.title.clone())) else {
            return;
        };
        self.message = Some(match self.store.delete_task(id) {
            Ok(_) => format!("Habit '{}' removed.", title),
            Err(e) => format!("Failed to remove habit: {}", e),
        });
        self.reload();
    }

    /// Pauses or resumes the selected habit (Habits view).
    pub fn toggle_active_selected(&mut self) {
        if self.view_mode != ViewMode::Habits {
            return;
        }
        let Some(task) = self.selected_habit().cloned() else {
            return;
        };
        let mut input = task.to_input();
        input.is_active = !task.is_active;
        let state = if input.is_active { "resumed" } else { "paused" };
        self.message = Some(match self.store.update_task(task.id, input) {
            Ok(_) => format!("Habit '{}' {}.", task.title, state),
            Err(e) => format!("Failed to update habit: {}", e),
        });
        self.reload();
    }

    /// Initiates the "Add Habit" wizard.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Handles input for the "Add Habit" wizard.
    pub fn handle_input(&mut self) {
        let value = self.input_buffer.trim().to_string();
        match self.add_state.step {
            0 => { // Title
                if value.is_empty() { return; }
                self.add_state.title = value;
                self.add_state.step = 1;
            }
            1 => { // Time
                self.add_state.time = Some(value).filter(|v| !v.is_empty());
                self.add_state.step = 2;
            }
            2 => { // Frequency
                let frequency = if value.is_empty() { Ok(Frequency::Daily) } else { value.parse() };
                match frequency {
                    Ok(Frequency::Daily) => {
                        self.add_state.frequency = Some(Frequency::Daily);
                        return self.finish_add(None);
                    }
                    Ok(f) => {
                        self.add_state.frequency = Some(f);
                        self.add_state.step = 3;
                    }
                    Err(e) => {
                        self.message = Some(e.to_string());
                        return;
                    }
                }
            }
            3 => { // Day
                let Ok(day) = value.parse::<u32>() else { return };
                self.add_state.day = Some(day);
                if self.add_state.frequency == Some(Frequency::Yearly) {
                    self.add_state.step = 4;
                } else {
                    return self.finish_add(None);
                }
            }
            4 => { // Month
                let Ok(month) = value.parse::<u32>() else { return };
                return self.finish_add(Some(month));
            }
            _ => {}
        }
        self.input_buffer.clear();
    }

    fn finish_add(&mut self, month: Option<u32>) {
        let add = std::mem::take(&mut self.add_state);
        let created = build_input(
            add.title,
            None,
            add.time,
            add.frequency.unwrap_or(Frequency::Daily),
            add.day,
            month,
        )
        .and_then(|input| self.store.create_task(input));
        self.message = Some(match created {
            Ok(task) => format!("Habit '{}' added, {}.", task.title, task.schedule_label()),
            Err(e) => format!("Failed to add habit: {}", e),
        });
        self.cancel_input();
        self.reload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskInput;

    #[test]
    fn today_selection_wraps_both_ways() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::new(dir.path().join("habits.json"));
        store.create_task(TaskInput::daily("Read")).unwrap();
        store.create_task(TaskInput::daily("Walk")).unwrap();

        let mut app = App::new(store);
        assert_eq!(app.state.selected(), Some(0));
        app.next();
        assert_eq!(app.state.selected(), Some(1));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(1));
    }

    #[test]
    fn space_toggles_completion_on_shown_date() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::new(dir.path().join("habits.json"));
        store.create_task(TaskInput::daily("Read")).unwrap();

        let mut app = App::new(store);
        app.toggle_selected();
        assert_eq!(app.summary.as_ref().map(|s| s.completed_tasks), Some(1));
        app.toggle_selected();
        assert_eq!(app.summary.as_ref().map(|s| s.completed_tasks), Some(0));
    }
}
