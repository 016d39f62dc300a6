use chrono::Datelike;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, InputMode, ViewMode};
use crate::commands::short_id;
use crate::models::{DayCompletion, Frequency};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    match app.view_mode {
        ViewMode::Today => render_today(f, app, chunks[0]),
        ViewMode::Habits => render_habits(f, app, chunks[0]),
        ViewMode::Month => render_month(f, app, chunks[0]),
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Today => "q: Quit | Space: Done/Undo | ←/→: Day | t: Today | a: Add | v: View Habits",
            ViewMode::Habits => "q: Quit | a: Add | p: Pause/Resume | d: Del | v: View Month",
            ViewMode::Month => "q: Quit | ←/→: Month | t: This Month | v: View Today",
        },
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };

    let mut block = Block::default().borders(Borders::ALL);
    if let Some(msg) = &app.message {
        block = block.title(msg.as_str());
    }
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(block);

    f.render_widget(help, chunks[1]);

    // Render Input Box if needed
    if app.input_mode == InputMode::Adding {
        let area = centered_rect(60, 3, f.area()); // Fixed height of 3 (border + 1 line)
        f.render_widget(Clear, area); // Clear the area first

        let title = match app.add_state.step {
            0 => "Add Habit: Enter Title",
            1 => "Add Habit: Enter Time HH:MM (Optional, 09:00)",
            2 => "Add Habit: Enter Frequency (daily, monthly, yearly)",
            3 if app.add_state.frequency == Some(Frequency::Yearly) => "Add Habit: Enter Day (1-31)",
            3 => "Add Habit: Enter Day of Month (1-31)",
            4 => "Add Habit: Enter Month (1-12)",
            _ => "Add Habit",
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(input, area);
    }
}

fn header(names: &[&'static str]) -> Row<'static> {
    Row::new(names.to_vec())
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .bottom_margin(1)
}

fn render_today(f: &mut Frame, app: &mut App, area: Rect) {
    let Some(summary) = &app.summary else {
        return;
    };

    let rows: Vec<Row> = summary
        .tasks
        .iter()
        .map(|t| {
            let style = if t.is_completed {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Yellow)
            };
            Row::new(vec![
                Cell::from(t.task.time.to_string()),
                Cell::from(t.task.title.clone()),
                Cell::from(t.task.schedule_label()),
                Cell::from(t.streak.to_string()),
                Cell::from(t.next_occurrence.map(|d| d.to_string()).unwrap_or_default()),
                Cell::from(t.latest_milestone.as_ref().map(|a| a.kind.label()).unwrap_or("")),
                Cell::from(if t.is_completed { "Done" } else { "Pending" }),
            ]).style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Min(20),
        Constraint::Length(18),
        Constraint::Length(7),
        Constraint::Length(12),
        Constraint::Length(16),
        Constraint::Length(8),
    ];

    let title = format!(
        "Habitust - {} ({}/{} done, {:.0}%)",
        summary.date, summary.completed_tasks, summary.total_tasks, summary.completion_rate
    );
    let table = Table::new(rows, widths)
        .header(header(&["Time", "Habit", "Schedule", "Streak", "Next", "Milestone", "Status"]))
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_habits(f: &mut Frame, app: &mut App, area: Rect) {
    let rows: Vec<Row> = app
        .tasks
        .iter()
        .map(|t| {
            let style = if t.is_active {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Row::new(vec![
                Cell::from(short_id(&t.id)),
                Cell::from(t.title.clone()),
                Cell::from(t.time.to_string()),
                Cell::from(t.schedule_label()),
                Cell::from(if t.is_active { "Active" } else { "Paused" }),
            ]).style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Min(20),
        Constraint::Length(6),
        Constraint::Length(18),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(header(&["ID", "Habit", "Time", "Schedule", "Status"]))
        .block(Block::default().borders(Borders::ALL).title("Habitust - Habits"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.habit_state);
}

fn day_style(day: &DayCompletion) -> Style {
    let color = if day.total == 0 {
        Color::DarkGray
    } else if day.is_perfect() {
        Color::Green
    } else if day.count > 0 {
        Color::Yellow
    } else {
        Color::Red
    };
    Style::default().fg(color)
}

fn render_month(f: &mut Frame, app: &mut App, area: Rect) {
    let Some(stats) = &app.stats else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);

    let mut rows: Vec<Row> = Vec::new();
    let mut cells: Vec<Cell> = Vec::new();
    if let Some(first) = stats.daily_completions.first() {
        for _ in 0..first.date.weekday().num_days_from_monday() {
            cells.push(Cell::from(""));
        }
    }
    for day in &stats.daily_completions {
        let text = if day.total == 0 {
            format!("{:>2}   -", day.date.day())
        } else {
            format!("{:>2}  {}/{}", day.date.day(), day.count, day.total)
        };
        let mut style = day_style(day);
        if day.date == app.date {
            style = style.add_modifier(Modifier::REVERSED);
        }
        cells.push(Cell::from(text).style(style));
        if cells.len() == 7 {
            rows.push(Row::new(std::mem::take(&mut cells)).height(2));
        }
    }
    if !cells.is_empty() {
        rows.push(Row::new(cells).height(2));
    }

    let widths = [Constraint::Ratio(1, 7); 7];
    let table = Table::new(rows, widths)
        .header(header(&["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Habitust - {} {}", stats.month_name, stats.year)),
        );
    f.render_widget(table, chunks[0]);

    let totals = Paragraph::new(format!(
        "Active habits: {} | Completed: {}/{} ({:.0}%) | Best perfect-day streak: {}",
        stats.total_tasks, stats.completed_count, stats.total_due, stats.completion_rate, stats.streak_days
    ))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(totals, chunks[1]);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
