use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::models::{Completion, Frequency, Task};

/// Most due dates a streak walk will check before settling on its answer.
pub const MAX_LOOKBACK_DAYS: u32 = 365;

/// Days scanned forward when looking for the next occurrence.
pub const MAX_LOOKAHEAD_DAYS: u32 = 365;

/// Consecutive non-due days a backward walk tolerates before giving up.
///
/// Eight years covers the longest gap between two February 29ths.
pub const MAX_GAP_DAYS: u32 = 8 * 366;

/// Termination bounds for the backward and forward scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    /// Due dates a streak walk checks at most.
    pub lookback: u32,
    /// Days a next-occurrence scan looks ahead.
    pub lookahead: u32,
    /// Consecutive non-due days before a streak walk stops.
    pub max_gap: u32,
}

impl Default for Horizon {
    fn default() -> Self {
        Horizon {
            lookback: MAX_LOOKBACK_DAYS,
            lookahead: MAX_LOOKAHEAD_DAYS,
            max_gap: MAX_GAP_DAYS,
        }
    }
}

/// Whether `task` is due on `date`.
///
/// Days that don't exist in a month never fire: a habit on the 31st is
/// skipped in 30-day months and February, and a yearly habit on
/// February 29 only fires in leap years. Missing parameters mean never due.
pub fn is_due(task: &Task, date: NaiveDate) -> bool {
    match task.frequency {
        Frequency::Daily => true,
        Frequency::Monthly => task.day_of_month.is_some_and(|day| date.day() == day),
        Frequency::Yearly => match (task.month_of_year, task.day_of_year) {
            (Some(month), Some(day)) => date.month() == month && date.day() == day,
            _ => false,
        },
    }
}

/// Dates on which `task` was completed.
pub fn completed_dates(task: &Task, completions: &[Completion]) -> HashSet<NaiveDate> {
    completions
        .iter()
        .filter(|c| c.task_id == task.id)
        .map(|c| c.date)
        .collect()
}

/// Consecutive completed occurrences of `task`, walking back from `reference`.
///
/// Non-due days are skipped; the first due day without a completion ends
/// the streak. A monthly habit's streak therefore counts months.
pub fn streak(task: &Task, completions: &[Completion], reference: NaiveDate) -> u32 {
    streak_within(task, completions, reference, Horizon::default())
}

/// [`streak`] with explicit scan bounds.
pub fn streak_within(
    task: &Task,
    completions: &[Completion],
    reference: NaiveDate,
    horizon: Horizon,
) -> u32 {
    let done = completed_dates(task, completions);
    let mut streak = 0;
    let mut checked = 0;
    let mut gap = 0;
    let mut day = reference;

    while checked < horizon.lookback {
        if is_due(task, day) {
            checked += 1;
            gap = 0;
            if !done.contains(&day) {
                return streak;
            }
            streak += 1;
        } else {
            gap += 1;
            if gap > horizon.max_gap {
                if streak == 0 {
                    warn!(task = %task.id, "habit has not been due for {} days", horizon.max_gap);
                }
                return streak;
            }
        }
        day = match day.pred_opt() {
            Some(prev) => prev,
            None => return streak,
        };
    }

    debug!(task = %task.id, streak, "streak walk reached its lookback bound");
    streak
}

/// First date strictly after `after` on which `task` is due.
pub fn next_occurrence(task: &Task, after: NaiveDate) -> Option<NaiveDate> {
    next_occurrence_within(task, after, Horizon::default())
}

/// [`next_occurrence`] with explicit scan bounds.
pub fn next_occurrence_within(task: &Task, after: NaiveDate, horizon: Horizon) -> Option<NaiveDate> {
    let mut day = after;
    for _ in 0..horizon.lookahead {
        day = day.succ_opt()?;
        if is_due(task, day) {
            return Some(day);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskInput;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn done(task: &Task, dates: &[NaiveDate]) -> Vec<Completion> {
        dates
            .iter()
            .map(|d| Completion {
                id: Uuid::new_v4(),
                task_id: task.id,
                date: *d,
                completed_at: Utc::now(),
            })
            .collect()
    }

    fn every_day(year: i32) -> impl Iterator<Item = NaiveDate> {
        date(year, 1, 1)
            .iter_days()
            .take_while(move |d| d.year() == year)
    }

    #[test]
    fn daily_is_always_due() {
        let task = Task::from_input(TaskInput::daily("Stretch"));
        assert!(every_day(2024).all(|d| is_due(&task, d)));
    }

    #[test]
    fn day_31_only_fires_in_long_months() {
        let task = Task::from_input(TaskInput::monthly("Review budget", 31));
        let due: Vec<NaiveDate> = every_day(2023).filter(|d| is_due(&task, *d)).collect();
        assert_eq!(due.len(), 7);
        assert!(due.iter().all(|d| d.day() == 31));
        assert!(!due.iter().any(|d| matches!(d.month(), 2 | 4 | 6 | 9 | 11)));
    }

    #[test]
    fn february_29_only_in_leap_years() {
        let task = Task::from_input(TaskInput::yearly("Leap day", 2, 29));
        for year in [2023, 2025] {
            assert!(!every_day(year).any(|d| is_due(&task, d)));
        }
        let due: Vec<NaiveDate> = every_day(2024).filter(|d| is_due(&task, *d)).collect();
        assert_eq!(due, vec![date(2024, 2, 29)]);
    }

    #[test]
    fn missing_parameters_are_never_due() {
        let mut monthly = Task::from_input(TaskInput::monthly("Broken", 1));
        monthly.day_of_month = None;
        let mut yearly = Task::from_input(TaskInput::yearly("Broken", 1, 1));
        yearly.day_of_year = None;
        for d in every_day(2024) {
            assert!(!is_due(&monthly, d));
            assert!(!is_due(&yearly, d));
        }
    }

    #[test]
    fn five_consecutive_days() {
        let task = Task::from_input(TaskInput::daily("Read"));
        let today = date(2024, 3, 10);
        let mut dates: Vec<NaiveDate> = (0..5).map(|i| today - chrono::Days::new(i)).collect();
        // an older completion separated by a gap must not count
        dates.push(date(2024, 3, 4));
        assert_eq!(streak(&task, &done(&task, &dates), today), 5);
    }

    #[test]
    fn uncompleted_reference_day_gives_zero() {
        let task = Task::from_input(TaskInput::daily("Read"));
        let completions = done(&task, &[date(2024, 3, 9)]);
        assert_eq!(streak(&task, &completions, date(2024, 3, 10)), 0);
    }

    #[test]
    fn monthly_streak_counts_months() {
        let task = Task::from_input(TaskInput::monthly("Water plants", 15));
        let completions = done(
            &task,
            &[date(2024, 6, 15), date(2024, 5, 15), date(2024, 4, 15), date(2024, 2, 15)],
        );
        assert_eq!(streak(&task, &completions, date(2024, 6, 20)), 3);
    }

    #[test]
    fn other_tasks_completions_are_ignored() {
        let task = Task::from_input(TaskInput::daily("Read"));
        let other = Task::from_input(TaskInput::daily("Run"));
        let completions = done(&other, &[date(2024, 3, 10)]);
        assert_eq!(streak(&task, &completions, date(2024, 3, 10)), 0);
    }

    #[test]
    fn streak_is_capped_by_lookback() {
        let task = Task::from_input(TaskInput::daily("Meditate"));
        let today = date(2024, 12, 31);
        let dates: Vec<NaiveDate> = (0..400).map(|i| today - chrono::Days::new(i)).collect();
        let completions = done(&task, &dates);
        assert_eq!(streak(&task, &completions, today), MAX_LOOKBACK_DAYS);

        let short = Horizon { lookback: 10, ..Horizon::default() };
        assert_eq!(streak_within(&task, &completions, today, short), 10);
    }

    #[test]
    fn never_due_task_terminates() {
        let task = Task::from_input(TaskInput::yearly("Impossible", 2, 30));
        assert_eq!(streak(&task, &[], date(2024, 6, 1)), 0);
        assert_eq!(next_occurrence(&task, date(2024, 6, 1)), None);
    }

    #[test]
    fn yearly_next_occurrence_wraps_to_next_year() {
        let task = Task::from_input(TaskInput::yearly("Anniversary", 6, 6));
        assert_eq!(next_occurrence(&task, date(2024, 6, 6)), Some(date(2025, 6, 6)));
        assert_eq!(next_occurrence(&task, date(2024, 6, 5)), Some(date(2024, 6, 6)));
    }

    #[test]
    fn next_occurrence_skips_short_months() {
        let task = Task::from_input(TaskInput::monthly("Backup", 31));
        assert_eq!(next_occurrence(&task, date(2024, 1, 31)), Some(date(2024, 3, 31)));
        let daily = Task::from_input(TaskInput::daily("Walk"));
        assert_eq!(next_occurrence(&daily, date(2024, 12, 31)), Some(date(2025, 1, 1)));
    }

    #[test]
    fn short_lookahead_misses_distant_occurrence() {
        let task = Task::from_input(TaskInput::monthly("Backup", 31));
        let short = Horizon { lookahead: 30, ..Horizon::default() };
        assert_eq!(next_occurrence_within(&task, date(2024, 1, 31), short), None);
        let wide = Horizon { lookahead: 60, ..Horizon::default() };
        assert_eq!(next_occurrence_within(&task, date(2024, 1, 31), wide), Some(date(2024, 3, 31)));
    }

    #[test]
    fn leap_day_beyond_lookahead_is_none() {
        let task = Task::from_input(TaskInput::yearly("Leap day", 2, 29));
        assert_eq!(next_occurrence(&task, date(2024, 3, 1)), None);
        assert_eq!(next_occurrence(&task, date(2027, 3, 1)), Some(date(2028, 2, 29)));
    }
}
