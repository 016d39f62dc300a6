use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// How often a habit is expected to happen.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every calendar day.
    Daily,
    /// Once a month, on `day_of_month`.
    Monthly,
    /// Once a year, on `month_of_year`/`day_of_year`.
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(Error::invalid_input(format!(
                "unknown frequency '{}'. Supported: daily, monthly, yearly",
                other
            ))),
        }
    }
}

/// A scheduled time of day, exchanged as 24-hour `HH:MM` text.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(TimeOfDay { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        TimeOfDay { hour: 9, minute: 0 }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    /// Accepts `H:MM` or `HH:MM`; the minute always has two digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::invalid_input(format!("invalid time '{}'. Use HH:MM", s));
        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(h) || h.len() > 2 || !digits(m) || m.len() != 2 {
            return Err(invalid());
        }
        let hour = h.parse::<u8>().map_err(|_| invalid())?;
        let minute = m.parse::<u8>().map_err(|_| invalid())?;
        TimeOfDay::new(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// The editable part of a habit: everything except its identity and creation time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub time: TimeOfDay,
    pub frequency: Frequency,
    #[serde(default)]
    pub day_of_month: Option<u32>,
    #[serde(default)]
    pub month_of_year: Option<u32>,
    #[serde(default)]
    pub day_of_year: Option<u32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl TaskInput {
    /// Input for an active daily habit with no description.
    pub fn daily(title: &str) -> Self {
        TaskInput {
            title: title.to_string(),
            description: None,
            time: TimeOfDay::default(),
            frequency: Frequency::Daily,
            day_of_month: None,
            month_of_year: None,
            day_of_year: None,
            is_active: true,
        }
    }

    pub fn monthly(title: &str, day_of_month: u32) -> Self {
        TaskInput {
            frequency: Frequency::Monthly,
            day_of_month: Some(day_of_month),
            ..TaskInput::daily(title)
        }
    }

    pub fn yearly(title: &str, month_of_year: u32, day_of_year: u32) -> Self {
        TaskInput {
            frequency: Frequency::Yearly,
            month_of_year: Some(month_of_year),
            day_of_year: Some(day_of_year),
            ..TaskInput::daily(title)
        }
    }

    /// Checks the fields a habit must carry for its frequency.
    ///
    /// Only the write path calls this. The due-date predicate accepts
    /// anything and treats missing parameters as "never due".
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() {
            return Err(Error::invalid_input("habit title is required"));
        }
        if let Some(day) = self.day_of_month {
            check_range("day of month", day, 1, 31)?;
        }
        if let Some(month) = self.month_of_year {
            check_range("month of year", month, 1, 12)?;
        }
        if let Some(day) = self.day_of_year {
            check_range("day of year", day, 1, 31)?;
        }
        match self.frequency {
            Frequency::Daily => Ok(()),
            Frequency::Monthly if self.day_of_month.is_none() => Err(Error::invalid_input(
                "day of month is required for monthly habits",
            )),
            Frequency::Yearly if self.month_of_year.is_none() || self.day_of_year.is_none() => {
                Err(Error::invalid_input(
                    "month and day are required for yearly habits",
                ))
            }
            _ => Ok(()),
        }
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<(), Error> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )))
    }
}

/// A recurring habit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque identifier, assigned at creation.
    pub id: Uuid,
    /// Short name of the habit.
    pub title: String,
    /// Optional free-form notes.
    #[serde(default)]
    pub description: Option<String>,
    /// Time of day the habit is scheduled for.
    pub time: TimeOfDay,
    /// Recurrence kind.
    pub frequency: Frequency,
    /// Day of the month for monthly habits (1-31).
    #[serde(default)]
    pub day_of_month: Option<u32>,
    /// Month for yearly habits (1-12).
    #[serde(default)]
    pub month_of_year: Option<u32>,
    /// Day of the month for yearly habits (1-31).
    #[serde(default)]
    pub day_of_year: Option<u32>,
    /// Paused habits keep their history but drop out of summaries.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// When the habit was created.
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn from_input(input: TaskInput) -> Self {
        Task {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            time: input.time,
            frequency: input.frequency,
            day_of_month: input.day_of_month,
            month_of_year: input.month_of_year,
            day_of_year: input.day_of_year,
            is_active: input.is_active,
            created_at: Utc::now(),
        }
    }

    /// Replaces every field except `id` and `created_at`.
    pub fn apply(&mut self, input: TaskInput) {
        self.title = input.title.trim().to_string();
        self.description = input.description;
        self.time = input.time;
        self.frequency = input.frequency;
        self.day_of_month = input.day_of_month;
        self.month_of_year = input.month_of_year;
        self.day_of_year = input.day_of_year;
        self.is_active = input.is_active;
    }

    pub fn to_input(&self) -> TaskInput {
        TaskInput {
            title: self.title.clone(),
            description: self.description.clone(),
            time: self.time,
            frequency: self.frequency,
            day_of_month: self.day_of_month,
            month_of_year: self.month_of_year,
            day_of_year: self.day_of_year,
            is_active: self.is_active,
        }
    }

    /// Human readable recurrence, e.g. `monthly (day 15)`.
    pub fn schedule_label(&self) -> String {
        match (self.frequency, self.day_of_month, self.month_of_year, self.day_of_year) {
            (Frequency::Daily, ..) => "daily".to_string(),
            (Frequency::Monthly, Some(day), ..) => format!("monthly (day {})", day),
            (Frequency::Yearly, _, Some(month), Some(day)) => {
                format!("yearly ({:02}-{:02})", month, day)
            }
            (frequency, ..) => format!("{} (incomplete)", frequency),
        }
    }
}

/// Record that a habit was done on a calendar date.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub id: Uuid,
    pub task_id: Uuid,
    /// Calendar date the habit was done for.
    pub date: NaiveDate,
    /// When the completion was recorded.
    pub completed_at: DateTime<Utc>,
}

/// Streak thresholds that earn an achievement.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MilestoneKind {
    #[serde(rename = "7-day")]
    SevenDay,
    #[serde(rename = "30-day")]
    ThirtyDay,
    #[serde(rename = "100-day")]
    HundredDay,
}

impl MilestoneKind {
    /// Ascending by threshold.
    pub const ALL: [MilestoneKind; 3] = [
        MilestoneKind::SevenDay,
        MilestoneKind::ThirtyDay,
        MilestoneKind::HundredDay,
    ];

    pub fn threshold(&self) -> u32 {
        match self {
            MilestoneKind::SevenDay => 7,
            MilestoneKind::ThirtyDay => 30,
            MilestoneKind::HundredDay => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MilestoneKind::SevenDay => "7 Day Streak",
            MilestoneKind::ThirtyDay => "30 Day Streak",
            MilestoneKind::HundredDay => "100 Day Streak!",
        }
    }
}

/// A milestone a habit has crossed. Awarded once per habit and kind.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: Uuid,
    pub task_id: Uuid,
    #[serde(rename = "type")]
    pub kind: MilestoneKind,
    /// Streak length at the moment of the award.
    pub streak_count: u32,
    pub earned_at: DateTime<Utc>,
}

/// A habit enriched with its state on one reference date.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithCompletion {
    #[serde(flatten)]
    pub task: Task,
    pub is_completed: bool,
    pub completion_id: Option<Uuid>,
    pub streak: u32,
    pub next_occurrence: Option<NaiveDate>,
    pub achievements: Vec<Achievement>,
    pub latest_milestone: Option<Achievement>,
}

/// Everything due on one date.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Percentage in 0..=100, zero when nothing is due.
    pub completion_rate: f64,
    pub tasks: Vec<TaskWithCompletion>,
}

/// One cell of the monthly calendar.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayCompletion {
    pub date: NaiveDate,
    /// Due habits completed that day.
    pub count: usize,
    /// Habits due that day.
    pub total: usize,
}

impl DayCompletion {
    /// Every due habit was done, and at least one was due.
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.count == self.total
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub year: i32,
    /// Month number, 1-12.
    pub month: u32,
    /// English month name, e.g. `October`.
    pub month_name: String,
    /// Active habits at the time of the query.
    pub total_tasks: usize,
    /// Sum of completed due habits over the month.
    pub completed_count: usize,
    /// Sum of due habits over the month.
    pub total_due: usize,
    pub completion_rate: f64,
    /// Longest run of perfect days in the month.
    pub streak_days: u32,
    pub daily_completions: Vec<DayCompletion>,
}
